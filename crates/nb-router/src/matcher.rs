//! Deterministic command matcher — exact aliases and leading-word commands.
//!
//! Zero latency and zero cost for the common case. A sentence that happens
//! to start with an alias used as an ordinary word still matches; that
//! false positive is accepted.

use std::collections::HashMap;

use nb_protocol::{Action, Command, CommandMatch, Route};

use crate::error::RegistryError;

/// One entry of the alias table.
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    pub route: Route,
    /// Case-insensitive; a leading `/` is optional on input.
    pub aliases: Vec<String>,
    pub min_args: usize,
}

impl CommandDefinition {
    pub fn new(route: impl Into<Route>, aliases: &[&str]) -> Self {
        Self {
            route: route.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            min_args: 0,
        }
    }

    pub fn with_min_args(mut self, min_args: usize) -> Self {
        self.min_args = min_args;
        self
    }
}

/// Immutable alias table. Every alias belongs to exactly one definition.
#[derive(Debug, Clone)]
pub struct CommandTable {
    definitions: Vec<CommandDefinition>,
    /// Normalized alias → index into `definitions`.
    index: HashMap<String, usize>,
}

impl CommandTable {
    pub fn new(definitions: Vec<CommandDefinition>) -> Result<Self, RegistryError> {
        let mut index: HashMap<String, usize> = HashMap::new();

        for (i, def) in definitions.iter().enumerate() {
            for alias in &def.aliases {
                let key = normalize_alias(alias);
                if key.is_empty() {
                    return Err(RegistryError::EmptyAlias(def.route.to_string()));
                }
                if let Some(&existing) = index.get(&key) {
                    if existing != i {
                        return Err(RegistryError::DuplicateAlias {
                            alias: key,
                            existing: definitions[existing].route.to_string(),
                            incoming: def.route.to_string(),
                        });
                    }
                }
                index.insert(key, i);
            }
        }

        Ok(Self { definitions, index })
    }

    /// Built-in English / Simplified / Traditional alias table.
    pub fn standard() -> Self {
        Self::new(standard_definitions()).unwrap_or_else(|e| {
            // The built-in table is covered by tests; fall back to empty
            // rather than bringing the process down.
            tracing::error!(error = %e, "built-in command table is invalid");
            Self {
                definitions: Vec::new(),
                index: HashMap::new(),
            }
        })
    }

    /// Match `text` against the table.
    ///
    /// First the whole normalized text, then its first token with the
    /// remaining tokens as arguments.
    pub fn match_text(&self, text: &str) -> Option<CommandMatch> {
        let normalized = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        if let Some(def) = self.lookup(&normalized) {
            return Some(CommandMatch {
                route: def.route,
                args: Vec::new(),
                min_args: def.min_args,
            });
        }

        let mut tokens = normalized.split(' ');
        let def = self.lookup(tokens.next()?)?;
        Some(CommandMatch {
            route: def.route,
            args: tokens.map(str::to_string).collect(),
            min_args: def.min_args,
        })
    }

    pub fn definitions(&self) -> &[CommandDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn lookup(&self, key: &str) -> Option<&CommandDefinition> {
        let key = key.strip_prefix('/').unwrap_or(key);
        self.index.get(key).map(|&i| &self.definitions[i])
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize_alias(alias: &str) -> String {
    let lower = alias
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    lower.strip_prefix('/').unwrap_or(&lower).to_string()
}

fn standard_definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(Action::Start, &["start", "开始", "開始"]),
        CommandDefinition::new(Action::Help, &["help", "帮助", "幫助"]),
        CommandDefinition::new(Action::Settings, &["settings", "设置", "設定"]),
        CommandDefinition::new(
            Action::ViewProfile,
            &["profile", "my profile", "我的资料", "我的資料", "个人资料", "個人資料"],
        ),
        CommandDefinition::new(Action::ViewStats, &["stats", "statistics", "统计", "統計"]),
        CommandDefinition::new(Action::ViewHistory, &["history", "记录", "記錄", "紀錄"]),
        CommandDefinition::new(Command::Streak, &["streak", "连续", "連續"]),
        CommandDefinition::new(Command::Budget, &["budget", "预算", "預算"]),
        CommandDefinition::new(Command::Preferences, &["preferences", "prefs", "偏好"]),
        CommandDefinition::new(Command::Card, &["card", "卡片"]),
        CommandDefinition::new(Command::Reminders, &["reminders", "reminder", "提醒"]),
        CommandDefinition::new(Command::Compare, &["compare", "比较", "比較"]),
        CommandDefinition::new(Command::Progress, &["progress", "进度", "進度"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matched(text: &str) -> CommandMatch {
        CommandTable::standard()
            .match_text(text)
            .unwrap_or_else(|| panic!("expected a match for {text:?}"))
    }

    #[test]
    fn standard_table_builds() {
        let table = CommandTable::new(standard_definitions()).unwrap();
        assert_eq!(table.definitions().len(), 13);
        assert!(table.len() > 13);
    }

    #[test]
    fn every_alias_matches_in_any_case() {
        let table = CommandTable::standard();
        for def in table.definitions() {
            for alias in &def.aliases {
                let upper = alias.to_uppercase();
                let mixed: String = alias
                    .chars()
                    .enumerate()
                    .map(|(i, c)| if i % 2 == 0 { c.to_ascii_uppercase() } else { c })
                    .collect();
                for variant in [alias.clone(), upper, mixed] {
                    let m = table.match_text(&variant).unwrap();
                    assert_eq!(m.route, def.route, "alias {variant:?}");
                    assert!(m.args.is_empty());
                }
            }
        }
    }

    #[test]
    fn budget_with_arguments() {
        let m = matched("budget set 1800");
        assert_eq!(m.route, Route::Command(Command::Budget));
        assert_eq!(m.args, vec!["set", "1800"]);
    }

    #[test]
    fn leading_slash_is_optional() {
        assert_eq!(matched("/streak").route, Route::Command(Command::Streak));
        assert_eq!(matched("/Budget set 2000").args, vec!["set", "2000"]);
        assert_eq!(matched("/START").route, Route::Action(Action::Start));
    }

    #[test]
    fn chinese_aliases() {
        assert_eq!(matched("连续").route, Route::Command(Command::Streak));
        assert_eq!(matched("預算 1500").route, Route::Command(Command::Budget));
        assert_eq!(matched("我的資料").route, Route::Action(Action::ViewProfile));
    }

    #[test]
    fn whitespace_is_normalized() {
        let m = matched("   my    PROFILE  ");
        assert_eq!(m.route, Route::Action(Action::ViewProfile));
        assert!(m.args.is_empty());

        let m = matched("budget\tset   1800");
        assert_eq!(m.args, vec!["set", "1800"]);
    }

    #[test]
    fn arguments_are_lowercased_tokens() {
        let m = matched("compare LAST Week");
        assert_eq!(m.route, Route::Command(Command::Compare));
        assert_eq!(m.args, vec!["last", "week"]);
    }

    #[test]
    fn free_text_does_not_match() {
        let table = CommandTable::standard();
        assert!(table.match_text("show me my profile").is_none());
        assert!(table.match_text("I'm now 79kg").is_none());
        assert!(table.match_text("25 170 65").is_none());
        assert!(table.match_text("").is_none());
        assert!(table.match_text("   ").is_none());
    }

    #[test]
    fn conversational_use_of_alias_still_matches() {
        // Accepted false positive.
        let m = matched("progress is slow this week");
        assert_eq!(m.route, Route::Command(Command::Progress));
        assert_eq!(m.args, vec!["is", "slow", "this", "week"]);
    }

    #[test]
    fn matching_is_idempotent() {
        let table = CommandTable::standard();
        for text in ["budget set 1800", "hello there", "STATS"] {
            assert_eq!(table.match_text(text), table.match_text(text));
        }
    }

    #[test]
    fn duplicate_alias_rejected() {
        let err = CommandTable::new(vec![
            CommandDefinition::new(Command::Streak, &["streak"]),
            CommandDefinition::new(Command::Progress, &["/STREAK"]),
        ])
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateAlias { ref alias, .. } if alias == "streak"));
    }

    #[test]
    fn empty_alias_rejected() {
        let err = CommandTable::new(vec![CommandDefinition::new(Command::Card, &["  "])])
            .unwrap_err();
        assert!(matches!(err, RegistryError::EmptyAlias(_)));
    }

    #[test]
    fn min_args_is_reported() {
        let table = CommandTable::new(vec![
            CommandDefinition::new(Command::Budget, &["budget"]).with_min_args(2),
        ])
        .unwrap();
        let m = table.match_text("budget set").unwrap();
        assert_eq!(m.min_args, 2);
        assert!(!m.has_required_args());
    }
}
