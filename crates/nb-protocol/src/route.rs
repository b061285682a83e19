use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::decision::Action;
use crate::error::{ParseVariantError, normalize_variant};

/// Keyword-triggered operations outside the [`Action`] taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    Streak,
    Budget,
    Preferences,
    Card,
    Reminders,
    Compare,
    Progress,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::Streak,
        Command::Budget,
        Command::Preferences,
        Command::Card,
        Command::Reminders,
        Command::Compare,
        Command::Progress,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Command::Streak => "STREAK",
            Command::Budget => "BUDGET",
            Command::Preferences => "PREFERENCES",
            Command::Card => "CARD",
            Command::Reminders => "REMINDERS",
            Command::Compare => "COMPARE",
            Command::Progress => "PROGRESS",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_variant(s);
        Command::ALL
            .into_iter()
            .find(|command| command.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ParseVariantError::new("command", s))
    }
}

/// Where a message ends up: an [`Action`] or a named [`Command`].
///
/// Handlers are registered per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Route {
    Action(Action),
    Command(Command),
}

impl Route {
    /// Lowercase identifier, e.g. `view_profile` or `streak`.
    pub fn slug(self) -> String {
        match self {
            Route::Action(action) => action.as_str().to_ascii_lowercase(),
            Route::Command(command) => command.as_str().to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Action(action) => write!(f, "action:{action}"),
            Route::Command(command) => write!(f, "command:{command}"),
        }
    }
}

impl From<Action> for Route {
    fn from(action: Action) -> Self {
        Route::Action(action)
    }
}

impl From<Command> for Route {
    fn from(command: Command) -> Self {
        Route::Command(command)
    }
}

/// Result of a deterministic alias match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMatch {
    pub route: Route,
    /// Lowercased whitespace-delimited tokens after the alias.
    #[serde(default)]
    pub args: Vec<String>,
    /// Minimum argument count declared by the command definition.
    #[serde(default)]
    pub min_args: usize,
}

impl CommandMatch {
    pub fn has_required_args(&self) -> bool {
        self.args.len() >= self.min_args
    }
}
