//! Rule-based classifier — regex heuristics for the most common phrasings.
//!
//! Runs locally at zero cost. It emits the same JSON shape a language model
//! would, so its output is validated like any other provider's. When no
//! rule fires it abstains and the chain moves on.
//!
//! Rules only fire on first-person statements with an explicit unit (or an
//! explicit weight/age keyword) and a plausible body value. Anything looser
//! is left for the model.

use std::ops::RangeInclusive;
use std::sync::LazyLock;

use async_trait::async_trait;
use nb_protocol::ConversationContext;
use regex::{Captures, Regex};
use serde_json::{Map, Value, json};

use super::Classifier;
use crate::error::ProviderError;

const KG_PER_LB: f64 = 0.453_592_37;
const KG_PER_JIN: f64 = 0.5;

const WEIGHT_UNITS: &str = r"kg|kgs|kilos?|kilograms?|lbs?|pounds?|公斤|斤";

const AGE_RANGE: RangeInclusive<u32> = 5..=120;
const HEIGHT_RANGE_CM: RangeInclusive<f64> = 50.0..=250.0;
const WEIGHT_RANGE_KG: RangeInclusive<f64> = 20.0..=300.0;
const MAX_DELTA_KG: f64 = 50.0;

// "I gained 2kg", "lost 3 lbs", "I've put on 1.5 kilos"
static RE_DELTA_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:^|[.!,;]\s*|\bi\s+(?:have\s+|just\s+|finally\s+|already\s+)?|\bi'?ve\s+(?:just\s+|finally\s+|already\s+)?)(gained|put on|lost|dropped|shed)\s+(?:about\s+|around\s+|another\s+)?(\d+(?:\.\d+)?)\s*({WEIGHT_UNITS})\b"
    ))
    .unwrap()
});

// "我胖了2公斤", "瘦了 3 斤"
static RE_DELTA_ZH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:^|我(?:又|已经|已經|最近|这周|這週|今天)?)(胖了|重了|增加了|长了|長了|瘦了|轻了|輕了|减了|減了|掉了)\s*(\d+(?:\.\d+)?)\s*({WEIGHT_UNITS})"
    ))
    .unwrap()
});

// "I'm now 79kg", "I am 174 lbs"
static RE_WEIGHT_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:i'?m|i\s+am)\s+(?:now\s+|currently\s+|at\s+|about\s+|around\s+)*(\d+(?:\.\d+)?)\s*({WEIGHT_UNITS})\b"
    ))
    .unwrap()
});

// "I weigh 79", "my weight is 72 kg"
static RE_WEIGHT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:i\s+weigh|my\s+(?:current\s+)?weight(?:\s+is|'s)?)\s*:?\s*(?:now\s+|currently\s+|about\s+|around\s+)*(\d+(?:\.\d+)?)\s*({WEIGHT_UNITS})?\b"
    ))
    .unwrap()
});

// "我现在79公斤", "我体重65"; the unit may only be omitted after 体重.
static RE_WEIGHT_ZH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)我(?:的)?(?:(体重|體重)|现在|現在|目前|今天)?(?:现在|現在|目前)?\s*(?:是|有|为|為|:|：)?\s*(\d+(?:\.\d+)?)\s*({WEIGHT_UNITS})?"
    ))
    .unwrap()
});

// "170cm", "身高 170"
static RE_HEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(\d{2,3}(?:\.\d+)?)\s*(?:cm|centimet(?:er|re)s?|公分|厘米|釐米)|(?:\bheight(?:\s+is)?|身高)\s*(?:is|是|:|：)?\s*(\d{2,3}(?:\.\d+)?))",
    )
    .unwrap()
});

// "I'm 25 years old", "my age is 25", "我今年25岁"
static RE_AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\b(?:i'?m|i\s+am)\s+(?:now\s+|about\s+)?(\d{1,3})\s*(?:years?\s+old|yrs?\s+old|y/o|yo\b)|\bmy\s+age(?:\s+is)?\s*:?\s*(\d{1,3})\b|我(?:今年|现在|現在|已经|已經)*\s*(\d{1,3})\s*(?:岁|歲))",
    )
    .unwrap()
});

// Any first-person marker; height is only taken from sentences about the sender.
static RE_FIRST_PERSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:i|i'?m|me|my)\b|我").unwrap());

// Goals and targets are not statements of current state.
static RE_ASPIRATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(goal|target|want|wanna|hope|should|would|plan)\b|目标|目標|想|希望|应该|應該")
        .unwrap()
});

const VIEW_NOUNS: &str = r"profile|stats|statistics|summary|history|records?|logs?";

// The noun must follow a request verb plus "my", or be the whole message.
static RE_VIEW_EN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:show|see|view|check|display|open)\s+(?:me\s+)?my\s+(?:(?:weight|food|meal|full|current)\s+)?({VIEW_NOUNS})\b|^\s*my\s+({VIEW_NOUNS})[\s.!?]*$"
    ))
    .unwrap()
});

static RE_VIEW_ZH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:看|查看|显示|顯示|查询|查詢)(?:一下)?(?:我的)?(?:体重|體重)?(资料|資料|档案|檔案|统计|統計|总结|總結|记录|紀錄|記錄|历史|歷史)|^\s*我的(?:体重|體重)?(资料|資料|档案|檔案|统计|統計|总结|總結|记录|紀錄|記錄|历史|歷史)[\s。！？!?]*$",
    )
    .unwrap()
});

static RE_GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:hi|hello|hey|yo|good\s+(?:morning|afternoon|evening)|你好|您好|哈囉|哈喽|嗨|早安|晚安)[\s!.,~！。～]*$",
    )
    .unwrap()
});

/// Local heuristic tier of the provider chain.
pub struct RuleClassifier;

impl RuleClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for RuleClassifier {
    async fn classify(
        &self,
        _system_prompt: &str,
        user_text: &str,
        _ctx: &ConversationContext,
    ) -> Result<String, ProviderError> {
        classify_text(user_text)
            .map(|decision| decision.to_string())
            .ok_or(ProviderError::Abstained)
    }

    fn provider_id(&self) -> &str {
        "rules"
    }
}

/// Core rule evaluation. `None` means no rule fired.
fn classify_text(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let is_question = text.contains('?') || text.contains('？');
    let is_statement = !is_question && !RE_ASPIRATION.is_match(text);

    if is_statement {
        if let Some(decision) = relative_change(text)
            .or_else(|| quick_setup(text))
            .or_else(|| stated_fields(text))
        {
            return Some(decision);
        }
    }

    if !text.chars().any(|c| c.is_ascii_digit()) {
        if let Some(decision) = view_request(text) {
            return Some(decision);
        }
    }

    if RE_GREETING.is_match(text) {
        return Some(json!({
            "action": "CHAT",
            "confidence": 0.9,
            "reasoning": "greeting",
        }));
    }

    None
}

fn update(confidence: f64, reasoning: &str, data: Map<String, Value>) -> Value {
    json!({
        "action": "UPDATE_PROFILE",
        "confidence": confidence,
        "reasoning": reasoning,
        "extractedData": data,
    })
}

fn relative_change(text: &str) -> Option<Value> {
    let (caps, gain) = if let Some(caps) = RE_DELTA_EN.captures(text) {
        let gain = matches!(caps[1].to_lowercase().as_str(), "gained" | "put on");
        (caps, gain)
    } else if let Some(caps) = RE_DELTA_ZH.captures(text) {
        let gain = matches!(&caps[1], "胖了" | "重了" | "增加了" | "长了" | "長了");
        (caps, gain)
    } else {
        return None;
    };

    let amount = to_kg(caps[2].parse::<f64>().ok()?, caps.get(3).map(|m| m.as_str()));
    if amount <= 0.0 || amount > MAX_DELTA_KG {
        return None;
    }
    let delta = if gain { amount } else { -amount };

    let mut data = Map::new();
    data.insert("weightDelta".into(), json!(delta));
    Some(update(0.9, "relative weight change", data))
}

/// Three bare numbers: age, height, weight.
fn quick_setup(text: &str) -> Option<Value> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '/' | '，' | '、'))
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.len() != 3 {
        return None;
    }

    let age: u32 = tokens[0].parse().ok()?;
    let height: f64 = tokens[1].parse().ok()?;
    let weight: f64 = tokens[2].parse().ok()?;
    if !AGE_RANGE.contains(&age)
        || !HEIGHT_RANGE_CM.contains(&height)
        || !WEIGHT_RANGE_KG.contains(&weight)
    {
        return None;
    }

    let mut data = Map::new();
    data.insert("age".into(), json!(age));
    data.insert("height".into(), json!(height));
    data.insert("weight".into(), json!(weight));
    Some(update(0.95, "quick setup: age height weight", data))
}

/// First-person measurements stated anywhere in the sentence.
fn stated_fields(text: &str) -> Option<Value> {
    let mut data = Map::new();

    if let Some(weight) = stated_weight(text) {
        data.insert("weight".into(), json!(weight));
    }

    if RE_FIRST_PERSON.is_match(text) {
        let height = RE_HEIGHT
            .captures(text)
            .and_then(|caps| first_group(&caps, &[1, 2]))
            .and_then(|m| m.parse::<f64>().ok())
            .filter(|h| HEIGHT_RANGE_CM.contains(h));
        if let Some(height) = height {
            data.insert("height".into(), json!(height));
        }
    }

    let age = RE_AGE
        .captures(text)
        .and_then(|caps| first_group(&caps, &[1, 2, 3]))
        .and_then(|m| m.parse::<u32>().ok())
        .filter(|age| AGE_RANGE.contains(age));
    if let Some(age) = age {
        data.insert("age".into(), json!(age));
    }

    if data.is_empty() {
        return None;
    }
    Some(update(0.9, "stated measurement", data))
}

fn stated_weight(text: &str) -> Option<f64> {
    let english = RE_WEIGHT_EN
        .captures(text)
        .or_else(|| RE_WEIGHT_KEYWORD.captures(text))
        .and_then(|caps| {
            let amount = caps[1].parse::<f64>().ok()?;
            Some(to_kg(amount, caps.get(2).map(|m| m.as_str())))
        });

    let chinese = || {
        RE_WEIGHT_ZH.captures_iter(text).find_map(|caps| {
            let unit = caps.get(3).map(|m| m.as_str());
            if unit.is_none() && caps.get(1).is_none() {
                return None;
            }
            let amount = caps[2].parse::<f64>().ok()?;
            Some(to_kg(amount, unit))
        })
    };

    english
        .or_else(chinese)
        .filter(|kg| WEIGHT_RANGE_KG.contains(kg))
}

fn first_group<'t>(caps: &Captures<'t>, groups: &[usize]) -> Option<&'t str> {
    groups
        .iter()
        .find_map(|&i| caps.get(i))
        .map(|m| m.as_str())
}

fn view_request(text: &str) -> Option<Value> {
    let noun = RE_VIEW_EN
        .captures(text)
        .or_else(|| RE_VIEW_ZH.captures(text))
        .and_then(|caps| first_group(&caps, &[1, 2]).map(str::to_lowercase))?;

    let action = match noun.as_str() {
        "profile" | "资料" | "資料" | "档案" | "檔案" => "VIEW_PROFILE",
        "stats" | "statistics" | "summary" | "统计" | "統計" | "总结" | "總結" => "VIEW_STATS",
        _ => "VIEW_HISTORY",
    };

    Some(json!({
        "action": action,
        "confidence": 0.9,
        "reasoning": "request to view stored data",
    }))
}

fn to_kg(amount: f64, unit: Option<&str>) -> f64 {
    let kg = match unit.map(str::to_lowercase).as_deref() {
        Some("lb" | "lbs" | "pound" | "pounds") => amount * KG_PER_LB,
        Some("斤") => amount * KG_PER_JIN,
        _ => amount,
    };
    (kg * 10.0).round() / 10.0
}
