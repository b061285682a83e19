//! Schema validation of raw provider output into a [`Decision`].
//!
//! Only a missing or unrecognized `action` rejects the payload. Every other
//! field is normalized: out-of-range or malformed values are dropped and the
//! rest of the decision is kept.

use nb_protocol::{Action, ActivityLevel, Decision, Gender, Goal, ProfileUpdate};
use serde_json::{Map, Value};

use crate::error::ValidationError;

const HEIGHT_CM_MAX: f64 = 300.0;
const WEIGHT_KG_MAX: f64 = 500.0;
const AGE_YEARS: std::ops::RangeInclusive<u32> = 1..=130;
const WEIGHT_DELTA_KG_MAX: f64 = 100.0;

/// Parse and validate raw provider output.
pub fn parse_decision(raw: &str) -> Result<Decision, ValidationError> {
    let json_str = extract_json(raw);
    let value: Value =
        serde_json::from_str(json_str).map_err(|e| ValidationError::NotJson(e.to_string()))?;
    let Value::Object(obj) = value else {
        return Err(ValidationError::NotObject);
    };

    let action_str = obj
        .get("action")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingAction)?;
    let action: Action = action_str
        .parse()
        .map_err(|_| ValidationError::UnrecognizedAction(action_str.to_string()))?;

    let confidence = obj.get("confidence").and_then(number).unwrap_or(0.0);
    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let extracted = if action == Action::UpdateProfile {
        field(&obj, &["extractedData", "extracted_data"])
            .and_then(Value::as_object)
            .map(profile_update)
    } else {
        None
    };

    Ok(Decision::new(action, confidence, reasoning, extracted))
}

/// Extract a JSON object from output that may be wrapped in markdown code
/// fences or surrounded by prose.
pub fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let after_fence = &trimmed[start + fence.len()..];
            if let Some(end) = after_fence.find("```") {
                return after_fence[..end].trim();
            }
        }
    }

    first_object(trimmed).unwrap_or(trimmed)
}

/// The first balanced `{...}` span, honouring string literals.
fn first_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

fn profile_update(obj: &Map<String, Value>) -> ProfileUpdate {
    let mut update = ProfileUpdate::default();

    if let Some(v) = obj.get("height") {
        update.height = in_range(v, "height", |h| h > 0.0 && h <= HEIGHT_CM_MAX);
    }
    if let Some(v) = obj.get("weight") {
        update.weight = in_range(v, "weight", |w| w > 0.0 && w <= WEIGHT_KG_MAX);
    }
    if let Some(v) = obj.get("age") {
        update.age = number(v)
            .filter(|a| a.fract() == 0.0)
            .map(|a| a as u32)
            .filter(|a| AGE_YEARS.contains(a));
        if update.age.is_none() {
            tracing::debug!(value = %v, "dropping invalid age");
        }
    }
    if let Some(v) = field(obj, &["weightDelta", "weight_delta"]) {
        update.weight_delta = in_range(v, "weightDelta", |d| {
            d != 0.0 && d.abs() <= WEIGHT_DELTA_KG_MAX
        });
    }
    if let Some(v) = obj.get("gender") {
        update.gender = variant::<Gender>(v, "gender");
    }
    if let Some(v) = obj.get("goal") {
        update.goal = variant::<Goal>(v, "goal");
    }
    if let Some(v) = field(obj, &["activityLevel", "activity_level"]) {
        update.activity_level = variant::<ActivityLevel>(v, "activityLevel");
    }

    update
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

/// A JSON number, or a string holding one.
fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn in_range(v: &Value, name: &str, ok: impl Fn(f64) -> bool) -> Option<f64> {
    let kept = number(v).filter(|n| ok(*n));
    if kept.is_none() {
        tracing::debug!(field = name, value = %v, "dropping out-of-range field");
    }
    kept
}

fn variant<T: std::str::FromStr>(v: &Value, name: &str) -> Option<T> {
    let kept = v.as_str().and_then(|s| s.parse().ok());
    if kept.is_none() {
        tracing::debug!(field = name, value = %v, "dropping unrecognized field value");
    }
    kept
}
