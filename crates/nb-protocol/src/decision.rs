use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ParseVariantError, normalize_variant};

/// Closed outcome taxonomy for free-form classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    ViewProfile,
    UpdateProfile,
    ViewStats,
    ViewHistory,
    Help,
    Start,
    Settings,
    Chat,
    Unknown,
}

impl Action {
    pub const ALL: [Action; 9] = [
        Action::ViewProfile,
        Action::UpdateProfile,
        Action::ViewStats,
        Action::ViewHistory,
        Action::Help,
        Action::Start,
        Action::Settings,
        Action::Chat,
        Action::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::ViewProfile => "VIEW_PROFILE",
            Action::UpdateProfile => "UPDATE_PROFILE",
            Action::ViewStats => "VIEW_STATS",
            Action::ViewHistory => "VIEW_HISTORY",
            Action::Help => "HELP",
            Action::Start => "START",
            Action::Settings => "SETTINGS",
            Action::Chat => "CHAT",
            Action::Unknown => "UNKNOWN",
        }
    }

    /// Actions that always land on the conversational handler.
    pub fn is_conversational(self) -> bool {
        matches!(self, Action::Chat | Action::Unknown)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_variant(s);
        Action::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ParseVariantError::new("action", s))
    }
}

/// The validated, canonical output of classification.
///
/// Build through [`Decision::new`] so the invariants hold: confidence is in
/// `[0, 1]` and zero for `UNKNOWN`, and extracted data only accompanies
/// `UPDATE_PROFILE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub action: Action,
    pub confidence: f64,
    /// Diagnostic only. Never shown to the user.
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<ProfileUpdate>,
}

impl Decision {
    pub fn new(
        action: Action,
        confidence: f64,
        reasoning: impl Into<String>,
        extracted_data: Option<ProfileUpdate>,
    ) -> Self {
        let confidence = if action == Action::Unknown || !confidence.is_finite() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        let extracted_data = match action {
            Action::UpdateProfile => extracted_data
                .map(ProfileUpdate::without_conflicts)
                .filter(|data| !data.is_empty()),
            _ => None,
        };
        Self {
            action,
            confidence,
            reasoning: reasoning.into(),
            extracted_data,
        }
    }

    /// Fail-safe decision: `UNKNOWN` with zero confidence.
    pub fn unknown(reasoning: impl Into<String>) -> Self {
        Self::new(Action::Unknown, 0.0, reasoning, None)
    }

    pub fn is_unknown(&self) -> bool {
        self.action == Action::Unknown
    }
}

/// Sparse profile change stated by the user.
///
/// `weight` is absolute, `weight_delta` relative (kg, positive = gained).
/// Never both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// Centimetres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Kilograms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    /// Years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<Goal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    /// Kilograms relative to the stored weight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_delta: Option<f64>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.height.is_none()
            && self.weight.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.goal.is_none()
            && self.activity_level.is_none()
            && self.weight_delta.is_none()
    }

    /// An absolute weight wins over a relative one.
    pub fn without_conflicts(mut self) -> Self {
        if self.weight.is_some() {
            self.weight_delta = None;
        }
        self
    }

    /// Absolute weight after applying this update to `current`.
    ///
    /// Returns `None` when only a delta was stated and no current weight is
    /// known, or when the update carries no weight information at all.
    pub fn resolve_weight(&self, current: Option<f64>) -> Option<f64> {
        match (self.weight, self.weight_delta) {
            (Some(weight), _) => Some(weight),
            (None, Some(delta)) => current.map(|c| ((c + delta) * 10.0).round() / 10.0),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant(s).as_str() {
            "male" | "m" | "man" | "男" | "男性" | "男生" => Ok(Gender::Male),
            "female" | "f" | "woman" | "女" | "女性" | "女生" => Ok(Gender::Female),
            _ => Err(ParseVariantError::new("gender", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl FromStr for Goal {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant(s).as_str() {
            "lose" | "lose_weight" | "cut" | "weight_loss" | "减重" | "減重" | "减肥" | "減肥" => {
                Ok(Goal::Lose)
            }
            "maintain" | "maintenance" | "maintain_weight" | "维持" | "維持" => Ok(Goal::Maintain),
            "gain" | "gain_weight" | "bulk" | "muscle_gain" | "增重" | "增肌" => Ok(Goal::Gain),
            _ => Err(ParseVariantError::new("goal", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl FromStr for ActivityLevel {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant(s).as_str() {
            "sedentary" | "none" | "久坐" => Ok(ActivityLevel::Sedentary),
            "light" | "lightly_active" | "轻度" | "輕度" => Ok(ActivityLevel::Light),
            "moderate" | "moderately_active" | "中度" => Ok(ActivityLevel::Moderate),
            "active" | "high" | "高度" => Ok(ActivityLevel::Active),
            "very_active" | "extra_active" | "athlete" => Ok(ActivityLevel::VeryActive),
            _ => Err(ParseVariantError::new("activity level", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parse_is_lenient() {
        assert_eq!("VIEW_PROFILE".parse::<Action>().unwrap(), Action::ViewProfile);
        assert_eq!("view-profile".parse::<Action>().unwrap(), Action::ViewProfile);
        assert_eq!(" Update Profile ".parse::<Action>().unwrap(), Action::UpdateProfile);
        assert!("DELETE_ACCOUNT".parse::<Action>().is_err());
    }

    #[test]
    fn action_serialization() {
        assert_eq!(
            serde_json::to_string(&Action::ViewStats).unwrap(),
            r#""VIEW_STATS""#
        );
        for action in Action::ALL {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{action}\""));
        }
    }

    #[test]
    fn unknown_always_has_zero_confidence() {
        let decision = Decision::new(Action::Unknown, 0.8, "model unsure", None);
        assert_eq!(decision.confidence, 0.0);
        assert!(decision.is_unknown());
    }

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(Decision::new(Action::Chat, 1.7, "", None).confidence, 1.0);
        assert_eq!(Decision::new(Action::Chat, -0.2, "", None).confidence, 0.0);
        assert_eq!(Decision::new(Action::Chat, f64::NAN, "", None).confidence, 0.0);
    }

    #[test]
    fn extracted_data_only_for_update_profile() {
        let data = ProfileUpdate {
            weight: Some(79.0),
            ..Default::default()
        };
        let view = Decision::new(Action::ViewProfile, 0.9, "", Some(data.clone()));
        assert!(view.extracted_data.is_none());

        let update = Decision::new(Action::UpdateProfile, 0.9, "", Some(data));
        assert_eq!(update.extracted_data.unwrap().weight, Some(79.0));
    }

    #[test]
    fn empty_extracted_data_is_dropped() {
        let decision = Decision::new(
            Action::UpdateProfile,
            0.9,
            "",
            Some(ProfileUpdate::default()),
        );
        assert!(decision.extracted_data.is_none());
    }

    #[test]
    fn absolute_weight_wins_over_delta() {
        let data = ProfileUpdate {
            weight: Some(80.0),
            weight_delta: Some(2.0),
            ..Default::default()
        };
        let decision = Decision::new(Action::UpdateProfile, 0.9, "", Some(data));
        let data = decision.extracted_data.unwrap();
        assert_eq!(data.weight, Some(80.0));
        assert!(data.weight_delta.is_none());
    }

    #[test]
    fn resolve_weight_applies_delta() {
        let gained = ProfileUpdate {
            weight_delta: Some(2.0),
            ..Default::default()
        };
        assert_eq!(gained.resolve_weight(Some(77.0)), Some(79.0));
        assert_eq!(gained.resolve_weight(None), None);

        let lost = ProfileUpdate {
            weight_delta: Some(-1.5),
            ..Default::default()
        };
        assert_eq!(lost.resolve_weight(Some(70.0)), Some(68.5));
        assert_eq!(ProfileUpdate::default().resolve_weight(Some(70.0)), None);
    }

    #[test]
    fn decision_wire_shape_is_camel_case() {
        let decision = Decision::new(
            Action::UpdateProfile,
            0.95,
            "relative change",
            Some(ProfileUpdate {
                weight_delta: Some(2.0),
                activity_level: Some(ActivityLevel::VeryActive),
                ..Default::default()
            }),
        );
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["action"], "UPDATE_PROFILE");
        assert_eq!(json["extractedData"]["weightDelta"], 2.0);
        assert_eq!(json["extractedData"]["activityLevel"], "very_active");
        assert!(json["extractedData"].get("weight").is_none());
    }

    #[test]
    fn profile_enums_accept_chinese() {
        assert_eq!("男".parse::<Gender>().unwrap(), Gender::Male);
        assert_eq!("減重".parse::<Goal>().unwrap(), Goal::Lose);
        assert_eq!("Very Active".parse::<ActivityLevel>().unwrap(), ActivityLevel::VeryActive);
        assert!("sometimes".parse::<ActivityLevel>().is_err());
    }
}
