use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ParseVariantError, normalize_variant};

/// One delivery from the messaging channel. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Unique per delivery; the key for duplicate-delivery suppression.
    pub id: String,
    /// Raw user text as received.
    pub text: String,
    /// Channel-level sender identifier.
    pub sender_id: String,
    /// When the transport received the message.
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        sender_id: impl Into<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sender_id: sender_id.into(),
            received_at,
        }
    }
}

/// Per-message snapshot of user context, supplied by the caller.
///
/// The router never mutates it; a language change is reported and persisted
/// out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub user_id: String,
    pub language: Language,
    pub now: DateTime<Utc>,
}

impl ConversationContext {
    pub fn new(user_id: impl Into<String>, language: Language) -> Self {
        Self {
            user_id: user_id.into(),
            language,
            now: Utc::now(),
        }
    }
}

/// Languages the assistant converses in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh-simplified")]
    ChineseSimplified,
    #[serde(rename = "zh-traditional")]
    ChineseTraditional,
}

impl Language {
    /// Wire code, identical to the serde representation.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::ChineseSimplified => "zh-simplified",
            Language::ChineseTraditional => "zh-traditional",
        }
    }

    /// English name used when describing the language inside a prompt.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::ChineseSimplified => "Simplified Chinese",
            Language::ChineseTraditional => "Traditional Chinese",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ParseVariantError;

    /// Accepts the wire codes plus common BCP 47 spellings
    /// (`zh-CN`, `zh-Hans`, `zh-TW`, `zh-Hant`, `zh-HK`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_variant(s).as_str() {
            "en" | "en_us" | "en_gb" | "english" => Ok(Language::English),
            "zh" | "zh_simplified" | "zh_cn" | "zh_hans" | "zh_sg" => {
                Ok(Language::ChineseSimplified)
            }
            "zh_traditional" | "zh_tw" | "zh_hant" | "zh_hk" | "zh_mo" => {
                Ok(Language::ChineseTraditional)
            }
            _ => Err(ParseVariantError::new("language", s)),
        }
    }
}
