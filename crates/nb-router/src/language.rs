//! Script/dialect detection and best-effort preference updates.
//!
//! Detection is a pure function over the text. Persisting a changed
//! preference is delegated to a [`LanguageStore`] and runs detached: the
//! caller never waits on it and never sees its errors.

use std::sync::Arc;

use async_trait::async_trait;
use nb_protocol::Language;

use crate::error::StoreError;

/// Words that pin the text to Traditional Chinese regardless of glyph counts.
const TRADITIONAL_MARKERS: &[&str] = &[
    "繁體", "繁体", "正體", "正体", "台灣", "臺灣", "台湾", "香港", "澳門", "澳门",
];

/// Characters written differently in the two orthographies.
/// Index `i` of one set corresponds to index `i` of the other. Glyphs that
/// Traditional text also uses (里 in 公里, 后 in 皇后) are left out.
const SIMPLIFIED_ONLY: &str = "这们说时个来对会还没国过发问么为样点体长现请谢吗开关减饭热鸡东钟实记录设资讯计划岁觉动边变让应该经从给见车门间买卖头学习无爱与";
const TRADITIONAL_ONLY: &str = "這們說時個來對會還沒國過發問麼為樣點體長現請謝嗎開關減飯熱雞東鐘實記錄設資訊計劃歲覺動邊變讓應該經從給見車門間買賣頭學習無愛與";

fn is_cjk_ideograph(c: char) -> bool {
    matches!(c,
        '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}' // Extension A
        | '\u{F900}'..='\u{FAFF}' // Compatibility Ideographs
    )
}

/// Classify the script/dialect of `text`.
///
/// No CJK ideographs → English. Otherwise an explicit locale marker wins,
/// then the larger count of orthography-specific characters; ties are
/// Simplified.
pub fn detect_language(text: &str) -> Language {
    if !text.chars().any(is_cjk_ideograph) {
        return Language::English;
    }

    if TRADITIONAL_MARKERS.iter().any(|marker| text.contains(marker)) {
        return Language::ChineseTraditional;
    }

    let (mut simplified, mut traditional) = (0usize, 0usize);
    for c in text.chars() {
        if SIMPLIFIED_ONLY.contains(c) {
            simplified += 1;
        } else if TRADITIONAL_ONLY.contains(c) {
            traditional += 1;
        }
    }

    if traditional > simplified {
        Language::ChineseTraditional
    } else {
        Language::ChineseSimplified
    }
}

/// Persistence for a user's preferred language.
#[async_trait]
pub trait LanguageStore: Send + Sync {
    async fn set_language(&self, user_id: &str, language: Language) -> Result<(), StoreError>;
}

/// Detect the language of `text` and, if it differs from `current`, persist
/// it in the background.
///
/// Returns the detected language immediately. Store failures are logged and
/// dropped.
pub fn detect_and_update(
    store: &Arc<dyn LanguageStore>,
    user_id: &str,
    text: &str,
    current: Language,
) -> Language {
    let detected = detect_language(text);
    if detected == current {
        return detected;
    }

    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        tracing::warn!(user_id, "no async runtime, skipping language preference update");
        return detected;
    };

    let store = Arc::clone(store);
    let user_id = user_id.to_string();
    runtime.spawn(async move {
        match store.set_language(&user_id, detected).await {
            Ok(()) => tracing::info!(
                user_id = %user_id,
                from = %current,
                to = %detected,
                "language preference updated"
            ),
            Err(e) => tracing::warn!(
                user_id = %user_id,
                error = %e,
                "language preference update failed"
            ),
        }
    });

    detected
}
