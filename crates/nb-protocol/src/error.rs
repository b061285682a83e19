use thiserror::Error;

/// A string did not name any variant of one of the closed protocol enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind}: {value:?}")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseVariantError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Lowercase, trim, and fold `-` and spaces into `_` so that
/// `"View Profile"`, `"view-profile"` and `"VIEW_PROFILE"` compare equal.
pub(crate) fn normalize_variant(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}
