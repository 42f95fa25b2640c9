//! Bonuses attached to a single variable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Bucket key for bonuses without a type.
pub const UNTYPED_BONUS: &str = "untyped";

/// A typed or untyped numeric bonus, or a free-text conditional note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bonus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i32>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub bonus_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

impl Bonus {
    pub fn numeric(
        value: i32,
        bonus_type: Option<String>,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            value: Some(value),
            bonus_type,
            text: None,
            source: source.into(),
            timestamp,
        }
    }

    pub fn conditional(
        text: impl Into<String>,
        source: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            value: None,
            bonus_type: None,
            text: Some(text.into()),
            source: source.into(),
            timestamp,
        }
    }

    /// Conditional text, if any. Blank text counts as none.
    pub fn conditional_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn is_conditional(&self) -> bool {
        self.conditional_text().is_some()
    }

    /// Stacking bucket: trimmed, lowercased type, or `untyped`.
    pub fn type_key(&self) -> String {
        normalize_bonus_type(self.bonus_type.as_deref())
    }
}

pub fn normalize_bonus_type(bonus_type: Option<&str>) -> String {
    match bonus_type.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => t.to_lowercase(),
        None => UNTYPED_BONUS.to_string(),
    }
}

/// Sheet text for a bonus: `+2 item bonus`, `-1 penalty`, or the conditional text.
pub fn bonus_text(bonus: &Bonus) -> String {
    if let Some(text) = bonus.conditional_text() {
        return text.to_string();
    }
    let value = match bonus.value {
        Some(v) if v != 0 => v,
        _ => return String::new(),
    };
    let kind = if value > 0 { "bonus" } else { "penalty" };
    let key = bonus.type_key();
    if key == UNTYPED_BONUS {
        format!("{:+} {}", value, kind)
    } else {
        format!("{:+} {} {}", value, key, kind)
    }
}
