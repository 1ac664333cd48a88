//! Value normalization and the comparison core shared by all value filters.

use std::borrow::Cow;

use serde_json::Value;

use super::expression::{Comparison, ValuePredicate};

/// Canonical text for a compared value: strings as-is, everything else as
/// its JSON serialization (`42`, `true`, `null`, `["a"]`).
pub fn normalize_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(text) => Cow::Borrowed(text.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

impl ValuePredicate {
    /// Tests already-normalized text.
    pub fn matches_text(&self, candidate: &str) -> bool {
        let expected = self.value.as_str();
        if !self.strict() {
            return candidate.contains(expected);
        }
        match self.comparison {
            Comparison::Simple => candidate == expected,
            Comparison::StartsWith => candidate.starts_with(expected),
            Comparison::EndsWith => candidate.ends_with(expected),
            Comparison::Complex => candidate.contains(expected),
        }
    }

    pub fn matches_value(&self, candidate: &Value) -> bool {
        self.matches_text(&normalize_value(candidate))
    }
}
