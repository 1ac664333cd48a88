//! Key selectors with `*` wildcards.
//!
//! Wildcard keys are deliberately narrow: the pattern is anchored at the
//! start of the key only, and `*` is the sole metacharacter. `row-*` matches
//! any key beginning with `row-`; `*-footer` matches any key containing
//! `-footer`; `a*b` matches keys that start with `a` and contain a later `b`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyMatchKind {
    Exact,
    /// Literal chunks between `*`s; the first is a prefix.
    Wildcard(Vec<String>),
}

/// A compiled `#key` selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPattern {
    raw: String,
    kind: KeyMatchKind,
}

impl KeyPattern {
    pub fn new(raw: &str) -> Self {
        let kind = if raw.contains('*') {
            KeyMatchKind::Wildcard(raw.split('*').map(str::to_string).collect())
        } else {
            KeyMatchKind::Exact
        };
        Self {
            raw: raw.to_string(),
            kind,
        }
    }

    pub fn as_str(&self) -> &str {
        self.raw.as_str()
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.kind, KeyMatchKind::Wildcard(_))
    }

    pub fn matches(&self, candidate: &str) -> bool {
        let chunks = match &self.kind {
            KeyMatchKind::Exact => return candidate == self.raw,
            KeyMatchKind::Wildcard(chunks) => chunks,
        };
        let Some((prefix, rest)) = chunks.split_first() else {
            return true;
        };
        let Some(mut remaining) = candidate.strip_prefix(prefix.as_str()) else {
            return false;
        };
        for chunk in rest {
            match remaining.find(chunk.as_str()) {
                Some(position) => remaining = &remaining[position + chunk.len()..],
                None => return false,
            }
        }
        true
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_key() {
        let pattern = KeyPattern::new("row-1");
        assert!(!pattern.is_wildcard());
        assert!(pattern.matches("row-1"));
        assert!(!pattern.matches("row-10"));
    }

    #[test]
    fn trailing_wildcard_is_prefix() {
        let pattern = KeyPattern::new("row-*");
        assert!(pattern.is_wildcard());
        assert!(pattern.matches("row-1"));
        assert!(pattern.matches("row-"));
        assert!(!pattern.matches("header-row-1"));
    }

    #[test]
    fn leading_wildcard_is_substring() {
        let pattern = KeyPattern::new("*-footer");
        assert!(pattern.matches("list-footer"));
        assert!(pattern.matches("list-footer-2"));
        assert!(!pattern.matches("footer"));
    }

    #[test]
    fn inner_wildcard_keeps_order() {
        let pattern = KeyPattern::new("a*b");
        assert!(pattern.matches("ab"));
        assert!(pattern.matches("a-x-b-y"));
        assert!(!pattern.matches("ba"));
        assert!(!pattern.matches("xab"));
    }

    #[test]
    fn question_mark_is_literal() {
        let pattern = KeyPattern::new("a?*");
        assert!(pattern.matches("a?x"));
        assert!(!pattern.matches("abx"));
    }
}
