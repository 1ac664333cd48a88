//! Parsed query types: one [`Identifier`] per `/`-separated path segment.

use std::fmt;

use super::key_pattern::KeyPattern;

/// How far, and in which direction, a segment searches from each working node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchingMode {
    /// Immediate children, looking through untagged wrappers.
    #[default]
    Exact,
    /// Anywhere in the subtree (`~`).
    AnyDescendant,
    /// The parent, or the nearest matching ancestor (`^`).
    Ancestor,
}

impl MatchingMode {
    fn marker(self) -> &'static str {
        match self {
            Self::Exact => "",
            Self::AnyDescendant => "~",
            Self::Ancestor => "^",
        }
    }
}

/// Tag selector of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagMatcher {
    /// `*`: any node that has a tag.
    Any,
    Literal(String),
}

impl TagMatcher {
    pub fn matches(&self, tag: Option<&str>) -> bool {
        match (self, tag) {
            (Self::Any, Some(_)) => true,
            (Self::Literal(expected), Some(tag)) => expected == tag,
            (_, None) => false,
        }
    }
}

/// Comparison applied by text, attribute, and data filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `=`: full equality.
    Simple,
    /// `*=`: prefix.
    StartsWith,
    /// `^=`: suffix.
    EndsWith,
    /// `~`: substring containment.
    Complex,
}

impl Comparison {
    pub fn operator(self) -> &'static str {
        match self {
            Self::Simple => "=",
            Self::StartsWith => "*=",
            Self::EndsWith => "^=",
            Self::Complex => "~",
        }
    }
}

/// A comparison together with the literal it compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePredicate {
    pub comparison: Comparison,
    pub value: String,
}

impl ValuePredicate {
    pub fn new(comparison: Comparison, value: impl Into<String>) -> Self {
        Self {
            comparison,
            value: value.into(),
        }
    }

    /// Strict predicates compare anchored (equality, prefix, suffix); the
    /// non-strict one only tests containment.
    #[inline]
    pub fn strict(&self) -> bool {
        !matches!(self.comparison, Comparison::Complex)
    }
}

/// Position selected by an index or child-index filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSpec {
    /// `N`; negative values count from the end (`-1` is the last match).
    Nth(i64),
    /// `last()` plus a non-positive offset (`last()-2` is `Last(-2)`).
    Last(i64),
}

impl IndexSpec {
    /// Resolves the spec against a match list of `len` items.
    pub fn resolve(self, len: usize) -> Option<usize> {
        let len = i64::try_from(len).ok()?;
        let position = match self {
            Self::Nth(n) if n >= 0 => n,
            Self::Nth(n) => len + n,
            Self::Last(offset) => len - 1 + offset,
        };
        (0..len).contains(&position).then_some(position as usize)
    }
}

impl fmt::Display for IndexSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nth(n) => write!(f, "{n}"),
            Self::Last(0) => f.write_str("last()"),
            Self::Last(offset) => write!(f, "last()-{}", offset.unsigned_abs()),
        }
    }
}

/// One bracketed predicate of a segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Index(IndexSpec),
    ChildIndex(IndexSpec),
    Text(ValuePredicate),
    Attribute {
        name: String,
        predicate: ValuePredicate,
    },
    Data {
        name: String,
        predicate: ValuePredicate,
    },
}

impl Filter {
    /// Attribute or data key; `None` for text and index filters.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Attribute { name, .. } | Self::Data { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(spec) => write!(f, "{spec}"),
            Self::ChildIndex(spec) => write!(f, ":{spec}"),
            Self::Text(predicate) => {
                write!(f, "text{}{}", predicate.comparison.operator(), predicate.value)
            }
            Self::Attribute { name, predicate } => write!(
                f,
                "@{name}{}{}",
                predicate.comparison.operator(),
                predicate.value
            ),
            Self::Data { name, predicate } => write!(
                f,
                "${name}{}{}",
                predicate.comparison.operator(),
                predicate.value
            ),
        }
    }
}

/// One parsed path segment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Identifier {
    pub mode: MatchingMode,
    pub tag: Option<TagMatcher>,
    pub id: Option<String>,
    pub key: Option<KeyPattern>,
    /// Signed sibling step; 0 means this is not a sibling lookup.
    pub sibling_offset: i32,
    /// AND-joined filters in source order, child-index filter excluded.
    pub filters: Vec<Filter>,
    pub child_index: Option<IndexSpec>,
}

impl Identifier {
    /// True if the segment names a tag, id, or key.
    pub fn has_selector(&self) -> bool {
        self.tag.is_some() || self.id.is_some() || self.key.is_some()
    }

    pub fn key_is_wildcard(&self) -> bool {
        self.key.as_ref().is_some_and(KeyPattern::is_wildcard)
    }

    /// The index spec when the segment's only filter is a bare index.
    pub fn bare_index(&self) -> Option<IndexSpec> {
        match self.filters.as_slice() {
            [Filter::Index(spec)] => Some(*spec),
            _ => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mode.marker())?;
        match self.sibling_offset {
            0 => {}
            1 => f.write_str(">")?,
            -1 => f.write_str("<")?,
            n if n > 0 => write!(f, ">{n}>")?,
            n => write!(f, "<{}<", n.unsigned_abs())?,
        }
        match &self.tag {
            Some(TagMatcher::Any) => f.write_str("*")?,
            Some(TagMatcher::Literal(tag)) => f.write_str(tag)?,
            None => {}
        }
        if let Some(id) = &self.id {
            write!(f, ".{id}")?;
        } else if let Some(key) = &self.key {
            write!(f, "#{}", key.as_str())?;
        }

        let rendered = self
            .filters
            .iter()
            .map(ToString::to_string)
            .chain(self.child_index.map(|spec| Filter::ChildIndex(spec).to_string()))
            .collect::<Vec<_>>();
        if !rendered.is_empty() {
            write!(f, "[{}]", rendered.join("]AND["))?;
        }
        Ok(())
    }
}

/// Renders identifiers back into an expression string.
pub fn render_identifiers(identifiers: &[Identifier]) -> String {
    identifiers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}
