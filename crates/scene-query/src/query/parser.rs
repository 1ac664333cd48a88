//! Query expression parser.
//!
//! Grammar:
//!
//! ```text
//! expression = segment ("/" segment)*
//! segment    = mode? (sibling | tag)? ("." id | "#" key)? filters?
//! mode       = "^" | "~"
//! sibling    = ">" | "<" | ">" digits ">" | "<" digits "<"
//! filters    = "[" filter ("]AND[" filter)* "]"
//! filter     = integer | "last()" ("-" digits)?
//!            | ":" integer | ":last()" ("-" digits)?
//!            | "text" op value | "@" name op value | "$" name op value
//! op         = "=" | "~" | "*=" | "^="
//! ```

use crate::error::{parse_error, Result};

use super::expression::{
    Comparison, Filter, Identifier, IndexSpec, MatchingMode, TagMatcher, ValuePredicate,
};
use super::key_pattern::KeyPattern;
use super::tokenizer::{split_filter_group, split_segments, split_selector, Span};

pub struct QueryParser;

impl QueryParser {
    /// Parses an expression into one identifier per path segment.
    pub fn parse(expression: &str) -> Result<Vec<Identifier>> {
        let result = split_segments(expression)?
            .into_iter()
            .map(parse_segment)
            .collect::<Result<Vec<_>>>();
        if let Err(error) = &result {
            log::debug!("scene query parse failed expression={expression:?} error={error}");
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

fn parse_segment(segment: Span<'_>) -> Result<Identifier> {
    let (selector, group) = split_selector(segment)?;
    let mut identifier = SelectorCursor::new(selector).parse()?;

    let Some(group) = group else {
        return Ok(identifier);
    };

    let mut child_index = None;
    let mut index_at = None;
    let mut filter_count = 0usize;
    for body in split_filter_group(group)? {
        filter_count += 1;
        match parse_filter(body)? {
            Filter::ChildIndex(spec) => {
                if child_index.is_some() {
                    return parse_error(
                        "only one child-index filter is allowed per segment",
                        body.offset,
                    );
                }
                child_index = Some(spec);
            }
            filter => {
                if matches!(filter, Filter::Index(_)) {
                    index_at = Some(body.offset);
                }
                identifier.filters.push(filter);
            }
        }
    }

    if let Some(position) = index_at {
        if filter_count > 1 {
            return parse_error(
                "index filter cannot be combined with other filters",
                position,
            );
        }
    }
    if child_index.is_some() && identifier.sibling_offset != 0 {
        return parse_error(
            "child-index filter cannot be used on a sibling step",
            group.offset,
        );
    }
    identifier.child_index = child_index;
    Ok(identifier)
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

struct SelectorCursor<'a> {
    span: Span<'a>,
    index: usize,
}

impl<'a> SelectorCursor<'a> {
    fn new(span: Span<'a>) -> Self {
        Self { span, index: 0 }
    }

    fn parse(mut self) -> Result<Identifier> {
        let mut identifier = Identifier {
            mode: self.parse_mode(),
            ..Identifier::default()
        };

        if matches!(self.peek(), Some('>' | '<')) {
            if identifier.mode != MatchingMode::Exact {
                return parse_error(
                    "sibling step cannot take a matching mode",
                    self.position(),
                );
            }
            identifier.sibling_offset = self.parse_sibling_offset()?;
        } else {
            identifier.tag = self.parse_tag()?;
        }

        match self.next() {
            None => {}
            Some('.') => identifier.id = Some(self.take_rest("identity after '.'")?.to_string()),
            Some('#') => identifier.key = Some(KeyPattern::new(self.take_rest("key after '#'")?)),
            Some(symbol) => {
                return parse_error(
                    format!("unmatched symbol '{symbol}'"),
                    self.position() - symbol.len_utf8(),
                )
            }
        }
        Ok(identifier)
    }

    fn parse_mode(&mut self) -> MatchingMode {
        match self.peek() {
            Some('^') => {
                self.index += 1;
                MatchingMode::Ancestor
            }
            Some('~') => {
                self.index += 1;
                MatchingMode::AnyDescendant
            }
            _ => MatchingMode::Exact,
        }
    }

    fn parse_sibling_offset(&mut self) -> Result<i32> {
        let start = self.position();
        let Some(delimiter) = self.next() else {
            return parse_error("expected sibling offset", start);
        };
        let digits = self.take_while(|ch| ch.is_ascii_digit());
        let magnitude = if digits.is_empty() {
            1
        } else {
            if self.next() != Some(delimiter) {
                return parse_error(
                    format!("expected '{delimiter}' to close sibling offset"),
                    self.position(),
                );
            }
            digits
                .parse::<i32>()
                .or_else(|_| parse_error("sibling offset out of range", start))?
        };
        if magnitude == 0 {
            return parse_error("sibling offset must be non-zero", start);
        }
        Ok(if delimiter == '>' { magnitude } else { -magnitude })
    }

    fn parse_tag(&mut self) -> Result<Option<TagMatcher>> {
        if self.peek() == Some('*') {
            self.index += 1;
            if self.peek().is_some_and(is_tag_char) {
                return parse_error("wildcard tag must stand alone", self.position());
            }
            return Ok(Some(TagMatcher::Any));
        }
        let tag = self.take_while(is_tag_char);
        Ok((!tag.is_empty()).then(|| TagMatcher::Literal(tag.to_string())))
    }

    fn take_rest(&mut self, what: &str) -> Result<&'a str> {
        let text = self.span.text;
        let rest = &text[self.index..];
        if rest.is_empty() {
            return parse_error(format!("expected {what}"), self.position());
        }
        self.index = self.span.text.len();
        Ok(rest)
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let text = self.span.text;
        let start = self.index;
        while let Some(ch) = self.peek() {
            if !predicate(ch) {
                break;
            }
            self.index += ch.len_utf8();
        }
        &text[start..self.index]
    }

    fn peek(&self) -> Option<char> {
        self.span.text[self.index..].chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.index += ch.len_utf8();
        Some(ch)
    }

    fn position(&self) -> usize {
        self.span.offset + self.index
    }
}

fn is_tag_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-')
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

fn parse_filter(body: Span<'_>) -> Result<Filter> {
    let text = body.text;
    if let Some(spec) = parse_index_spec(text, body.offset)? {
        return Ok(Filter::Index(spec));
    }
    if let Some(rest) = text.strip_prefix(':') {
        return match parse_index_spec(rest, body.offset + 1)? {
            Some(spec) => Ok(Filter::ChildIndex(spec)),
            None => parse_error(format!("invalid child-index filter '{text}'"), body.offset),
        };
    }
    if let Some(rest) = text.strip_prefix("text") {
        if let Some((comparison, value)) = split_operator(rest) {
            return Ok(Filter::Text(ValuePredicate::new(comparison, value)));
        }
    }
    if let Some(rest) = text.strip_prefix('@') {
        let (name, predicate) = parse_named_predicate(rest, body.offset + 1)?;
        return Ok(Filter::Attribute { name, predicate });
    }
    if let Some(rest) = text.strip_prefix('$') {
        let (name, predicate) = parse_named_predicate(rest, body.offset + 1)?;
        return Ok(Filter::Data { name, predicate });
    }
    parse_error(format!("unrecognized filter '{text}'"), body.offset)
}

/// Parses `N`, `-N`, `last()`, or `last()-N`. Returns `None` when `text`
/// does not look like an index at all.
fn parse_index_spec(text: &str, offset: usize) -> Result<Option<IndexSpec>> {
    if let Some(rest) = text.strip_prefix("last()") {
        if rest.is_empty() {
            return Ok(Some(IndexSpec::Last(0)));
        }
        let value = rest
            .strip_prefix('-')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse::<i64>().ok());
        return match value {
            Some(value) => Ok(Some(IndexSpec::Last(-value))),
            None => parse_error(format!("invalid last() offset '{rest}'"), offset + 6),
        };
    }

    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    match text.parse::<i64>() {
        Ok(value) => Ok(Some(IndexSpec::Nth(value))),
        Err(_) => parse_error(format!("index '{text}' out of range"), offset),
    }
}

fn parse_named_predicate(text: &str, offset: usize) -> Result<(String, ValuePredicate)> {
    let split = text.char_indices().find_map(|(position, _)| {
        split_operator(&text[position..]).map(|(comparison, value)| (position, comparison, value))
    });
    let Some((name_end, comparison, value)) = split else {
        return parse_error(format!("expected comparison operator in '{text}'"), offset);
    };
    if name_end == 0 {
        return parse_error("expected filter name before operator", offset);
    }
    Ok((
        text[..name_end].to_string(),
        ValuePredicate::new(comparison, value),
    ))
}

/// Splits a leading comparison operator off `text`.
fn split_operator(text: &str) -> Option<(Comparison, &str)> {
    if let Some(value) = text.strip_prefix("*=") {
        Some((Comparison::StartsWith, value))
    } else if let Some(value) = text.strip_prefix("^=") {
        Some((Comparison::EndsWith, value))
    } else if let Some(value) = text.strip_prefix('=') {
        Some((Comparison::Simple, value))
    } else {
        text.strip_prefix('~')
            .map(|value| (Comparison::Complex, value))
    }
}
