//! Bracket-aware splitting of expressions into segments and filter groups.

use crate::error::{parse_error, Result};

/// A slice of the expression plus its byte offset, kept for error positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    pub text: &'a str,
    pub offset: usize,
}

impl<'a> Span<'a> {
    fn new(text: &'a str, offset: usize) -> Self {
        Self { text, offset }
    }

    pub fn slice(&self, start: usize, end: usize) -> Span<'a> {
        Span::new(&self.text[start..end], self.offset + start)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Path segments
// ---------------------------------------------------------------------------

/// Splits an expression on `/`, ignoring slashes inside `[...]`.
pub fn split_segments(expression: &str) -> Result<Vec<Span<'_>>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut open_at = 0usize;

    for (position, ch) in expression.char_indices() {
        match ch {
            '[' => {
                if depth == 0 {
                    open_at = position;
                }
                depth += 1;
            }
            ']' => {
                if depth == 0 {
                    return parse_error("unexpected ']'", position);
                }
                depth -= 1;
            }
            '/' if depth == 0 => {
                segments.push(Span::new(&expression[start..position], start));
                start = position + 1;
            }
            _ => {}
        }
    }
    if depth > 0 {
        return parse_error("unclosed '['", open_at);
    }
    segments.push(Span::new(&expression[start..], start));

    if let Some(empty) = segments.iter().find(|segment| segment.is_empty()) {
        return parse_error("empty path segment", empty.offset);
    }
    Ok(segments)
}

/// Splits a segment into its selector and its optional `[...]` filter group.
pub fn split_selector(segment: Span<'_>) -> Result<(Span<'_>, Option<Span<'_>>)> {
    let Some(open) = segment.text.find('[') else {
        return Ok((segment, None));
    };
    if !segment.text.ends_with(']') {
        return parse_error("unexpected text after filters", segment.offset + segment.text.len());
    }
    Ok((
        segment.slice(0, open),
        Some(segment.slice(open, segment.text.len())),
    ))
}

// ---------------------------------------------------------------------------
// Filter groups
// ---------------------------------------------------------------------------

/// Splits `[a]AND[b]` into the filter bodies `a` and `b`.
///
/// Join words are matched case-insensitively. `]OR[` and any other join
/// are rejected. A balanced `[...]` inside a value stays part of the filter
/// body.
pub fn split_filter_group(group: Span<'_>) -> Result<Vec<Span<'_>>> {
    let inner = group.slice(1, group.text.len() - 1);
    let bytes = inner.text.as_bytes();
    let mut filters = Vec::new();
    let mut start = 0usize;
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        if bytes[cursor] != b']' {
            cursor += 1;
            continue;
        }
        let word_start = cursor + 1;
        let word_end = word_start
            + bytes[word_start..]
                .iter()
                .take_while(|byte| byte.is_ascii_alphabetic())
                .count();
        if bytes.get(word_end) != Some(&b'[') {
            cursor += 1;
            continue;
        }

        let word = &inner.text[word_start..word_end];
        if word.eq_ignore_ascii_case("and") {
            filters.push(inner.slice(start, cursor));
            start = word_end + 1;
            cursor = start;
        } else if word.eq_ignore_ascii_case("or") {
            return parse_error("OR filter joins are not supported", inner.offset + cursor);
        } else {
            return parse_error(
                format!("unsupported filter join ']{word}['"),
                inner.offset + cursor,
            );
        }
    }
    filters.push(inner.slice(start, inner.text.len()));

    if let Some(empty) = filters.iter().find(|filter| filter.is_empty()) {
        return parse_error("empty filter", empty.offset);
    }
    Ok(filters)
}
