//! Query language for locating scene nodes.
//!
//! This module provides:
//! - Expression types (identifiers, filters, comparisons, index specs)
//! - Bracket-aware tokenizing and recursive-descent parsing
//! - Filter evaluation with shared value normalization
//! - Segment-by-segment matching against a [`SceneTree`](crate::storage::SceneTree)

mod evaluate;
mod expression;
mod key_pattern;
mod matcher;
mod parser;
mod tokenizer;
mod value;

pub use evaluate::evaluate_filter;
pub use expression::{
    render_identifiers, Comparison, Filter, Identifier, IndexSpec, MatchingMode, TagMatcher,
    ValuePredicate,
};
pub use key_pattern::KeyPattern;
pub use matcher::TreeMatcher;
pub use parser::QueryParser;
pub use value::normalize_value;
