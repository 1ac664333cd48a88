use std::fmt;
use std::time::Duration;

/// A malformed query expression.
///
/// `position` is the byte offset into the expression where the problem
/// was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} near byte {}", self.message, self.position)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SceneQueryError {
    #[error("Query parse error: {0}")]
    Parse(ParseError),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Scene host not ready: {0}")]
    HostNotReady(String),

    #[error("Timed out after {}ms waiting for '{expression}'", .elapsed.as_millis())]
    Timeout {
        expression: String,
        elapsed: Duration,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl SceneQueryError {
    /// Returns true for errors the poller may retry until its deadline.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::HostNotReady(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<ParseError> for SceneQueryError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

pub type Result<T> = std::result::Result<T, SceneQueryError>;

pub(crate) fn parse_error<T>(message: impl Into<String>, position: usize) -> Result<T> {
    Err(SceneQueryError::Parse(ParseError::new(message, position)))
}
