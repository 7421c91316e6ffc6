//! Extraction and parse error types.

use thiserror::Error;

/// Failure to isolate a call block from model output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    /// A call-start marker was found but no call-end marker follows it.
    ///
    /// Usually means generation was cut off mid-call.
    #[error("tool call block opened at byte {offset} is never closed")]
    Unterminated { offset: usize },

    /// The reply holds more than one call, in separate blocks or in one
    /// call list, and the policy allows only one.
    #[error("found {0} tool calls, expected at most one")]
    MultipleCalls(usize),
}

/// Failure to turn candidate call text into a [`ParsedCall`](crate::ParsedCall).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The candidate text is blank.
    #[error("tool call is empty")]
    Empty,

    /// JSON notation was present but did not describe a call.
    #[error("malformed structured call: {0}")]
    MalformedStructured(String),

    /// The positional `name(k=v, ...)` form could not be read.
    #[error("malformed positional call: {0}")]
    MalformedPositional(String),
}

pub type Result<T> = std::result::Result<T, ParseError>;
