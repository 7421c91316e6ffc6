use thiserror::Error;

/// Errors loading a [`Policy`](crate::Policy).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A value parsed but is out of range, such as a zero tool timeout.
    #[error("invalid policy: {0}")]
    Invalid(String),

    #[error("failed to parse policy: {0}")]
    Parse(String),

    #[error("failed to read policy: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
