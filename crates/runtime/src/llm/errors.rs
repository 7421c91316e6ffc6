use thiserror::Error;

/// Errors from model backends.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("network: {0}")]
    Network(String),
    #[error("backend api: {0}")]
    Api(String),
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
