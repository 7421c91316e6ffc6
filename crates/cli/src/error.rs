//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// Errors that end a `toolwire` command.
///
/// Failures inside a turn never show up here; the session turns them into
/// a reply.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The tool catalog could not be built.
    #[error(transparent)]
    Catalog(#[from] runtime::CatalogError),

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// Tool list could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
