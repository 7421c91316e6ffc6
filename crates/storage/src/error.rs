use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("row decode error: {0}")]
    Decode(#[from] serde_rusqlite::Error),

    #[error("unknown sensor: {0}")]
    UnknownSensor(String),
}

pub type Result<T> = std::result::Result<T, Error>;
