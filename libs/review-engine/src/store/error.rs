//! Persistence error types.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("card not found: {0}")]
    CardNotFound(Uuid),

    #[error("review not found: {0}")]
    ReviewNotFound(Uuid),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("store lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, StoreError>;
