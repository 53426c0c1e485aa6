//! Error types for the review engine.

use srs_core::{CoreError, ReviewStage};
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

/// Result type alias using EngineError.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("persistence error: {0}")]
    Store(#[from] StoreError),

    #[error("no review session for {0}")]
    NoSession(String),

    #[error("phrase {0} is not in today's manifest")]
    PhraseNotInManifest(Uuid),

    #[error("no card for phrase {0}")]
    CardNotFound(Uuid),

    #[error("no {lang} deck for learner {uid}")]
    UnknownDeck { uid: Uuid, lang: String },

    #[error("{day} is in stage {stage:?}, not at the Again checkpoint")]
    NotAtCheckpoint { day: String, stage: ReviewStage },
}

impl EngineError {
    /// True when retrying with the same input cannot succeed.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::Core(CoreError::ForecastBounds(_)) => false,
            Self::Core(_) => true,
            Self::Store(_) => false,
            Self::NoSession(_)
            | Self::PhraseNotInManifest(_)
            | Self::CardNotFound(_)
            | Self::UnknownDeck { .. }
            | Self::NotAtCheckpoint { .. } => true,
        }
    }
}

/// Errors reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    Settings(#[from] CoreError),

    #[error("no local data directory; set SUNLO_DATABASE_PATH")]
    NoDataDir,
}
