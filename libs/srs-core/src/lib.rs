//! Core scheduling library for daily phrase review.
//!
//! Provides:
//! - FSRS memory forecasting and a bounds validator for synced values
//! - Due-card classification
//! - Deck partitions and catalog recommendations
//! - The new-card selection cascade behind each day's manifest
//! - Review stage derivation and manifest navigation
//! - Shared types (Card, Review, Score, DaySession, etc.)

pub mod algorithm;
pub mod day;
pub mod deck;
pub mod due;
pub mod error;
pub mod recommend;
pub mod selection;
pub mod stage;
pub mod types;

pub use algorithm::fsrs::Fsrs;
pub use algorithm::validate::{validate, ForecastValues, MAX_STABILITY};
pub use algorithm::{Forecast, ForecastInput, ForecastModel, PreviousReview};
pub use day::{DayKey, DaySession};
pub use deck::DeckPids;
pub use error::{BoundViolation, CoreError, ForecastBoundsError, Result};
pub use recommend::{CatalogPids, Recommendations};
pub use selection::{SelectionInput, SelectionOffer, SelectionPlan};
pub use stage::{reviews_map, ReviewStage, ReviewStats, ReviewsMap};
pub use types::{
    Card, CardForecastUpdate, CardStatus, DailyManifest, Deck, EffectiveSettings, MemoryState,
    NewReview, Phrase, Review, ReviewSettings, ReviewUpdate, Score, Translation,
};
