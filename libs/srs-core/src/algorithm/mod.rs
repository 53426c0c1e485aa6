//! Memory forecasting.

pub mod fsrs;
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Card, MemoryState, Review, Score};

/// The reference point a forecast is computed against.
///
/// `memory` is `None` when the reference carries no forecast values, which
/// sends the model down the first-review path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreviousReview {
    pub memory: Option<MemoryState>,
    pub reviewed_at: DateTime<Utc>,
}

impl PreviousReview {
    /// The card's stored forecast, or `None` if it has never been reviewed.
    pub fn from_card(card: &Card) -> Option<Self> {
        card.last_reviewed_at.map(|reviewed_at| Self {
            memory: card.memory,
            reviewed_at,
        })
    }

    /// The post-review values of a review row, timed at its creation.
    pub fn from_review(review: &Review) -> Self {
        Self {
            memory: Some(review.memory()),
            reviewed_at: review.created_at,
        }
    }
}

/// Everything a forecast depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastInput {
    pub score: Score,
    pub previous: Option<PreviousReview>,
    pub now: DateTime<Utc>,
    pub desired_retention: f64,
}

/// Result of forecasting a card after one review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub difficulty: f64,
    pub stability: f64,
    /// Recall probability at the moment of review; `None` on a first review.
    pub retrievability: Option<f64>,
    pub interval_days: f64,
    pub scheduled_for: DateTime<Utc>,
}

impl Forecast {
    pub fn memory(&self) -> MemoryState {
        MemoryState {
            difficulty: self.difficulty,
            stability: self.stability,
        }
    }
}

/// A memory model that turns a score into a new forecast.
pub trait ForecastModel: Send + Sync {
    /// Model identifier.
    fn name(&self) -> &'static str;

    /// Forecast the card's memory after a review.
    fn forecast(&self, input: &ForecastInput) -> Result<Forecast>;

    /// Recall probability after `elapsed_days` at the given stability.
    fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64;
}
