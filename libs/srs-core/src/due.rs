//! Due-card classification.
//!
//! A card is due once it has been reviewed and its recall estimate has
//! decayed to the threshold. Nothing here is cached; callers recompute
//! whenever they need today's due set.

use chrono::{DateTime, Utc};

use crate::algorithm::fsrs::elapsed_days;
use crate::algorithm::ForecastModel;
use crate::types::Card;

/// Recall probability of `card` at `now`, or `None` if it was never reviewed.
pub fn current_retrievability(
    model: &dyn ForecastModel,
    card: &Card,
    now: DateTime<Utc>,
) -> Option<f64> {
    let reviewed_at = card.last_reviewed_at?;
    let stability = card.stability()?;
    Some(model.retrievability(elapsed_days(reviewed_at, now), stability))
}

/// True if the card has been reviewed and its recall estimate is at or
/// below `threshold`.
pub fn is_due(model: &dyn ForecastModel, card: &Card, now: DateTime<Utc>, threshold: f64) -> bool {
    current_retrievability(model, card, now).is_some_and(|r| r <= threshold)
}

/// Fill in `retrievability_now` on every card.
pub fn annotate(model: &dyn ForecastModel, cards: &mut [Card], now: DateTime<Utc>) {
    for card in cards {
        card.retrievability_now = current_retrievability(model, card, now);
    }
}
