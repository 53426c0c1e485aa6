//! Scoring reviews within a day session.
//!
//! Each phrase gets one first-of-day review row. A different score corrects
//! that row in place and a repeated score changes nothing. Once the learner
//! starts the Again pass, every score is a re-review and adds a new row.
//!
//! Forecasts computed here are trusted. Values that arrive from another
//! device go through [`ReviewEngine::apply_synced_forecast`], which runs the
//! bounds validator first.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use srs_core::{
    validate, Card, CardForecastUpdate, CoreError, DayKey, EffectiveSettings, Forecast,
    ForecastInput, ForecastModel, ForecastValues, Fsrs, NewReview, PreviousReview, Review,
    ReviewSettings, ReviewStage, ReviewStats, ReviewUpdate, Score,
};
use tracing::debug;
use uuid::Uuid;

use crate::cache::{DayCache, DayState};
use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::store::{Store, StoreError};

/// What a submission did to the day's review rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitAction {
    /// First review of the phrase today.
    Inserted,
    /// Today's first review rewritten with a new score.
    Corrected,
    /// Same score as already recorded; nothing written.
    Unchanged,
    /// Additional row during the re-review stage.
    ReReviewed,
}

/// Outcome of one score submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    pub action: SubmitAction,
    pub review: Review,
    /// Forecast written to the card; `None` when nothing changed.
    pub forecast: Option<Forecast>,
    pub stats: ReviewStats,
}

/// Applies scores to a day's reviews and the learner's cards.
pub struct ReviewEngine {
    store: Arc<dyn Store>,
    cache: Arc<DayCache>,
    clock: Arc<dyn Clock>,
    model: Arc<dyn ForecastModel>,
    settings: ReviewSettings,
    submit_lock: Mutex<()>,
}

impl ReviewEngine {
    pub fn new(
        store: Arc<dyn Store>,
        cache: Arc<DayCache>,
        clock: Arc<dyn Clock>,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            model: Arc::new(Fsrs::default()),
            settings,
            submit_lock: Mutex::new(()),
        }
    }

    pub fn with_model(mut self, model: Arc<dyn ForecastModel>) -> Self {
        self.model = model;
        self
    }

    /// The day's manifest and reviews, from the cache or the store.
    pub fn load_day(&self, key: &DayKey) -> Result<DayState> {
        if let Some(state) = self.cache.get(key)? {
            return Ok(state);
        }
        let manifest = self
            .store
            .get_manifest(key.uid, &key.lang, key.date())?
            .ok_or_else(|| EngineError::NoSession(key.to_string()))?;
        let rows = self.store.reviews_for_day(key.uid, &key.lang, key.date())?;
        Ok(self.cache.insert_if_absent(key, DayState::new(manifest, &rows))?)
    }

    pub fn stats(&self, key: &DayKey) -> Result<ReviewStats> {
        Ok(self.load_day(key)?.stats())
    }

    /// Score a phrase from the day's manifest.
    pub fn submit(&self, key: &DayKey, phrase_id: Uuid, score: Score) -> Result<SubmitOutcome> {
        let _guard = self.submit_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let day = self.load_day(key)?;
        if !day.manifest.contains(&phrase_id) {
            return Err(EngineError::PhraseNotInManifest(phrase_id));
        }
        let card = self
            .store
            .get_card(key.uid, phrase_id)?
            .ok_or(EngineError::CardNotFound(phrase_id))?;
        let stats = day.stats();
        let correcting = stats.allows_correction();
        let first = day.first_reviews.get(&phrase_id);
        let now = self.clock.now();

        let (action, review, forecast) = match first {
            Some(first) if correcting && first.score == score => {
                debug!(day = %key, phrase = %phrase_id, score = score.to_value(), "score unchanged");
                return Ok(SubmitOutcome {
                    action: SubmitAction::Unchanged,
                    review: first.clone(),
                    forecast: None,
                    stats,
                });
            }
            Some(first) if correcting => {
                let previous = self
                    .store
                    .latest_review_before(key.uid, phrase_id, key.date())?
                    .map(|r| PreviousReview::from_review(&r));
                let forecast = self.forecast(key, score, previous, now)?;
                let update = ReviewUpdate {
                    score,
                    difficulty: forecast.difficulty,
                    stability: forecast.stability,
                    review_time_retrievability: forecast.retrievability,
                    updated_at: now,
                };
                let review = self.store.update_review(first.id, &update)?;
                (SubmitAction::Corrected, review, forecast)
            }
            Some(first) => {
                let previous = Some(PreviousReview::from_review(first));
                let forecast = self.forecast(key, score, previous, now)?;
                let review = self
                    .store
                    .insert_review(&new_review(key, phrase_id, score, &forecast, false, now))?;
                (SubmitAction::ReReviewed, review, forecast)
            }
            None => {
                let previous = PreviousReview::from_card(&card);
                let forecast = self.forecast(key, score, previous, now)?;
                let review = self
                    .store
                    .insert_review(&new_review(key, phrase_id, score, &forecast, true, now))?;
                (SubmitAction::Inserted, review, forecast)
            }
        };

        self.store.update_card_forecast(
            card.id,
            &CardForecastUpdate {
                difficulty: forecast.difficulty,
                stability: forecast.stability,
                last_reviewed_at: now,
            },
        )?;

        let stats = match self.cache.merge_review(key, review.clone())? {
            Some(state) => state.stats(),
            None => {
                let mut day = day;
                day.merge(review.clone());
                day.stats()
            }
        };
        debug!(
            day = %key,
            phrase = %phrase_id,
            score = score.to_value(),
            ?action,
            stage = stats.stage.as_u8(),
            "review recorded"
        );

        Ok(SubmitOutcome {
            action,
            review,
            forecast: Some(forecast),
            stats,
        })
    }

    fn forecast(
        &self,
        key: &DayKey,
        score: Score,
        previous: Option<PreviousReview>,
        now: DateTime<Utc>,
    ) -> Result<Forecast> {
        let deck = self.store.get_deck(key.uid, &key.lang)?;
        let settings = EffectiveSettings::merge(&self.settings, deck.as_ref())?;
        Ok(self.model.forecast(&ForecastInput {
            score,
            previous,
            now,
            desired_retention: settings.desired_retention,
        })?)
    }

    /// Move a day from the checkpoint into the Again pass.
    ///
    /// Scores submitted afterwards add re-review rows. Calling this again
    /// during the Again pass is a no-op.
    pub fn begin_again_pass(&self, key: &DayKey) -> Result<ReviewStats> {
        let _guard = self.submit_lock.lock().map_err(|_| StoreError::Poisoned)?;

        let mut day = self.load_day(key)?;
        let stage = day.stats().stage;
        match stage {
            ReviewStage::AgainPass => return Ok(day.stats()),
            ReviewStage::Checkpoint => {}
            _ => {
                return Err(EngineError::NotAtCheckpoint {
                    day: key.to_string(),
                    stage,
                })
            }
        }

        let stats = match self.cache.start_again_pass(key)? {
            Some(state) => state.stats(),
            None => {
                day.again_pass_started = true;
                self.cache.insert_if_absent(key, day)?.stats()
            }
        };
        debug!(day = %key, again = stats.again, "again pass started");
        Ok(stats)
    }

    /// Write forecast values computed elsewhere onto a card, after checking
    /// them against the documented bounds.
    pub fn apply_synced_forecast(
        &self,
        uid: Uuid,
        phrase_id: Uuid,
        values: &ForecastValues,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Card> {
        validate(values).map_err(CoreError::from)?;

        let card = self
            .store
            .get_card(uid, phrase_id)?
            .ok_or(EngineError::CardNotFound(phrase_id))?;
        self.store.update_card_forecast(
            card.id,
            &CardForecastUpdate {
                difficulty: values.difficulty,
                stability: values.stability,
                last_reviewed_at: reviewed_at,
            },
        )?;
        debug!(phrase = %phrase_id, stability = values.stability, "synced forecast applied");

        self.store
            .get_card(uid, phrase_id)?
            .ok_or(EngineError::CardNotFound(phrase_id))
    }
}

fn new_review(
    key: &DayKey,
    phrase_id: Uuid,
    score: Score,
    forecast: &Forecast,
    day_first_review: bool,
    now: DateTime<Utc>,
) -> NewReview {
    NewReview {
        uid: key.uid,
        lang: key.lang.clone(),
        phrase_id,
        day_session: key.date(),
        score,
        difficulty: forecast.difficulty,
        stability: forecast.stability,
        review_time_retrievability: forecast.retrievability,
        day_first_review,
        created_at: now,
    }
}
