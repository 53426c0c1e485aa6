//! Entry point that wires the store, cache and clock into the session
//! builder and the review engine.

use std::fs;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use srs_core::{Card, DayKey, ForecastValues, ReviewSettings, ReviewStats, Score};
use tracing::info;
use uuid::Uuid;

use crate::cache::DayCache;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::friends::FriendRecommendations;
use crate::review::{ReviewEngine, SubmitOutcome};
use crate::session::{Preparation, SessionBuilder, SessionOutcome};
use crate::store::{MemoryStore, SqliteStore, Store, StoreError};

pub struct StudyService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    sessions: SessionBuilder,
    reviews: ReviewEngine,
}

impl StudyService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, settings: ReviewSettings) -> Self {
        let cache = Arc::new(DayCache::new());
        let sessions = SessionBuilder::new(
            store.clone(),
            cache.clone(),
            clock.clone(),
            settings.clone(),
        );
        let reviews = ReviewEngine::new(store.clone(), cache, clock.clone(), settings);
        Self {
            store,
            clock,
            sessions,
            reviews,
        }
    }

    /// Open the SQLite database named by `config`, creating its directory.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        if let Some(dir) = config.database_path.parent() {
            fs::create_dir_all(dir).map_err(StoreError::from)?;
        }
        let store = SqliteStore::open(&config.database_path)?;
        info!(path = %config.database_path.display(), "opened review database");
        Ok(Self::new(
            Arc::new(store),
            Arc::new(SystemClock),
            config.settings.clone(),
        ))
    }

    /// Service over an empty in-memory store.
    pub fn in_memory(clock: Arc<dyn Clock>, settings: ReviewSettings) -> Self {
        Self::new(Arc::new(MemoryStore::new()), clock, settings)
    }

    pub fn with_friends(mut self, friends: Arc<dyn FriendRecommendations>) -> Self {
        self.sessions = self.sessions.with_friends(friends);
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn sessions(&self) -> &SessionBuilder {
        &self.sessions
    }

    pub fn reviews(&self) -> &ReviewEngine {
        &self.reviews
    }

    pub fn today(&self, uid: Uuid, lang: &str) -> Result<DayKey> {
        self.sessions.today(uid, lang)
    }

    /// Offer for the learner's current day.
    pub fn prepare_today(&self, uid: Uuid, lang: &str) -> Result<Preparation> {
        let key = self.today(uid, lang)?;
        self.sessions.prepare(&key)
    }

    /// Commit the learner's current day with the approved recommendations.
    pub fn commit_today(&self, uid: Uuid, lang: &str, approved: &[Uuid]) -> Result<SessionOutcome> {
        let key = self.today(uid, lang)?;
        self.sessions.commit(&key, approved)
    }

    /// Build the learner's current day without recommendations.
    pub fn build_today(&self, uid: Uuid, lang: &str) -> Result<SessionOutcome> {
        let key = self.today(uid, lang)?;
        self.sessions.build(&key)
    }

    /// Submit a score as raw caller input.
    pub fn review(
        &self,
        uid: Uuid,
        lang: &str,
        day_session: &str,
        phrase_id: Uuid,
        score: Option<i64>,
    ) -> Result<SubmitOutcome> {
        let key = DayKey::parse(uid, lang, day_session)?;
        let score = Score::parse(score)?;
        self.reviews.submit(&key, phrase_id, score)
    }

    pub fn stats(&self, uid: Uuid, lang: &str, day_session: &str) -> Result<ReviewStats> {
        let key = DayKey::parse(uid, lang, day_session)?;
        self.reviews.stats(&key)
    }

    /// Move a day from the Again checkpoint into the re-review pass.
    pub fn begin_again_pass(&self, uid: Uuid, lang: &str, day_session: &str) -> Result<ReviewStats> {
        let key = DayKey::parse(uid, lang, day_session)?;
        self.reviews.begin_again_pass(&key)
    }

    /// Write forecast values computed on another device.
    pub fn apply_synced_forecast(
        &self,
        uid: Uuid,
        phrase_id: Uuid,
        values: &ForecastValues,
        reviewed_at: DateTime<Utc>,
    ) -> Result<Card> {
        self.reviews
            .apply_synced_forecast(uid, phrase_id, values, reviewed_at)
    }
}
