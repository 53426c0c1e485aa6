//! Shared setup for the review-engine integration tests.
//!
//! Every test runs against an in-memory store (or an in-memory SQLite
//! database) and a fixed clock, so nothing needs to be running.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use srs_core::{Deck, ReviewSettings};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use review_engine::store::{CardRepository, DeckRepository};
use review_engine::{Clock, FixedClock, MemoryStore, Store, StudyService};

pub const LANG: &str = "hin";

/// Install a test subscriber once; `RUST_LOG` controls the output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A learner with a deck, a catalog and a service over a memory store.
pub struct TestContext {
    pub uid: Uuid,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub service: StudyService,
}

impl TestContext {
    /// Learner speaking English, with a `hin` deck whose goal is `goal`.
    pub fn new(goal: u32) -> Self {
        Self::with_settings(goal, ReviewSettings::default())
    }

    pub fn with_settings(goal: u32, settings: ReviewSettings) -> Self {
        init_tracing();
        let uid = Uuid::new_v4();
        let store = Arc::new(MemoryStore::new());
        store
            .save_deck(&Deck {
                daily_review_goal: Some(goal),
                ..Deck::new(uid, LANG)
            })
            .unwrap();
        store
            .set_languages_spoken(uid, &["eng".to_string()])
            .unwrap();

        let clock = Arc::new(FixedClock::new(fixtures::start()));
        let shared: Arc<dyn Store> = store.clone();
        let service = StudyService::new(shared, clock.clone(), settings);
        Self {
            uid,
            store,
            clock,
            service,
        }
    }

    /// Add `n` catalog phrases with ids `1..=n`.
    pub fn with_catalog(self, n: u128) -> Self {
        self.store.add_phrases(&fixtures::catalog(n)).unwrap();
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn advance_days(&self, days: i64) {
        self.clock.advance(Duration::days(days));
    }

    /// Give the learner a card for `phrase_id` last reviewed `days_ago`.
    pub fn reviewed_card(&self, phrase_id: Uuid, stability: f64, days_ago: i64) {
        let now = self.now();
        let card = self
            .store
            .upsert_cards(self.uid, LANG, &[phrase_id], now)
            .unwrap()
            .remove(0);
        self.store
            .update_card_forecast(
                card.id,
                &srs_core::CardForecastUpdate {
                    difficulty: 5.0,
                    stability,
                    last_reviewed_at: now - Duration::days(days_ago),
                },
            )
            .unwrap();
    }
}
