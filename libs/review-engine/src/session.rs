//! Building each day's manifest.
//!
//! The cascade runs at most once per learner, language and day session.
//! Every entry point first looks for an existing manifest, in the local
//! cache and then in the store, and returns it unchanged if found.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use srs_core::selection::{self, SelectionInput, SelectionOffer, SelectionPlan};
use srs_core::{
    CatalogPids, DailyManifest, DayKey, DaySession, DeckPids, EffectiveSettings, ForecastModel,
    Fsrs, ReviewSettings,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cache::{DayCache, DayState};
use crate::clock::Clock;
use crate::error::{EngineError, Result};
use crate::friends::{FriendRecommendations, NoFriendRecommendations};
use crate::store::{Store, StoreError};

/// Cards contributed by each cascade stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionBreakdown {
    pub due: usize,
    pub friend: usize,
    pub algorithmic: usize,
    pub deck: usize,
    pub library: usize,
    pub cards_created: usize,
}

impl SessionBreakdown {
    fn from_plan(plan: &SelectionPlan, cards_created: usize) -> Self {
        Self {
            due: plan.due.len(),
            friend: plan.friend.len(),
            algorithmic: plan.algorithmic.len(),
            deck: plan.deck.len(),
            library: plan.library.len(),
            cards_created,
        }
    }
}

/// Result of asking for a day's manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionOutcome {
    pub manifest: DailyManifest,
    /// True only for the call that persisted the manifest.
    pub created: bool,
    /// Per-stage counts, present when this call ran the cascade.
    pub breakdown: Option<SessionBreakdown>,
    /// Cards missing from the daily goal.
    pub shortfall: usize,
}

/// What the learner sees before committing a day.
#[derive(Debug, Clone, PartialEq)]
pub enum Preparation {
    /// The day already has a manifest.
    Existing(DailyManifest),
    /// Recommendations waiting for approval.
    Pending(SelectionOffer),
}

/// Builds and persists daily manifests.
pub struct SessionBuilder {
    store: Arc<dyn Store>,
    cache: Arc<DayCache>,
    clock: Arc<dyn Clock>,
    friends: Arc<dyn FriendRecommendations>,
    model: Arc<dyn ForecastModel>,
    settings: ReviewSettings,
    commit_lock: Mutex<()>,
}

impl SessionBuilder {
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
            friends: Arc::new(NoFriendRecommendations),
            model: Arc::new(Fsrs::default()),
            settings,
            commit_lock: Mutex::new(()),
        }
    }

    pub fn with_friends(mut self, friends: Arc<dyn FriendRecommendations>) -> Self {
        self.friends = friends;
        self
    }

    pub fn with_model(mut self, model: Arc<dyn ForecastModel>) -> Self {
        self.model = model;
        self
    }

    /// Key for the learner's current study day.
    pub fn today(&self, uid: Uuid, lang: &str) -> Result<DayKey> {
        let day = DaySession::at(self.clock.now(), self.settings.day_reset_hour)?;
        Ok(DayKey::new(uid, lang, day)?)
    }

    /// The day's cached state, loading it from the store on a cache miss.
    pub fn existing(&self, key: &DayKey) -> Result<Option<DayState>> {
        if let Some(state) = self.cache.get(key)? {
            return Ok(Some(state));
        }
        let Some(manifest) = self.store.get_manifest(key.uid, &key.lang, key.date())? else {
            return Ok(None);
        };
        let rows = self.store.reviews_for_day(key.uid, &key.lang, key.date())?;
        Ok(Some(self.cache.insert_if_absent(key, DayState::new(manifest, &rows))?))
    }

    /// Compute the offer for a day that has no manifest yet.
    pub fn prepare(&self, key: &DayKey) -> Result<Preparation> {
        if let Some(state) = self.existing(key)? {
            return Ok(Preparation::Existing(state.manifest));
        }
        let settings = self.settings_for(key)?;
        let sources = self.sources(key, &settings)?;
        Ok(Preparation::Pending(selection::offer(
            &sources.input(settings.daily_review_goal),
        )))
    }

    /// Build the day without interactive approval.
    pub fn build(&self, key: &DayKey) -> Result<SessionOutcome> {
        self.commit(key, &[])
    }

    /// Run the cascade with the approved recommendations, create missing
    /// cards and persist the manifest. Idempotent per key.
    ///
    /// A day with no cards at all is not persisted, so each call for it runs
    /// the cascade again and picks up phrases added since.
    pub fn commit(&self, key: &DayKey, approved: &[Uuid]) -> Result<SessionOutcome> {
        let _guard = self.commit_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let settings = self.settings_for(key)?;
        let goal = settings.daily_review_goal as usize;

        if let Some(state) = self.existing(key)? {
            debug!(day = %key, "manifest already exists");
            return Ok(SessionOutcome {
                shortfall: goal.saturating_sub(state.manifest.len()),
                manifest: state.manifest,
                created: false,
                breakdown: None,
            });
        }

        let now = self.clock.now();
        let sources = self.sources(key, &settings)?;
        let plan = selection::plan(&sources.input(settings.daily_review_goal), approved);

        let created_cards = if plan.cards_to_create.is_empty() {
            Vec::new()
        } else {
            self.store
                .upsert_cards(key.uid, &key.lang, &plan.cards_to_create, now)?
        };
        if created_cards.len() != plan.cards_to_create.len() {
            warn!(
                day = %key,
                requested = plan.cards_to_create.len(),
                created = created_cards.len(),
                "card creation count mismatch"
            );
        }
        let breakdown = SessionBreakdown::from_plan(&plan, created_cards.len());

        let candidate = DailyManifest {
            uid: key.uid,
            lang: key.lang.clone(),
            day_session: key.date(),
            manifest: plan.manifest.clone(),
            created_at: now,
        };
        if candidate.is_empty() {
            info!(day = %key, goal, "no cards available for today");
            return Ok(SessionOutcome {
                manifest: candidate,
                created: false,
                breakdown: Some(breakdown),
                shortfall: plan.shortfall(),
            });
        }

        let (stored, created) = self.store.create_manifest_if_absent(&candidate)?;
        let rows = if created {
            info!(
                day = %key,
                cards = stored.len(),
                due = breakdown.due,
                new = plan.fresh.len(),
                "created daily manifest"
            );
            Vec::new()
        } else {
            warn!(day = %key, "manifest was created concurrently, keeping the stored one");
            self.store.reviews_for_day(key.uid, &key.lang, key.date())?
        };
        if plan.shortfall() > 0 && created {
            info!(day = %key, shortfall = plan.shortfall(), "not enough cards to meet the daily goal");
        }

        let state = self.cache.insert_if_absent(key, DayState::new(stored, &rows))?;
        Ok(SessionOutcome {
            shortfall: goal.saturating_sub(state.manifest.len()),
            manifest: state.manifest,
            created,
            breakdown: created.then_some(breakdown),
        })
    }

    fn settings_for(&self, key: &DayKey) -> Result<EffectiveSettings> {
        let deck = self
            .store
            .get_deck(key.uid, &key.lang)?
            .ok_or_else(|| EngineError::UnknownDeck {
                uid: key.uid,
                lang: key.lang.clone(),
            })?;
        Ok(EffectiveSettings::merge(&self.settings, Some(&deck))?)
    }

    fn sources(&self, key: &DayKey, settings: &EffectiveSettings) -> Result<Sources> {
        let now = self.clock.now();
        let cards = self.store.cards_for_deck(key.uid, &key.lang)?;
        let deck = DeckPids::from_cards(self.model.as_ref(), &cards, now, settings.due_threshold);
        let phrases = self.store.phrases_for_language(&key.lang)?;
        let spoken = self.store.languages_spoken(key.uid)?;
        let catalog =
            CatalogPids::build(&phrases, &spoken, &deck, settings.recommendations_per_list);
        let friends = self.friends.recommendations(key.uid, &key.lang)?;
        Ok(Sources {
            deck,
            catalog,
            friends,
        })
    }
}

struct Sources {
    deck: DeckPids,
    catalog: CatalogPids,
    friends: Vec<Uuid>,
}

impl Sources {
    fn input(&self, goal: u32) -> SelectionInput<'_> {
        SelectionInput {
            goal: goal as usize,
            deck: &self.deck,
            catalog: &self.catalog,
            friend_recommendations: &self.friends,
        }
    }
}
