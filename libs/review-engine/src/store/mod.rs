//! Persistence contracts and their implementations.
//!
//! The engine reads and writes through these traits only. `MemoryStore`
//! backs tests and embedded use; `SqliteStore` is the durable store.

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use srs_core::{
    Card, CardForecastUpdate, DailyManifest, Deck, NewReview, Phrase, Review, ReviewUpdate,
};
use uuid::Uuid;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Read-only access to a language's phrase catalog.
pub trait PhraseCatalog {
    fn phrases_for_language(&self, lang: &str) -> Result<Vec<Phrase>>;
}

/// Repository for card operations.
pub trait CardRepository {
    fn get_card(&self, uid: Uuid, phrase_id: Uuid) -> Result<Option<Card>>;
    fn cards_for_deck(&self, uid: Uuid, lang: &str) -> Result<Vec<Card>>;
    /// Create an active card for every phrase without one; existing cards
    /// are left as they are. Returns the cards for all `phrase_ids`.
    fn upsert_cards(
        &self,
        uid: Uuid,
        lang: &str,
        phrase_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>>;
    fn update_card_forecast(&self, card_id: Uuid, update: &CardForecastUpdate) -> Result<()>;
}

/// Repository for review rows.
pub trait ReviewRepository {
    fn reviews_for_day(&self, uid: Uuid, lang: &str, day_session: NaiveDate) -> Result<Vec<Review>>;
    fn insert_review(&self, review: &NewReview) -> Result<Review>;
    fn update_review(&self, review_id: Uuid, update: &ReviewUpdate) -> Result<Review>;
    /// Most recent review of a phrase from any day session before `day_session`.
    fn latest_review_before(
        &self,
        uid: Uuid,
        phrase_id: Uuid,
        day_session: NaiveDate,
    ) -> Result<Option<Review>>;
}

/// Repository for daily manifests.
pub trait ManifestRepository {
    fn get_manifest(
        &self,
        uid: Uuid,
        lang: &str,
        day_session: NaiveDate,
    ) -> Result<Option<DailyManifest>>;
    /// Persist `manifest` unless one exists for its key. Returns whichever
    /// manifest is stored afterwards, and whether this call inserted it.
    fn create_manifest_if_absent(&self, manifest: &DailyManifest) -> Result<(DailyManifest, bool)>;
}

/// Repository for decks and learner profile data.
pub trait DeckRepository {
    fn get_deck(&self, uid: Uuid, lang: &str) -> Result<Option<Deck>>;
    fn save_deck(&self, deck: &Deck) -> Result<()>;
    /// Languages the learner reads translations in.
    fn languages_spoken(&self, uid: Uuid) -> Result<Vec<String>>;
    fn set_languages_spoken(&self, uid: Uuid, languages: &[String]) -> Result<()>;
}

/// Everything the engine needs from persistence.
pub trait Store:
    PhraseCatalog + CardRepository + ReviewRepository + ManifestRepository + DeckRepository + Send + Sync
{
}

impl<T> Store for T where
    T: PhraseCatalog
        + CardRepository
        + ReviewRepository
        + ManifestRepository
        + DeckRepository
        + Send
        + Sync
{
}

/// Copy of everything the engine has written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub cards: Vec<Card>,
    pub reviews: Vec<Review>,
    pub manifests: Vec<DailyManifest>,
}

impl StoreSnapshot {
    /// Rows for one phrase on one day, oldest first.
    pub fn reviews_for(&self, phrase_id: Uuid, day_session: NaiveDate) -> Vec<&Review> {
        let mut rows: Vec<&Review> = self
            .reviews
            .iter()
            .filter(|r| r.phrase_id == phrase_id && r.day_session == day_session)
            .collect();
        rows.sort_by_key(|r| r.created_at);
        rows
    }
}

/// Read-only inspection for test harnesses.
pub trait Inspect {
    fn snapshot(&self) -> Result<StoreSnapshot>;
}
