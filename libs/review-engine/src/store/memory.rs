//! In-memory store.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use srs_core::{
    Card, CardForecastUpdate, DailyManifest, Deck, NewReview, Phrase, Review, ReviewUpdate,
};
use uuid::Uuid;

use super::{
    CardRepository, DeckRepository, Inspect, ManifestRepository, PhraseCatalog, Result,
    ReviewRepository, StoreError, StoreSnapshot,
};

type ManifestKey = (Uuid, String, NaiveDate);

#[derive(Debug, Default)]
struct Tables {
    phrases: Vec<Phrase>,
    decks: HashMap<(Uuid, String), Deck>,
    languages: HashMap<Uuid, Vec<String>>,
    cards: Vec<Card>,
    reviews: Vec<Review>,
    manifests: HashMap<ManifestKey, DailyManifest>,
}

/// Store that keeps every table in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add phrases to the catalog.
    pub fn add_phrases(&self, phrases: &[Phrase]) -> Result<()> {
        self.tables()?.phrases.extend_from_slice(phrases);
        Ok(())
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl PhraseCatalog for MemoryStore {
    fn phrases_for_language(&self, lang: &str) -> Result<Vec<Phrase>> {
        Ok(self
            .tables()?
            .phrases
            .iter()
            .filter(|p| p.lang == lang)
            .cloned()
            .collect())
    }
}

impl CardRepository for MemoryStore {
    fn get_card(&self, uid: Uuid, phrase_id: Uuid) -> Result<Option<Card>> {
        Ok(self
            .tables()?
            .cards
            .iter()
            .find(|c| c.uid == uid && c.phrase_id == phrase_id)
            .cloned())
    }

    fn cards_for_deck(&self, uid: Uuid, lang: &str) -> Result<Vec<Card>> {
        Ok(self
            .tables()?
            .cards
            .iter()
            .filter(|c| c.uid == uid && c.lang == lang)
            .cloned()
            .collect())
    }

    fn upsert_cards(
        &self,
        uid: Uuid,
        lang: &str,
        phrase_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>> {
        let mut tables = self.tables()?;
        let mut out = Vec::with_capacity(phrase_ids.len());
        for phrase_id in phrase_ids {
            let existing = tables
                .cards
                .iter()
                .find(|c| c.uid == uid && c.phrase_id == *phrase_id)
                .cloned();
            let card = match existing {
                Some(card) => card,
                None => {
                    let card = Card::new(uid, lang, *phrase_id, now);
                    tables.cards.push(card.clone());
                    card
                }
            };
            out.push(card);
        }
        Ok(out)
    }

    fn update_card_forecast(&self, card_id: Uuid, update: &CardForecastUpdate) -> Result<()> {
        let mut tables = self.tables()?;
        let card = tables
            .cards
            .iter_mut()
            .find(|c| c.id == card_id)
            .ok_or(StoreError::CardNotFound(card_id))?;
        card.memory = Some(srs_core::MemoryState {
            difficulty: update.difficulty,
            stability: update.stability,
        });
        card.last_reviewed_at = Some(update.last_reviewed_at);
        card.updated_at = update.last_reviewed_at;
        Ok(())
    }
}

impl ReviewRepository for MemoryStore {
    fn reviews_for_day(&self, uid: Uuid, lang: &str, day_session: NaiveDate) -> Result<Vec<Review>> {
        let mut rows: Vec<Review> = self
            .tables()?
            .reviews
            .iter()
            .filter(|r| r.uid == uid && r.lang == lang && r.day_session == day_session)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.created_at);
        Ok(rows)
    }

    fn insert_review(&self, review: &NewReview) -> Result<Review> {
        let mut tables = self.tables()?;
        let duplicate_first = review.day_first_review
            && tables.reviews.iter().any(|r| {
                r.day_first_review
                    && r.uid == review.uid
                    && r.phrase_id == review.phrase_id
                    && r.day_session == review.day_session
            });
        if duplicate_first {
            return Err(StoreError::InvalidData(format!(
                "phrase {} already has a first review on {}",
                review.phrase_id, review.day_session
            )));
        }

        let row = Review {
            id: Uuid::new_v4(),
            uid: review.uid,
            lang: review.lang.clone(),
            phrase_id: review.phrase_id,
            day_session: review.day_session,
            score: review.score,
            difficulty: review.difficulty,
            stability: review.stability,
            review_time_retrievability: review.review_time_retrievability,
            day_first_review: review.day_first_review,
            created_at: review.created_at,
            updated_at: None,
        };
        tables.reviews.push(row.clone());
        Ok(row)
    }

    fn update_review(&self, review_id: Uuid, update: &ReviewUpdate) -> Result<Review> {
        let mut tables = self.tables()?;
        let row = tables
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id)
            .ok_or(StoreError::ReviewNotFound(review_id))?;
        row.score = update.score;
        row.difficulty = update.difficulty;
        row.stability = update.stability;
        row.review_time_retrievability = update.review_time_retrievability;
        row.updated_at = Some(update.updated_at);
        Ok(row.clone())
    }

    fn latest_review_before(
        &self,
        uid: Uuid,
        phrase_id: Uuid,
        day_session: NaiveDate,
    ) -> Result<Option<Review>> {
        Ok(self
            .tables()?
            .reviews
            .iter()
            .filter(|r| r.uid == uid && r.phrase_id == phrase_id && r.day_session < day_session)
            .max_by_key(|r| r.created_at)
            .cloned())
    }
}

impl ManifestRepository for MemoryStore {
    fn get_manifest(
        &self,
        uid: Uuid,
        lang: &str,
        day_session: NaiveDate,
    ) -> Result<Option<DailyManifest>> {
        Ok(self
            .tables()?
            .manifests
            .get(&(uid, lang.to_string(), day_session))
            .cloned())
    }

    fn create_manifest_if_absent(
        &self,
        manifest: &DailyManifest,
    ) -> Result<(DailyManifest, bool)> {
        let key = (manifest.uid, manifest.lang.clone(), manifest.day_session);
        Ok(match self.tables()?.manifests.entry(key) {
            Entry::Occupied(stored) => (stored.get().clone(), false),
            Entry::Vacant(slot) => (slot.insert(manifest.clone()).clone(), true),
        })
    }
}

impl DeckRepository for MemoryStore {
    fn get_deck(&self, uid: Uuid, lang: &str) -> Result<Option<Deck>> {
        Ok(self.tables()?.decks.get(&(uid, lang.to_string())).cloned())
    }

    fn save_deck(&self, deck: &Deck) -> Result<()> {
        self.tables()?
            .decks
            .insert((deck.uid, deck.lang.clone()), deck.clone());
        Ok(())
    }

    fn languages_spoken(&self, uid: Uuid) -> Result<Vec<String>> {
        Ok(self
            .tables()?
            .languages
            .get(&uid)
            .cloned()
            .unwrap_or_default())
    }

    fn set_languages_spoken(&self, uid: Uuid, languages: &[String]) -> Result<()> {
        self.tables()?.languages.insert(uid, languages.to_vec());
        Ok(())
    }
}

impl Inspect for MemoryStore {
    fn snapshot(&self) -> Result<StoreSnapshot> {
        let tables = self.tables()?;
        let mut manifests: Vec<DailyManifest> = tables.manifests.values().cloned().collect();
        manifests.sort_by(|a, b| {
            (a.day_session, &a.lang, a.uid).cmp(&(b.day_session, &b.lang, b.uid))
        });
        Ok(StoreSnapshot {
            cards: tables.cards.clone(),
            reviews: tables.reviews.clone(),
            manifests,
        })
    }
}
