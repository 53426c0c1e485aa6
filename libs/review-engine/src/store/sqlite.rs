//! SQLite store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use srs_core::{
    Card, CardForecastUpdate, CardStatus, DailyManifest, Deck, MemoryState, NewReview, Phrase,
    Review, ReviewUpdate, Score, Translation,
};
use uuid::Uuid;

use super::schema::{SCHEMA, SCHEMA_VERSION};
use super::{
    CardRepository, DeckRepository, Inspect, ManifestRepository, PhraseCatalog, Result,
    ReviewRepository, StoreError, StoreSnapshot,
};

const CARD_COLUMNS: &str = "id, uid, lang, phrase_id, status, difficulty, stability, last_reviewed_at, created_at, updated_at";
const REVIEW_COLUMNS: &str = "id, uid, lang, phrase_id, day_session, score, difficulty, stability, review_time_retrievability, day_first_review, created_at, updated_at";

/// Durable store backed by a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open database at path, creating if necessary.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
            params![SCHEMA_VERSION],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Add phrases to the catalog, replacing rows with the same id.
    pub fn add_phrases(&self, phrases: &[Phrase]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for phrase in phrases {
            let translations = serde_json::to_string(&phrase.translations)?;
            tx.execute(
                "INSERT OR REPLACE INTO phrases (id, lang, text, translations, count_cards, avg_difficulty, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    phrase.id,
                    phrase.lang,
                    phrase.text,
                    translations,
                    phrase.count_cards,
                    phrase.avg_difficulty,
                    phrase.created_at
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn row_to_card(row: &Row) -> rusqlite::Result<Card> {
        let status: String = row.get(4)?;
        let status = CardStatus::from_str(&status)
            .ok_or_else(|| conversion_error(4, format!("unknown card status {status:?}")))?;
        let memory = match (row.get::<_, Option<f64>>(5)?, row.get::<_, Option<f64>>(6)?) {
            (Some(difficulty), Some(stability)) => Some(MemoryState {
                difficulty,
                stability,
            }),
            (None, None) => None,
            _ => return Err(conversion_error(5, "half-populated card forecast".into())),
        };

        Ok(Card {
            id: row.get(0)?,
            uid: row.get(1)?,
            lang: row.get(2)?,
            phrase_id: row.get(3)?,
            status,
            memory,
            last_reviewed_at: row.get(7)?,
            retrievability_now: None,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn row_to_review(row: &Row) -> rusqlite::Result<Review> {
        let score: u8 = row.get(5)?;
        let score = Score::from_value(score)
            .ok_or_else(|| conversion_error(5, format!("invalid score {score}")))?;

        Ok(Review {
            id: row.get(0)?,
            uid: row.get(1)?,
            lang: row.get(2)?,
            phrase_id: row.get(3)?,
            day_session: row.get(4)?,
            score,
            difficulty: row.get(6)?,
            stability: row.get(7)?,
            review_time_retrievability: row.get(8)?,
            day_first_review: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn row_to_phrase(row: &Row) -> rusqlite::Result<Phrase> {
        let translations: String = row.get(3)?;
        let translations: Vec<Translation> = serde_json::from_str(&translations)
            .map_err(|e| conversion_error(3, e.to_string()))?;

        Ok(Phrase {
            id: row.get(0)?,
            lang: row.get(1)?,
            text: row.get(2)?,
            translations,
            count_cards: row.get(4)?,
            avg_difficulty: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn row_to_manifest(row: &Row) -> rusqlite::Result<DailyManifest> {
        let ids: String = row.get(3)?;
        let manifest: Vec<Uuid> =
            serde_json::from_str(&ids).map_err(|e| conversion_error(3, e.to_string()))?;

        Ok(DailyManifest {
            uid: row.get(0)?,
            lang: row.get(1)?,
            day_session: row.get(2)?,
            manifest,
            created_at: row.get(4)?,
        })
    }

    fn query_card(conn: &Connection, uid: Uuid, phrase_id: Uuid) -> Result<Option<Card>> {
        conn.query_row(
            &format!("SELECT {CARD_COLUMNS} FROM cards WHERE uid = ?1 AND phrase_id = ?2"),
            params![uid, phrase_id],
            Self::row_to_card,
        )
        .optional()
        .map_err(Into::into)
    }

    fn query_review(conn: &Connection, review_id: Uuid) -> Result<Option<Review>> {
        conn.query_row(
            &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"),
            params![review_id],
            Self::row_to_review,
        )
        .optional()
        .map_err(Into::into)
    }

    fn query_manifest(
        conn: &Connection,
        uid: Uuid,
        lang: &str,
        day_session: NaiveDate,
    ) -> Result<Option<DailyManifest>> {
        conn.query_row(
            "SELECT uid, lang, day_session, manifest, created_at FROM daily_manifests
             WHERE uid = ?1 AND lang = ?2 AND day_session = ?3",
            params![uid, lang, day_session],
            Self::row_to_manifest,
        )
        .optional()
        .map_err(Into::into)
    }
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

impl PhraseCatalog for SqliteStore {
    fn phrases_for_language(&self, lang: &str) -> Result<Vec<Phrase>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, lang, text, translations, count_cards, avg_difficulty, created_at
             FROM phrases WHERE lang = ?1 ORDER BY created_at, rowid",
        )?;
        let phrases = stmt
            .query_map(params![lang], Self::row_to_phrase)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(phrases)
    }
}

impl CardRepository for SqliteStore {
    fn get_card(&self, uid: Uuid, phrase_id: Uuid) -> Result<Option<Card>> {
        let conn = self.conn()?;
        Self::query_card(&conn, uid, phrase_id)
    }

    fn cards_for_deck(&self, uid: Uuid, lang: &str) -> Result<Vec<Card>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards WHERE uid = ?1 AND lang = ?2 ORDER BY created_at, rowid"
        ))?;
        let cards = stmt
            .query_map(params![uid, lang], Self::row_to_card)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(cards)
    }

    fn upsert_cards(
        &self,
        uid: Uuid,
        lang: &str,
        phrase_ids: &[Uuid],
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut cards = Vec::with_capacity(phrase_ids.len());
        for phrase_id in phrase_ids {
            tx.execute(
                "INSERT INTO cards (id, uid, lang, phrase_id, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                 ON CONFLICT (uid, phrase_id) DO NOTHING",
                params![
                    Uuid::new_v4(),
                    uid,
                    lang,
                    phrase_id,
                    CardStatus::Active.as_str(),
                    now
                ],
            )?;
            let card = Self::query_card(&tx, uid, *phrase_id)?
                .ok_or_else(|| StoreError::InvalidData(format!("card for {phrase_id} missing after upsert")))?;
            cards.push(card);
        }
        tx.commit()?;
        Ok(cards)
    }

    fn update_card_forecast(&self, card_id: Uuid, update: &CardForecastUpdate) -> Result<()> {
        let changed = self.conn()?.execute(
            "UPDATE cards SET difficulty = ?1, stability = ?2, last_reviewed_at = ?3, updated_at = ?3
             WHERE id = ?4",
            params![update.difficulty, update.stability, update.last_reviewed_at, card_id],
        )?;
        if changed == 0 {
            return Err(StoreError::CardNotFound(card_id));
        }
        Ok(())
    }
}

impl ReviewRepository for SqliteStore {
    fn reviews_for_day(&self, uid: Uuid, lang: &str, day_session: NaiveDate) -> Result<Vec<Review>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE uid = ?1 AND lang = ?2 AND day_session = ?3
             ORDER BY created_at, rowid"
        ))?;
        let reviews = stmt
            .query_map(params![uid, lang, day_session], Self::row_to_review)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(reviews)
    }

    fn insert_review(&self, review: &NewReview) -> Result<Review> {
        let id = Uuid::new_v4();
        self.conn()?.execute(
            &format!(
                "INSERT INTO reviews ({REVIEW_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, NULL)"
            ),
            params![
                id,
                review.uid,
                review.lang,
                review.phrase_id,
                review.day_session,
                review.score.to_value(),
                review.difficulty,
                review.stability,
                review.review_time_retrievability,
                review.day_first_review,
                review.created_at
            ],
        )?;

        Ok(Review {
            id,
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
        })
    }

    fn update_review(&self, review_id: Uuid, update: &ReviewUpdate) -> Result<Review> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE reviews SET score = ?1, difficulty = ?2, stability = ?3,
                review_time_retrievability = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                update.score.to_value(),
                update.difficulty,
                update.stability,
                update.review_time_retrievability,
                update.updated_at,
                review_id
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::ReviewNotFound(review_id));
        }
        Self::query_review(&conn, review_id)?.ok_or(StoreError::ReviewNotFound(review_id))
    }

    fn latest_review_before(
        &self,
        uid: Uuid,
        phrase_id: Uuid,
        day_session: NaiveDate,
    ) -> Result<Option<Review>> {
        self.conn()?
            .query_row(
                &format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews
                     WHERE uid = ?1 AND phrase_id = ?2 AND day_session < ?3
                     ORDER BY created_at DESC, rowid DESC LIMIT 1"
                ),
                params![uid, phrase_id, day_session],
                Self::row_to_review,
            )
            .optional()
            .map_err(Into::into)
    }
}

impl ManifestRepository for SqliteStore {
    fn get_manifest(
        &self,
        uid: Uuid,
        lang: &str,
        day_session: NaiveDate,
    ) -> Result<Option<DailyManifest>> {
        let conn = self.conn()?;
        Self::query_manifest(&conn, uid, lang, day_session)
    }

    fn create_manifest_if_absent(
        &self,
        manifest: &DailyManifest,
    ) -> Result<(DailyManifest, bool)> {
        let ids = serde_json::to_string(&manifest.manifest)?;
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO daily_manifests (uid, lang, day_session, manifest, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (uid, lang, day_session) DO NOTHING",
            params![
                manifest.uid,
                manifest.lang,
                manifest.day_session,
                ids,
                manifest.created_at
            ],
        )?;
        let stored =
            Self::query_manifest(&conn, manifest.uid, &manifest.lang, manifest.day_session)?
                .ok_or_else(|| StoreError::InvalidData("manifest missing after insert".into()))?;
        Ok((stored, inserted == 1))
    }
}

impl DeckRepository for SqliteStore {
    fn get_deck(&self, uid: Uuid, lang: &str) -> Result<Option<Deck>> {
        self.conn()?
            .query_row(
                "SELECT uid, lang, daily_review_goal, desired_retention FROM decks
                 WHERE uid = ?1 AND lang = ?2",
                params![uid, lang],
                |row| {
                    Ok(Deck {
                        uid: row.get(0)?,
                        lang: row.get(1)?,
                        daily_review_goal: row.get(2)?,
                        desired_retention: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    fn save_deck(&self, deck: &Deck) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO decks (uid, lang, daily_review_goal, desired_retention)
             VALUES (?1, ?2, ?3, ?4)",
            params![deck.uid, deck.lang, deck.daily_review_goal, deck.desired_retention],
        )?;
        Ok(())
    }

    fn languages_spoken(&self, uid: Uuid) -> Result<Vec<String>> {
        let stored: Option<String> = self
            .conn()?
            .query_row(
                "SELECT languages FROM languages_spoken WHERE uid = ?1",
                params![uid],
                |row| row.get(0),
            )
            .optional()?;
        match stored {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn set_languages_spoken(&self, uid: Uuid, languages: &[String]) -> Result<()> {
        let json = serde_json::to_string(languages)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO languages_spoken (uid, languages) VALUES (?1, ?2)",
            params![uid, json],
        )?;
        Ok(())
    }
}

impl Inspect for SqliteStore {
    fn snapshot(&self) -> Result<StoreSnapshot> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards ORDER BY created_at, rowid"
        ))?;
        let cards = stmt
            .query_map([], Self::row_to_card)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews ORDER BY created_at, rowid"
        ))?;
        let reviews = stmt
            .query_map([], Self::row_to_review)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT uid, lang, day_session, manifest, created_at FROM daily_manifests
             ORDER BY day_session, lang, uid",
        )?;
        let manifests = stmt
            .query_map([], Self::row_to_manifest)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(StoreSnapshot {
            cards,
            reviews,
            manifests,
        })
    }
}
