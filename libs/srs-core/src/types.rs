//! Core types for the review scheduler.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Self-assessed recall grade for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Score {
    Again,
    Hard,
    Good,
    Easy,
}

impl Score {
    /// All scores, from Again to Easy.
    pub const ALL: [Score; 4] = [Score::Again, Score::Hard, Score::Good, Score::Easy];

    /// Convert to 4-point numeric value (1-4).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from 4-point numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }

    /// Parse an optional raw score as submitted by a caller.
    pub fn parse(value: Option<i64>) -> Result<Self> {
        let value = value.ok_or(CoreError::MissingScore)?;
        u8::try_from(value)
            .ok()
            .and_then(Self::from_value)
            .ok_or(CoreError::InvalidScore(value))
    }

    pub fn is_again(self) -> bool {
        self == Self::Again
    }
}

impl TryFrom<u8> for Score {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_value(value).ok_or(CoreError::InvalidScore(value as i64))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.to_value()
    }
}

/// Card status within a learner's deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Active,
    Learned,
    Skipped,
}

impl Default for CardStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Learned => "learned",
            Self::Skipped => "skipped",
        }
    }

    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "learned" => Some(Self::Learned),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// Difficulty and stability of a card's memory.
///
/// The two values are either both known or both unknown, so a card that
/// has never been reviewed carries `None` instead of a half-filled pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryState {
    pub difficulty: f64,
    pub stability: f64,
}

/// A phrase in a learner's deck, with its forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub uid: Uuid,
    pub lang: String,
    pub phrase_id: Uuid,
    pub status: CardStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// Point-in-time recall estimate filled in by callers, never persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrievability_now: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// New active card with no review history.
    pub fn new(uid: Uuid, lang: &str, phrase_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            uid,
            lang: lang.to_string(),
            phrase_id,
            status: CardStatus::Active,
            memory: None,
            last_reviewed_at: None,
            retrievability_now: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn difficulty(&self) -> Option<f64> {
        self.memory.map(|m| m.difficulty)
    }

    pub fn stability(&self) -> Option<f64> {
        self.memory.map(|m| m.stability)
    }

    pub fn is_reviewed(&self) -> bool {
        self.last_reviewed_at.is_some()
    }
}

/// Forecast values written back onto a card after a review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardForecastUpdate {
    pub difficulty: f64,
    pub stability: f64,
    pub last_reviewed_at: DateTime<Utc>,
}

/// One scored review of a card within a day session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub uid: Uuid,
    pub lang: String,
    pub phrase_id: Uuid,
    pub day_session: NaiveDate,
    pub score: Score,
    /// Post-review difficulty, snapshotted at review time.
    pub difficulty: f64,
    /// Post-review stability, snapshotted at review time.
    pub stability: f64,
    /// Recall probability at the moment of review; `None` on a first exposure.
    pub review_time_retrievability: Option<f64>,
    pub day_first_review: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Review {
    pub fn memory(&self) -> MemoryState {
        MemoryState {
            difficulty: self.difficulty,
            stability: self.stability,
        }
    }
}

/// Data for a review row about to be inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReview {
    pub uid: Uuid,
    pub lang: String,
    pub phrase_id: Uuid,
    pub day_session: NaiveDate,
    pub score: Score,
    pub difficulty: f64,
    pub stability: f64,
    pub review_time_retrievability: Option<f64>,
    pub day_first_review: bool,
    pub created_at: DateTime<Utc>,
}

/// In-place correction of an existing review row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    pub score: Score,
    pub difficulty: f64,
    pub stability: f64,
    pub review_time_retrievability: Option<f64>,
    pub updated_at: DateTime<Utc>,
}

/// A translation of a phrase into another language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub lang: String,
    pub text: String,
}

/// A phrase from a language's public catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phrase {
    pub id: Uuid,
    pub lang: String,
    pub text: String,
    pub translations: Vec<Translation>,
    /// Number of learners holding a card for this phrase.
    pub count_cards: u32,
    /// Mean difficulty across learners; `None` until someone has reviewed it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_difficulty: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Phrase {
    /// True if at least one translation is in one of `languages`.
    pub fn has_translation_in(&self, languages: &[String]) -> bool {
        self.translations
            .iter()
            .any(|t| languages.iter().any(|l| l == &t.lang))
    }
}

/// A learner's deck for one language, with optional setting overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub uid: Uuid,
    pub lang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_review_goal: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desired_retention: Option<f64>,
}

impl Deck {
    /// Create a deck that uses the global settings.
    pub fn new(uid: Uuid, lang: &str) -> Self {
        Self {
            uid,
            lang: lang.to_string(),
            daily_review_goal: None,
            desired_retention: None,
        }
    }
}

/// The frozen list of phrases a learner studies in one day session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyManifest {
    pub uid: Uuid,
    pub lang: String,
    pub day_session: NaiveDate,
    pub manifest: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl DailyManifest {
    pub fn len(&self) -> usize {
        self.manifest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.is_empty()
    }

    pub fn contains(&self, phrase_id: &Uuid) -> bool {
        self.manifest.contains(phrase_id)
    }
}

/// Global review settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    pub new_cards_per_day: u32,
    pub desired_retention: f64,
    /// Cards at or below this recall estimate are due.
    pub due_threshold: f64,
    /// Hour of day (0-23) when a new study day begins.
    pub day_reset_hour: u32,
    pub recommendations_per_list: usize,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            new_cards_per_day: 15,
            desired_retention: 0.9,
            due_threshold: 0.9,
            day_reset_hour: 4,
            recommendations_per_list: 8,
        }
    }
}

impl ReviewSettings {
    /// Reject settings the scheduler cannot work with.
    pub fn validate(&self) -> Result<()> {
        validate_retention(self.desired_retention)?;
        validate_retention(self.due_threshold)?;
        if self.day_reset_hour > 23 {
            return Err(CoreError::InvalidResetHour(self.day_reset_hour));
        }
        Ok(())
    }
}

/// Effective settings (global merged with deck overrides).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveSettings {
    pub daily_review_goal: u32,
    pub desired_retention: f64,
    pub due_threshold: f64,
    pub day_reset_hour: u32,
    pub recommendations_per_list: usize,
}

impl EffectiveSettings {
    /// Merge global settings with an optional deck.
    pub fn merge(global: &ReviewSettings, deck: Option<&Deck>) -> Result<Self> {
        let settings = match deck {
            Some(d) => Self {
                daily_review_goal: d.daily_review_goal.unwrap_or(global.new_cards_per_day),
                desired_retention: d.desired_retention.unwrap_or(global.desired_retention),
                due_threshold: global.due_threshold,
                day_reset_hour: global.day_reset_hour,
                recommendations_per_list: global.recommendations_per_list,
            },
            None => Self {
                daily_review_goal: global.new_cards_per_day,
                desired_retention: global.desired_retention,
                due_threshold: global.due_threshold,
                day_reset_hour: global.day_reset_hour,
                recommendations_per_list: global.recommendations_per_list,
            },
        };
        validate_retention(settings.desired_retention)?;
        Ok(settings)
    }
}

/// Desired retention must lie strictly inside (0, 1).
pub fn validate_retention(retention: f64) -> Result<()> {
    if retention > 0.0 && retention < 1.0 {
        Ok(())
    } else {
        Err(CoreError::InvalidRetention(retention))
    }
}

/// Language codes are three lowercase ASCII letters, like `hin` or `eng`.
pub fn validate_lang(lang: &str) -> Result<()> {
    if lang.len() == 3 && lang.bytes().all(|b| b.is_ascii_lowercase()) {
        Ok(())
    } else {
        Err(CoreError::InvalidLanguage(lang.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_round_trips_through_value() {
        for score in Score::ALL {
            assert_eq!(Score::from_value(score.to_value()), Some(score));
        }
        assert_eq!(Score::from_value(0), None);
        assert_eq!(Score::from_value(5), None);
    }

    #[test]
    fn score_parse_rejects_missing_and_out_of_range() {
        assert_eq!(Score::parse(None), Err(CoreError::MissingScore));
        assert_eq!(Score::parse(Some(5)), Err(CoreError::InvalidScore(5)));
        assert_eq!(Score::parse(Some(-1)), Err(CoreError::InvalidScore(-1)));
        assert_eq!(Score::parse(Some(3)), Ok(Score::Good));
    }

    #[test]
    fn score_converts_from_u8() {
        assert_eq!(u8::from(Score::Hard), 2);
        assert_eq!(Score::try_from(4u8), Ok(Score::Easy));
        assert_eq!(Score::try_from(0u8), Err(CoreError::InvalidScore(0)));
    }

    #[test]
    fn effective_settings_prefer_deck_overrides() {
        let global = ReviewSettings::default();
        let deck = Deck {
            daily_review_goal: Some(30),
            desired_retention: Some(0.85),
            ..Deck::new(Uuid::nil(), "hin")
        };

        let merged = EffectiveSettings::merge(&global, Some(&deck)).unwrap();
        assert_eq!(merged.daily_review_goal, 30);
        assert_eq!(merged.desired_retention, 0.85);
        assert_eq!(merged.due_threshold, 0.9);

        let defaults = EffectiveSettings::merge(&global, None).unwrap();
        assert_eq!(defaults.daily_review_goal, 15);
        assert_eq!(defaults.desired_retention, 0.9);
    }

    #[test]
    fn effective_settings_reject_bad_retention() {
        let deck = Deck {
            desired_retention: Some(1.0),
            ..Deck::new(Uuid::nil(), "hin")
        };
        assert_eq!(
            EffectiveSettings::merge(&ReviewSettings::default(), Some(&deck)),
            Err(CoreError::InvalidRetention(1.0))
        );
    }

    #[test]
    fn settings_validate_reset_hour() {
        let settings = ReviewSettings {
            day_reset_hour: 24,
            ..Default::default()
        };
        assert_eq!(settings.validate(), Err(CoreError::InvalidResetHour(24)));
        assert!(ReviewSettings::default().validate().is_ok());
    }

    #[test]
    fn lang_codes_must_be_three_lowercase_letters() {
        assert!(validate_lang("hin").is_ok());
        assert!(validate_lang("").is_err());
        assert!(validate_lang("HIN").is_err());
        assert!(validate_lang("hindi").is_err());
    }

    #[test]
    fn phrase_translation_lookup() {
        let phrase = Phrase {
            id: Uuid::nil(),
            lang: "hin".into(),
            text: "namaste".into(),
            translations: vec![Translation {
                lang: "eng".into(),
                text: "hello".into(),
            }],
            count_cards: 0,
            avg_difficulty: None,
            created_at: Utc::now(),
        };
        assert!(phrase.has_translation_in(&["eng".to_string()]));
        assert!(!phrase.has_translation_in(&["fra".to_string()]));
    }
}
