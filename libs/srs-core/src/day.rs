//! Day session keys.
//!
//! A day session is the calendar day a review belongs to. The day starts at
//! a configurable reset hour rather than at midnight, so studying at 1am
//! still counts toward the previous day.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, Result};
use crate::types::validate_lang;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Calendar-day partition key for one review cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySession(NaiveDate);

impl DaySession {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Parse a `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> Result<Self> {
        NaiveDate::parse_from_str(s.trim(), DAY_FORMAT)
            .map(Self)
            .map_err(|_| CoreError::InvalidDaySession(s.to_string()))
    }

    /// Day session containing `now`, with the day starting at `reset_hour`.
    ///
    /// If the current hour is before the reset hour, the session is still
    /// "yesterday" from a study perspective.
    pub fn at(now: DateTime<Utc>, reset_hour: u32) -> Result<Self> {
        if reset_hour > 23 {
            return Err(CoreError::InvalidResetHour(reset_hour));
        }
        let shifted = now - Duration::hours(i64::from(reset_hour));
        Ok(Self(shifted.date_naive()))
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DaySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl From<NaiveDate> for DaySession {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

/// Identifies one learner's study day in one language.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayKey {
    pub uid: Uuid,
    pub lang: String,
    pub day_session: DaySession,
}

impl DayKey {
    /// Build a key, validating the language code.
    pub fn new(uid: Uuid, lang: &str, day_session: DaySession) -> Result<Self> {
        validate_lang(lang)?;
        Ok(Self {
            uid,
            lang: lang.to_string(),
            day_session,
        })
    }

    /// Build a key from an unparsed day session string.
    pub fn parse(uid: Uuid, lang: &str, day_session: &str) -> Result<Self> {
        Self::new(uid, lang, DaySession::parse(day_session)?)
    }

    pub fn date(&self) -> NaiveDate {
        self.day_session.date()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.uid, self.lang, self.day_session)
    }
}
