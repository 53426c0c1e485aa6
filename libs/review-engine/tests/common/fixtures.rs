//! Factory functions for catalog phrases and review times.

use chrono::{DateTime, Duration, TimeZone, Utc};
use srs_core::{Phrase, Translation};
use uuid::Uuid;

use super::LANG;

/// 09:00 UTC, well after the default day reset.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

pub fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

pub fn ids(ns: &[u128]) -> Vec<Uuid> {
    ns.iter().map(|n| id(*n)).collect()
}

/// A catalog phrase with an English translation.
pub fn phrase(n: u128, count_cards: u32, avg_difficulty: Option<f64>) -> Phrase {
    Phrase {
        id: id(n),
        lang: LANG.to_string(),
        text: format!("phrase {n}"),
        translations: vec![Translation {
            lang: "eng".to_string(),
            text: format!("translation {n}"),
        }],
        count_cards,
        avg_difficulty,
        created_at: start() - Duration::days(100) + Duration::hours(n as i64),
    }
}

/// Phrases `1..=n`; lower ids are more popular.
pub fn catalog(n: u128) -> Vec<Phrase> {
    (1..=n)
        .map(|i| phrase(i, (n - i + 1) as u32 * 10, None))
        .collect()
}
