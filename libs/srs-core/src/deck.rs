//! Partitions of a learner's deck by review status.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::algorithm::ForecastModel;
use crate::due::is_due;
use crate::types::{Card, CardStatus};

/// Phrase ids of a deck, grouped the ways the session builder needs them.
///
/// Every list keeps the order of the cards it was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckPids {
    pub all: Vec<Uuid>,
    pub active: Vec<Uuid>,
    pub reviewed: Vec<Uuid>,
    /// Reviewed at least once, or no longer being studied.
    pub reviewed_or_inactive: Vec<Uuid>,
    pub unreviewed_active: Vec<Uuid>,
    /// Active cards due for review at the time of the partition.
    pub due: Vec<Uuid>,
}

impl DeckPids {
    pub fn from_cards(
        model: &dyn ForecastModel,
        cards: &[Card],
        now: DateTime<Utc>,
        due_threshold: f64,
    ) -> Self {
        let active = |c: &Card| c.status == CardStatus::Active;

        Self {
            all: phrase_ids(cards, |_| true),
            active: phrase_ids(cards, active),
            reviewed: phrase_ids(cards, Card::is_reviewed),
            reviewed_or_inactive: phrase_ids(cards, |c| c.is_reviewed() || !active(c)),
            unreviewed_active: phrase_ids(cards, |c| !c.is_reviewed() && active(c)),
            due: phrase_ids(cards, |c| active(c) && is_due(model, c, now, due_threshold)),
        }
    }
}

fn phrase_ids(cards: &[Card], keep: impl Fn(&Card) -> bool) -> Vec<Uuid> {
    cards.iter().filter(|c| keep(c)).map(|c| c.phrase_id).collect()
}

/// Items of `list` that appear in none of `excluded`, in their original order.
pub fn difference(list: &[Uuid], excluded: &[&[Uuid]]) -> Vec<Uuid> {
    let excluded: HashSet<&Uuid> = excluded.iter().flat_map(|l| l.iter()).collect();
    list.iter().filter(|id| !excluded.contains(id)).copied().collect()
}

/// Concatenation of `lists` without repeats, first occurrence wins.
pub fn union(lists: &[&[Uuid]]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    lists
        .iter()
        .flat_map(|l| l.iter())
        .filter(|id| seen.insert(**id))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::fsrs::Fsrs;
    use crate::types::MemoryState;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn card(status: CardStatus, reviewed_days_ago: Option<i64>) -> Card {
        Card {
            status,
            memory: reviewed_days_ago.map(|_| MemoryState {
                difficulty: 5.0,
                stability: 3.0,
            }),
            last_reviewed_at: reviewed_days_ago.map(|d| now() - Duration::days(d)),
            ..Card::new(Uuid::nil(), "hin", Uuid::new_v4(), now() - Duration::days(30))
        }
    }

    #[test]
    fn partitions_by_status_and_history() {
        let fresh = card(CardStatus::Active, None);
        let due = card(CardStatus::Active, Some(20));
        let recent = card(CardStatus::Active, Some(0));
        let skipped = card(CardStatus::Skipped, None);
        let learned_due = card(CardStatus::Learned, Some(20));
        let cards = vec![
            fresh.clone(),
            due.clone(),
            recent.clone(),
            skipped.clone(),
            learned_due.clone(),
        ];

        let pids = DeckPids::from_cards(&Fsrs::default(), &cards, now(), 0.9);

        assert_eq!(pids.all.len(), 5);
        assert_eq!(pids.active, vec![fresh.phrase_id, due.phrase_id, recent.phrase_id]);
        assert_eq!(
            pids.reviewed,
            vec![due.phrase_id, recent.phrase_id, learned_due.phrase_id]
        );
        assert_eq!(
            pids.reviewed_or_inactive,
            vec![
                due.phrase_id,
                recent.phrase_id,
                skipped.phrase_id,
                learned_due.phrase_id
            ]
        );
        assert_eq!(pids.unreviewed_active, vec![fresh.phrase_id]);
        assert_eq!(pids.due, vec![due.phrase_id]);
    }

    #[test]
    fn difference_and_union_keep_order() {
        let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        assert_eq!(
            difference(&ids, &[&ids[1..2], &ids[3..4]]),
            vec![ids[0], ids[2], ids[4]]
        );
        assert_eq!(
            union(&[&[ids[2], ids[0]][..], &[ids[0], ids[1]][..]]),
            vec![ids[2], ids[0], ids[1]]
        );
    }
}
