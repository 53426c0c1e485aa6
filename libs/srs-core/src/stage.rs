//! Progress through a day's manifest.
//!
//! The review stage is never stored. It is derived from the manifest and the
//! latest review of each phrase, so it cannot drift from the data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Review, Score};

/// Latest review of each phrase reviewed today.
pub type ReviewsMap = HashMap<Uuid, Review>;

/// Fold a day's rows into one entry per phrase; later `created_at` wins.
pub fn reviews_map(rows: &[Review]) -> ReviewsMap {
    let mut sorted: Vec<&Review> = rows.iter().collect();
    sorted.sort_by_key(|r| r.created_at);
    sorted
        .into_iter()
        .map(|r| (r.phrase_id, r.clone()))
        .collect()
}

/// Where the learner is within a day session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStage {
    NotStarted,
    /// Working through the manifest in order.
    FirstPass,
    /// Back over cards skipped during the first pass.
    SkippedPass,
    /// Everything scored, some Again cards left to decide on.
    Checkpoint,
    /// Re-reviewing cards scored Again.
    AgainPass,
    Complete,
}

impl ReviewStage {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::FirstPass => 1,
            Self::SkippedPass => 2,
            Self::Checkpoint => 3,
            Self::AgainPass => 4,
            Self::Complete => 5,
        }
    }
}

/// Aggregate counts for a day session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub count: usize,
    pub reviewed: usize,
    /// Phrases whose latest score is Again.
    pub again: usize,
    pub unreviewed: usize,
    pub complete: usize,
    /// Phrases whose latest row is a re-review.
    pub re_reviewed: usize,
    /// The learner started re-reviewing Again cards. Until then every
    /// differing score corrects today's first review.
    pub re_reviewing: bool,
    pub first_unreviewed_index: usize,
    pub first_again_index: usize,
    pub stage: ReviewStage,
    /// Card the learner should be looking at; `count` when there is none.
    pub index: usize,
}

impl ReviewStats {
    /// Derive the day's counts and stage.
    ///
    /// The Again pass starts either when the learner asks for it
    /// (`again_pass_started`) or once a re-review row exists.
    pub fn compute(manifest: &[Uuid], reviews: &ReviewsMap, again_pass_started: bool) -> Self {
        let latest: Vec<&Review> = manifest.iter().filter_map(|id| reviews.get(id)).collect();
        let count = manifest.len();
        let reviewed = latest.len();
        let again = latest.iter().filter(|r| r.score.is_again()).count();
        let re_reviewed = latest.iter().filter(|r| !r.day_first_review).count();
        let first_unreviewed_index = next_unreviewed_index(manifest, reviews, None);
        let first_again_index = next_again_index(manifest, reviews, None);
        let re_reviewing = again_pass_started || re_reviewed > 0;

        let stage = if count == 0 || reviewed == 0 {
            ReviewStage::NotStarted
        } else if reviewed < count {
            let furthest_reviewed = manifest.iter().rposition(|id| reviews.contains_key(id));
            let open_ahead = manifest
                .iter()
                .enumerate()
                .any(|(i, id)| !reviews.contains_key(id) && Some(i) > furthest_reviewed);
            if open_ahead {
                ReviewStage::FirstPass
            } else {
                ReviewStage::SkippedPass
            }
        } else if again == 0 {
            ReviewStage::Complete
        } else if re_reviewing {
            ReviewStage::AgainPass
        } else {
            ReviewStage::Checkpoint
        };

        let index = match stage {
            ReviewStage::Checkpoint | ReviewStage::AgainPass => first_again_index,
            ReviewStage::Complete => count,
            _ => first_unreviewed_index,
        };

        Self {
            count,
            reviewed,
            again,
            unreviewed: count - reviewed,
            complete: reviewed - again,
            re_reviewed,
            re_reviewing,
            first_unreviewed_index,
            first_again_index,
            stage,
            index,
        }
    }

    /// A differing score rewrites today's first review instead of adding a
    /// re-review row.
    pub fn allows_correction(&self) -> bool {
        !self.re_reviewing
    }
}

/// Next unreviewed card after `current`, or the manifest length if none.
///
/// From the end of the manifest (or with no position) the search starts
/// over from the first card.
pub fn next_unreviewed_index(manifest: &[Uuid], reviews: &ReviewsMap, current: Option<usize>) -> usize {
    let start = match current {
        Some(i) if i < manifest.len() => i + 1,
        _ => 0,
    };
    manifest
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, id)| !reviews.contains_key(id))
        .map_or(manifest.len(), |(i, _)| i)
}

/// Next card whose latest score is Again, searching cyclically after
/// `current`; the manifest length if none.
pub fn next_again_index(manifest: &[Uuid], reviews: &ReviewsMap, current: Option<usize>) -> usize {
    let len = manifest.len();
    let start = current.map_or(0, |i| i + 1);
    (0..len)
        .map(|offset| (start + offset) % len)
        .find(|&i| reviews.get(&manifest[i]).is_some_and(|r| r.score == Score::Again))
        .unwrap_or(len)
}
