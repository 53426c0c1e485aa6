//! Local cache of each study day's manifest and reviews.
//!
//! Review results are merged into the cached map under their phrase key
//! instead of invalidating the entry, so the cached day stays consistent
//! even when a backing read would be stale.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use srs_core::{reviews_map, DailyManifest, DayKey, Review, ReviewStats, ReviewsMap};

use crate::store::{Result, StoreError};

/// A day's manifest with the latest and first review of every phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct DayState {
    pub manifest: DailyManifest,
    /// Latest review per phrase.
    pub reviews: ReviewsMap,
    /// Review with `day_first_review` set, per phrase.
    pub first_reviews: ReviewsMap,
    /// Set when the learner moves on to the Again pass before any
    /// re-review row exists. Not persisted.
    pub again_pass_started: bool,
}

impl DayState {
    pub fn new(manifest: DailyManifest, rows: &[Review]) -> Self {
        let firsts: Vec<Review> = rows.iter().filter(|r| r.day_first_review).cloned().collect();
        Self {
            manifest,
            reviews: reviews_map(rows),
            first_reviews: reviews_map(&firsts),
            again_pass_started: false,
        }
    }

    pub fn stats(&self) -> ReviewStats {
        ReviewStats::compute(&self.manifest.manifest, &self.reviews, self.again_pass_started)
    }

    /// Record a review returned by the store.
    pub fn merge(&mut self, review: Review) {
        if review.day_first_review {
            self.first_reviews.insert(review.phrase_id, review.clone());
        }
        self.reviews.insert(review.phrase_id, review);
    }
}

/// Day states keyed by learner, language and day session.
#[derive(Debug, Default)]
pub struct DayCache {
    days: Mutex<HashMap<DayKey, DayState>>,
}

impl DayCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DayKey) -> Result<Option<DayState>> {
        Ok(self.days()?.get(key).cloned())
    }

    /// Cache `state` unless the key is already present; returns the cached state.
    pub fn insert_if_absent(&self, key: &DayKey, state: DayState) -> Result<DayState> {
        Ok(self
            .days()?
            .entry(key.clone())
            .or_insert(state)
            .clone())
    }

    /// Merge a review into a cached day. Returns the updated state, or
    /// `None` if the day is not cached.
    pub fn merge_review(&self, key: &DayKey, review: Review) -> Result<Option<DayState>> {
        let mut days = self.days()?;
        Ok(days.get_mut(key).map(|state| {
            state.merge(review);
            state.clone()
        }))
    }

    /// Mark a cached day as re-reviewing. Returns the updated state, or
    /// `None` if the day is not cached.
    pub fn start_again_pass(&self, key: &DayKey) -> Result<Option<DayState>> {
        let mut days = self.days()?;
        Ok(days.get_mut(key).map(|state| {
            state.again_pass_started = true;
            state.clone()
        }))
    }

    pub fn evict(&self, key: &DayKey) -> Result<()> {
        self.days()?.remove(key);
        Ok(())
    }

    fn days(&self) -> Result<MutexGuard<'_, HashMap<DayKey, DayState>>> {
        self.days.lock().map_err(|_| StoreError::Poisoned)
    }
}
