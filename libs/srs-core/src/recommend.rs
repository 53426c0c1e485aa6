//! Ranked phrase recommendations from a language's catalog.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deck::{difference, DeckPids};
use crate::types::Phrase;

/// Stand-in average difficulty for phrases nobody has reviewed yet.
const UNKNOWN_DIFFICULTY: f64 = 99.0;

/// Three top-N lists, each free of ids in the lists before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub popular: Vec<Uuid>,
    pub easiest: Vec<Uuid>,
    pub newest: Vec<Uuid>,
}

impl Recommendations {
    /// Every recommended id, popular first.
    pub fn all(&self) -> Vec<Uuid> {
        self.popular
            .iter()
            .chain(&self.easiest)
            .chain(&self.newest)
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.popular.is_empty() && self.easiest.is_empty() && self.newest.is_empty()
    }

    /// Drop every id present in any of `excluded`.
    pub fn without(&self, excluded: &[&[Uuid]]) -> Self {
        Self {
            popular: difference(&self.popular, excluded),
            easiest: difference(&self.easiest, excluded),
            newest: difference(&self.newest, excluded),
        }
    }
}

/// Catalog ids combined with the learner's deck and spoken languages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPids {
    /// Phrases with at least one translation the learner can read.
    pub visible: Vec<Uuid>,
    /// Visible phrases the learner has not reviewed or set aside.
    pub selectable: Vec<Uuid>,
    pub not_in_deck: Vec<Uuid>,
    pub recommendations: Recommendations,
}

impl CatalogPids {
    pub fn build(
        phrases: &[Phrase],
        spoken_languages: &[String],
        deck: &DeckPids,
        per_list: usize,
    ) -> Self {
        let by_id: HashMap<Uuid, &Phrase> = phrases.iter().map(|p| (p.id, p)).collect();

        let visible: Vec<Uuid> = phrases
            .iter()
            .filter(|p| p.has_translation_in(spoken_languages))
            .map(|p| p.id)
            .collect();
        let not_in_deck = difference(&visible, &[&deck.all]);
        let selectable = difference(&visible, &[&deck.reviewed_or_inactive]);

        let phrase = |id: &Uuid| by_id.get(id).copied();

        let mut popular = selectable.clone();
        popular.sort_by_key(|id| std::cmp::Reverse(phrase(id).map_or(0, |p| p.count_cards)));

        let mut easiest = selectable.clone();
        easiest.sort_by(|a, b| {
            let difficulty =
                |id: &Uuid| phrase(id).and_then(|p| p.avg_difficulty).unwrap_or(UNKNOWN_DIFFICULTY);
            difficulty(a)
                .partial_cmp(&difficulty(b))
                .unwrap_or(Ordering::Equal)
        });

        let mut newest = selectable.clone();
        newest.sort_by(|a, b| {
            let created = |id: &Uuid| phrase(id).map(|p| p.created_at);
            created(b).cmp(&created(a))
        });

        let popular: Vec<Uuid> = popular.into_iter().take(per_list).collect();
        let easiest: Vec<Uuid> = difference(&easiest, &[&popular])
            .into_iter()
            .take(per_list)
            .collect();
        let newest: Vec<Uuid> = difference(&newest, &[&popular, &easiest])
            .into_iter()
            .take(per_list)
            .collect();

        Self {
            visible,
            selectable,
            not_in_deck,
            recommendations: Recommendations {
                popular,
                easiest,
                newest,
            },
        }
    }
}
