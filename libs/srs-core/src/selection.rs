//! Planning today's study list.
//!
//! Due cards are always included. New cards are then drawn from four
//! sources in priority order, each one only filling what the earlier ones
//! left open:
//!
//! 1. friend recommendations
//! 2. algorithmic recommendations the learner approved
//! 3. unreviewed active cards already in the deck
//! 4. the language library, by descending phrase id
//!
//! The library order is deterministic so a reload shows the same picks.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deck::{difference, union, DeckPids};
use crate::recommend::{CatalogPids, Recommendations};

/// Everything the cascade draws from.
#[derive(Debug, Clone, Copy)]
pub struct SelectionInput<'a> {
    /// Number of new cards wanted today.
    pub goal: usize,
    pub deck: &'a DeckPids,
    pub catalog: &'a CatalogPids,
    pub friend_recommendations: &'a [Uuid],
}

/// Candidates computed before the learner approves any recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionOffer {
    pub goal: usize,
    pub due: Vec<Uuid>,
    pub friend: Vec<Uuid>,
    /// Algorithmic recommendations open for approval.
    pub recommendations: Recommendations,
}

/// Final picks of every cascade stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPlan {
    pub goal: usize,
    pub due: Vec<Uuid>,
    pub friend: Vec<Uuid>,
    pub algorithmic: Vec<Uuid>,
    pub deck: Vec<Uuid>,
    pub library: Vec<Uuid>,
    /// New cards for today, all stages combined.
    pub fresh: Vec<Uuid>,
    /// Fresh phrases with no card in the deck yet.
    pub cards_to_create: Vec<Uuid>,
    /// Fresh cards first, then due cards.
    pub manifest: Vec<Uuid>,
}

impl SelectionPlan {
    /// Cards missing from the goal, zero when it was met.
    pub fn shortfall(&self) -> usize {
        self.goal.saturating_sub(self.manifest.len())
    }
}

/// Compute due cards, friend picks and the recommendation lists.
pub fn offer(input: &SelectionInput<'_>) -> SelectionOffer {
    let deck = input.deck;
    let friend_filtered = difference(input.friend_recommendations, &[&deck.reviewed_or_inactive]);
    let friend: Vec<Uuid> = friend_filtered.iter().take(input.goal).copied().collect();
    let recommendations = input
        .catalog
        .recommendations
        .without(&[&deck.reviewed_or_inactive, &friend_filtered]);

    SelectionOffer {
        goal: input.goal,
        due: deck.due.clone(),
        friend,
        recommendations,
    }
}

/// Run the full cascade with the recommendations the learner approved.
///
/// Approvals outside the offered lists are ignored.
pub fn plan(input: &SelectionInput<'_>, approved: &[Uuid]) -> SelectionPlan {
    let offer = offer(input);
    let deck = input.deck;

    let need = input.goal.saturating_sub(offer.friend.len());
    let offered = offer.recommendations.all();
    let algorithmic: Vec<Uuid> = union(&[approved])
        .into_iter()
        .filter(|id| offered.contains(id))
        .take(need)
        .collect();

    let need = need.saturating_sub(algorithmic.len());
    let from_deck: Vec<Uuid> = difference(&deck.unreviewed_active, &[&offer.friend, &algorithmic])
        .into_iter()
        .take(need)
        .collect();

    let need = need.saturating_sub(from_deck.len());
    let mut library = difference(
        &input.catalog.selectable,
        &[&offer.friend, &algorithmic, &from_deck],
    );
    library.sort_unstable_by(|a, b| b.cmp(a));
    library.truncate(need);

    let fresh = union(&[&offer.friend, &algorithmic, &from_deck, &library]);
    let cards_to_create = difference(&fresh, &[&deck.all]);
    let manifest = union(&[&fresh, &offer.due]);

    SelectionPlan {
        goal: input.goal,
        due: offer.due,
        friend: offer.friend,
        algorithmic,
        deck: from_deck,
        library,
        fresh,
        cards_to_create,
        manifest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn ids(ns: &[u128]) -> Vec<Uuid> {
        ns.iter().map(|n| id(*n)).collect()
    }

    fn catalog(selectable: &[u128], recs: Recommendations) -> CatalogPids {
        CatalogPids {
            visible: ids(selectable),
            selectable: ids(selectable),
            not_in_deck: Vec::new(),
            recommendations: recs,
        }
    }

    #[test]
    fn deck_cards_fill_the_goal_first() {
        let deck = DeckPids {
            all: ids(&[1, 2, 3, 4]),
            unreviewed_active: ids(&[1, 2, 3]),
            reviewed_or_inactive: ids(&[4]),
            due: ids(&[4]),
            ..Default::default()
        };
        let catalog = catalog(&[1, 2, 3, 50, 60], Recommendations::default());
        let input = SelectionInput {
            goal: 2,
            deck: &deck,
            catalog: &catalog,
            friend_recommendations: &[],
        };

        let plan = plan(&input, &[]);
        assert_eq!(plan.deck, ids(&[1, 2]));
        assert!(plan.library.is_empty());
        assert!(plan.cards_to_create.is_empty());
        assert_eq!(plan.manifest, ids(&[1, 2, 4]));
        assert_eq!(plan.shortfall(), 0);
    }

    #[test]
    fn library_fallback_takes_descending_ids() {
        let deck = DeckPids {
            all: ids(&[1]),
            unreviewed_active: ids(&[1]),
            ..Default::default()
        };
        let catalog = catalog(&[1, 5, 9, 7, 3], Recommendations::default());
        let input = SelectionInput {
            goal: 3,
            deck: &deck,
            catalog: &catalog,
            friend_recommendations: &[],
        };

        let plan = plan(&input, &[]);
        assert_eq!(plan.deck, ids(&[1]));
        assert_eq!(plan.library, ids(&[9, 7]));
        assert_eq!(plan.cards_to_create, ids(&[9, 7]));
        assert_eq!(plan.fresh, ids(&[1, 9, 7]));
    }

    #[test]
    fn friend_and_approved_recommendations_come_first() {
        let deck = DeckPids {
            all: ids(&[1, 2, 8]),
            unreviewed_active: ids(&[1, 2]),
            reviewed_or_inactive: ids(&[8]),
            ..Default::default()
        };
        let recs = Recommendations {
            popular: ids(&[20, 21]),
            easiest: ids(&[22, 30]),
            newest: ids(&[8]),
        };
        let catalog = catalog(&[1, 2, 20, 21, 22, 30, 40], recs);
        let input = SelectionInput {
            goal: 4,
            deck: &deck,
            catalog: &catalog,
            friend_recommendations: &ids(&[30, 8]),
        };

        let offer = offer(&input);
        assert_eq!(offer.friend, ids(&[30]));
        assert_eq!(offer.recommendations.all(), ids(&[20, 21, 22]));

        // 99 was never offered
        let plan = plan(&input, &ids(&[21, 99, 22]));
        assert_eq!(plan.friend, ids(&[30]));
        assert_eq!(plan.algorithmic, ids(&[21, 22]));
        assert_eq!(plan.deck, ids(&[1]));
        assert!(plan.library.is_empty());
        assert_eq!(plan.fresh, ids(&[30, 21, 22, 1]));
        assert_eq!(plan.cards_to_create, ids(&[30, 21, 22]));
    }

    #[test]
    fn approvals_capped_at_remaining_need() {
        let deck = DeckPids::default();
        let recs = Recommendations {
            popular: ids(&[1, 2, 3]),
            ..Default::default()
        };
        let catalog = catalog(&[1, 2, 3], recs);
        let input = SelectionInput {
            goal: 2,
            deck: &deck,
            catalog: &catalog,
            friend_recommendations: &[],
        };
        let plan = plan(&input, &ids(&[1, 2, 3]));
        assert_eq!(plan.algorithmic, ids(&[1, 2]));
    }

    #[test]
    fn exhausted_library_reports_shortfall() {
        let deck = DeckPids::default();
        let catalog = catalog(&[4, 6], Recommendations::default());
        let input = SelectionInput {
            goal: 5,
            deck: &deck,
            catalog: &catalog,
            friend_recommendations: &[],
        };
        let plan = plan(&input, &[]);
        assert_eq!(plan.manifest, ids(&[6, 4]));
        assert_eq!(plan.shortfall(), 3);
    }

    #[test]
    fn due_cards_are_not_counted_against_goal() {
        let deck = DeckPids {
            all: ids(&[1, 2, 3]),
            reviewed_or_inactive: ids(&[1, 2, 3]),
            due: ids(&[1, 2, 3]),
            ..Default::default()
        };
        let catalog = catalog(&[10, 11], Recommendations::default());
        let input = SelectionInput {
            goal: 2,
            deck: &deck,
            catalog: &catalog,
            friend_recommendations: &[],
        };
        let plan = plan(&input, &[]);
        assert_eq!(plan.library, ids(&[11, 10]));
        assert_eq!(plan.manifest, ids(&[11, 10, 1, 2, 3]));
    }
}
