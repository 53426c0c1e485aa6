//! Phrases recommended by a learner's friends.

use uuid::Uuid;

use crate::store::Result;

/// Source of friend recommendations for the session cascade.
pub trait FriendRecommendations: Send + Sync {
    /// Recommended phrase ids, most relevant first.
    fn recommendations(&self, uid: Uuid, lang: &str) -> Result<Vec<Uuid>>;
}

/// No social graph: nobody recommends anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFriendRecommendations;

impl FriendRecommendations for NoFriendRecommendations {
    fn recommendations(&self, _uid: Uuid, _lang: &str) -> Result<Vec<Uuid>> {
        Ok(Vec::new())
    }
}

/// Fixed recommendations, whoever asks.
#[derive(Debug, Clone, Default)]
pub struct StaticFriendRecommendations(pub Vec<Uuid>);

impl FriendRecommendations for StaticFriendRecommendations {
    fn recommendations(&self, _uid: Uuid, _lang: &str) -> Result<Vec<Uuid>> {
        Ok(self.0.clone())
    }
}
