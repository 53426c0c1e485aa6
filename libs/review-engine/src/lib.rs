//! Review engine for daily phrase study.
//!
//! Builds each learner's daily manifest, records scored reviews against it
//! and persists cards, reviews and manifests through the [`store`] traits.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod friends;
pub mod review;
pub mod service;
pub mod session;
pub mod store;

pub use cache::{DayCache, DayState};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, Result};
pub use friends::{FriendRecommendations, NoFriendRecommendations, StaticFriendRecommendations};
pub use review::{ReviewEngine, SubmitAction, SubmitOutcome};
pub use service::StudyService;
pub use session::{Preparation, SessionBreakdown, SessionBuilder, SessionOutcome};
pub use store::{Inspect, MemoryStore, SqliteStore, Store, StoreError, StoreSnapshot};
