//! simp_core: progression and scoring engine for a gamified
//! relationship-tracking dashboard.
//!
//! Turns raw activity (logged interactions, spending, time invested,
//! intimacy ratings) into derived state: XP, levels, streaks, unlocked
//! achievements, and a per-relationship Simp Index with a decay
//! classification. All writes flow through [`Progression::award_xp`];
//! everything else is read-only.
//!
//! Persistence is an external collaborator behind the narrow traits in
//! [`store`]; [`store::MemoryStore`] wires all of them in memory for tests
//! and embedding.

pub mod achievements;
pub mod config;
pub mod error;
pub mod ledger;
pub mod leveling;
pub mod model;
pub mod progression;
pub mod scoring;
pub mod store;
pub mod streaks;

pub use achievements::{
    AchievementCatalog, AchievementDef, AchievementEvaluator, Criterion, ProgressionSnapshot,
};
pub use config::ProgressionConfig;
pub use error::{Error, Result};
pub use ledger::XpLedger;
pub use leveling::{LevelCurve, LevelUp};
pub use model::{
    Progress, Relationship, RelationshipId, RelationshipStatus, StreakState, UnlockRecord, User,
    UserId, XpSource, XpTransaction,
};
pub use progression::{Progression, ProgressionResult};
pub use scoring::{score, DecayLevel, DecayThresholds, RelationshipScore};
pub use store::{AchievementStore, LedgerStore, MemoryStore, RelationshipStore, UserStore};
