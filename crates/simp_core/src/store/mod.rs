//! Narrow store interfaces the engine depends on but does not implement.
//!
//! The persistence technology lives behind these traits; production code
//! wires real backends, tests use the in-memory implementation in
//! `store::memory`. All mutating operations are atomic at the store
//! boundary: a versioned progress write either fully applies or fails with
//! a conflict, and unlock insertion is first-writer-wins.

use async_trait::async_trait;

use crate::achievements::AchievementDef;
use crate::error::Result;
use crate::model::{
    Progress, Relationship, RelationshipId, UnlockRecord, User, UserId, XpTransaction,
};

pub mod memory;

pub use memory::MemoryStore;

/// Access to user accounts and their progression fields.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &UserId) -> Result<User>;

    /// Atomically replace the progression fields of one user.
    ///
    /// `expected_version` is the version read before computing the update;
    /// if the stored version has moved, the write fails with
    /// `Error::Conflict` and nothing changes. A successful write bumps the
    /// version by one.
    async fn update_progress(
        &self,
        id: &UserId,
        expected_version: u64,
        progress: Progress,
    ) -> Result<()>;
}

/// Append-only transaction log.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append_transaction(&self, tx: &XpTransaction) -> Result<()>;

    /// All transactions for a user, most recent first.
    async fn list_transactions(&self, user_id: &UserId) -> Result<Vec<XpTransaction>>;
}

/// Achievement definitions and unlock records, the latter guarded by a
/// (user, achievement) uniqueness constraint.
#[async_trait]
pub trait AchievementStore: Send + Sync {
    /// The achievement definitions this deployment serves.
    async fn list_definitions(&self) -> Result<Vec<AchievementDef>>;

    async fn list_unlocked(&self, user_id: &UserId) -> Result<Vec<UnlockRecord>>;

    /// Insert an unlock record unless one already exists for this pair.
    /// Returns `true` when this call inserted, `false` on the duplicate-key
    /// no-op. Never fails on a duplicate.
    async fn insert_unlock_if_absent(
        &self,
        user_id: &UserId,
        achievement_key: &str,
    ) -> Result<bool>;
}

/// Read-only view of tracked relationships. The scorer never writes back.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn get_relationship(&self, id: &RelationshipId) -> Result<Relationship>;

    async fn list_relationships(&self, user_id: &UserId) -> Result<Vec<Relationship>>;
}
