//! In-memory store implementing all four collaborator interfaces.
//!
//! Deterministic backend for tests and embedding, in the same spirit as a
//! fake executor: no external services, plus failure injection so callers
//! can exercise the rollback path.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::achievements::{AchievementCatalog, AchievementDef};
use crate::error::{Error, Result};
use crate::model::{
    Progress, Relationship, RelationshipId, UnlockRecord, User, UserId, XpTransaction,
};
use crate::store::{AchievementStore, LedgerStore, RelationshipStore, UserStore};

struct Inner {
    users: HashMap<UserId, User>,
    transactions: Vec<XpTransaction>,
    definitions: Vec<AchievementDef>,
    unlocks: HashMap<(UserId, String), UnlockRecord>,
    relationships: HashMap<RelationshipId, Relationship>,
    fail_next_append: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            users: HashMap::new(),
            transactions: Vec::new(),
            definitions: AchievementCatalog::standard().defs().to_vec(),
            unlocks: HashMap::new(),
            relationships: HashMap::new(),
            fail_next_append: false,
        }
    }
}

/// All four stores behind one mutex, so every operation is atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        let mut inner = self.inner.lock().unwrap();
        inner.users.insert(user.id.clone(), user);
    }

    pub fn insert_relationship(&self, rel: Relationship) {
        let mut inner = self.inner.lock().unwrap();
        inner.relationships.insert(rel.id.clone(), rel);
    }

    /// Replace the served achievement definitions (standard catalog by
    /// default).
    pub fn set_definitions(&self, defs: Vec<AchievementDef>) {
        self.inner.lock().unwrap().definitions = defs;
    }

    /// Make the next `append_transaction` fail with a store error.
    pub fn fail_next_append(&self) {
        self.inner.lock().unwrap().fail_next_append = true;
    }

    pub fn transaction_count(&self) -> usize {
        self.inner.lock().unwrap().transactions.len()
    }

    pub fn unlock_count(&self, user_id: &UserId) -> usize {
        self.inner
            .lock()
            .unwrap()
            .unlocks
            .keys()
            .filter(|(uid, _)| uid == user_id)
            .count()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: &UserId) -> Result<User> {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("user", id))
    }

    async fn update_progress(
        &self,
        id: &UserId,
        expected_version: u64,
        progress: Progress,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .get_mut(id)
            .ok_or_else(|| Error::not_found("user", id))?;
        if user.version != expected_version {
            return Err(Error::conflict(format!(
                "user {} version is {}, caller expected {}",
                id, user.version, expected_version
            )));
        }
        user.total_xp = progress.total_xp;
        user.level = progress.level;
        user.streak = progress.streak;
        user.version += 1;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn append_transaction(&self, tx: &XpTransaction) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_append {
            inner.fail_next_append = false;
            return Err(Error::store("injected append failure"));
        }
        inner.transactions.push(tx.clone());
        Ok(())
    }

    async fn list_transactions(&self, user_id: &UserId) -> Result<Vec<XpTransaction>> {
        let inner = self.inner.lock().unwrap();
        let mut txs: Vec<XpTransaction> = inner
            .transactions
            .iter()
            .filter(|tx| &tx.user_id == user_id)
            .cloned()
            .collect();
        // Insertion order is chronological; most recent first for display.
        txs.reverse();
        Ok(txs)
    }
}

#[async_trait]
impl AchievementStore for MemoryStore {
    async fn list_definitions(&self) -> Result<Vec<AchievementDef>> {
        Ok(self.inner.lock().unwrap().definitions.clone())
    }

    async fn list_unlocked(&self, user_id: &UserId) -> Result<Vec<UnlockRecord>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .unlocks
            .iter()
            .filter(|((uid, _), _)| uid == user_id)
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn insert_unlock_if_absent(
        &self,
        user_id: &UserId,
        achievement_key: &str,
    ) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let key = (user_id.clone(), achievement_key.to_string());
        if inner.unlocks.contains_key(&key) {
            return Ok(false);
        }
        inner.unlocks.insert(
            key,
            UnlockRecord {
                user_id: user_id.clone(),
                achievement_key: achievement_key.to_string(),
                unlocked_at: Utc::now(),
            },
        );
        Ok(true)
    }
}

#[async_trait]
impl RelationshipStore for MemoryStore {
    async fn get_relationship(&self, id: &RelationshipId) -> Result<Relationship> {
        let inner = self.inner.lock().unwrap();
        inner
            .relationships
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("relationship", id))
    }

    async fn list_relationships(&self, user_id: &UserId) -> Result<Vec<Relationship>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .relationships
            .values()
            .filter(|rel| &rel.user_id == user_id)
            .cloned()
            .collect())
    }
}
