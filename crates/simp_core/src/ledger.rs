//! XP ledger: append-only record of point-earning events.
//!
//! Transactions are immutable; the running sum for a user always equals
//! that user's `total_xp`, which is why appends are only issued from the
//! orchestrator's commit protocol (see `progression`).

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{UserId, XpSource, XpTransaction};
use crate::store::LedgerStore;

pub struct XpLedger {
    store: Arc<dyn LedgerStore>,
}

impl XpLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Persist one immutable transaction. Zero amounts are rejected before
    /// any write reaches the store.
    pub async fn append(
        &self,
        user_id: &UserId,
        amount: u64,
        source: XpSource,
    ) -> Result<XpTransaction> {
        if amount == 0 {
            return Err(Error::validation("XP amount must be positive"));
        }
        let tx = XpTransaction::new(user_id.clone(), amount, source);
        self.store.append_transaction(&tx).await?;
        debug!(user = %user_id, amount, source = %source, tx = %tx.id, "ledger append");
        Ok(tx)
    }

    /// Full transaction history for a user, most recent first.
    pub async fn history(&self, user_id: &UserId) -> Result<Vec<XpTransaction>> {
        self.store.list_transactions(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_append_rejects_zero_amount() {
        let store = Arc::new(MemoryStore::new());
        let ledger = XpLedger::new(store.clone());
        let user = UserId::new("u1");

        let err = ledger
            .append(&user, 0, XpSource::Bonus)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_append_and_history() {
        let store = Arc::new(MemoryStore::new());
        let ledger = XpLedger::new(store);
        let user = UserId::new("u1");

        ledger.append(&user, 25, XpSource::InteractionLogged).await.unwrap();
        ledger.append(&user, 40, XpSource::SpendingLogged).await.unwrap();

        let history = ledger.history(&user).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, 40);
        assert_eq!(history[1].amount, 25);
    }

    #[tokio::test]
    async fn test_history_is_per_user() {
        let store = Arc::new(MemoryStore::new());
        let ledger = XpLedger::new(store);

        ledger
            .append(&UserId::new("u1"), 10, XpSource::Bonus)
            .await
            .unwrap();
        ledger
            .append(&UserId::new("u2"), 20, XpSource::Bonus)
            .await
            .unwrap();

        let history = ledger.history(&UserId::new("u1")).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, 10);
    }
}
