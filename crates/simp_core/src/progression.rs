//! Progression orchestrator: the single write path for XP, streaks and
//! achievement unlocks.
//!
//! An award commits the user's new progression fields with a versioned
//! write (retried on conflict), then appends the ledger transaction, then
//! re-aggregates state and runs achievement evaluation. If the ledger
//! append fails after the commit, the previous progress is restored so the
//! transaction sum and `total_xp` stay in agreement.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::achievements::{AchievementDef, AchievementEvaluator, ProgressionSnapshot};
use crate::config::ProgressionConfig;
use crate::error::{Error, Result};
use crate::ledger::XpLedger;
use crate::leveling::{LevelCurve, LevelUp};
use crate::model::{
    Progress, Relationship, RelationshipId, StreakState, User, UserId, XpSource, XpTransaction,
};
use crate::scoring::{self, DecayThresholds, RelationshipScore};
use crate::store::{AchievementStore, LedgerStore, MemoryStore, RelationshipStore, UserStore};
use crate::streaks;

/// Consolidated outcome of one XP award.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionResult {
    pub level_up: Option<LevelUp>,
    pub streak_count: u32,
    pub new_achievements: Vec<AchievementDef>,
}

/// Façade composing the ledger, leveling calculator, streak tracker and
/// achievement evaluator. Holds no process-wide mutable state of its own;
/// everything lives behind the caller-supplied stores.
pub struct Progression {
    users: Arc<dyn UserStore>,
    ledger: XpLedger,
    relationships: Arc<dyn RelationshipStore>,
    evaluator: AchievementEvaluator,
    curve: LevelCurve,
    decay: DecayThresholds,
    max_commit_retries: u32,
}

impl Progression {
    pub fn new(
        config: &ProgressionConfig,
        users: Arc<dyn UserStore>,
        ledger: Arc<dyn LedgerStore>,
        achievements: Arc<dyn AchievementStore>,
        relationships: Arc<dyn RelationshipStore>,
    ) -> Result<Self> {
        config.decay.validate()?;
        Ok(Self {
            users,
            ledger: XpLedger::new(ledger),
            relationships,
            evaluator: AchievementEvaluator::new(config.catalog()?, achievements),
            curve: config.level_curve()?,
            decay: config.decay,
            max_commit_retries: config.max_commit_retries,
        })
    }

    /// Wire every collaborator to one in-memory store.
    pub fn with_memory_store(config: &ProgressionConfig, store: Arc<MemoryStore>) -> Result<Self> {
        Self::new(
            config,
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    /// Award XP for one activity. The only path permitted to mutate
    /// `total_xp`, streak state, or unlock records.
    pub async fn award_xp(
        &self,
        user_id: &UserId,
        amount: u64,
        source: XpSource,
        activity_date: NaiveDate,
    ) -> Result<ProgressionResult> {
        if amount == 0 {
            return Err(Error::validation("XP amount must be positive"));
        }

        let mut attempts = 0u32;
        let (before, level_up, streak) = loop {
            let user = self.users.get_user(user_id).await?;
            // Streak validation runs before any write, so an out-of-order
            // activity date rejects the whole award untouched.
            let streak = streaks::advance(user.streak.as_ref(), activity_date)?;
            let new_xp = user.total_xp.saturating_add(amount);
            let level_up = self.curve.detect_level_up(user.total_xp, new_xp);
            let progress = Progress {
                total_xp: new_xp,
                level: self.curve.level_for(new_xp),
                streak: Some(streak.clone()),
            };
            match self
                .users
                .update_progress(user_id, user.version, progress)
                .await
            {
                Ok(()) => break (user, level_up, streak),
                Err(err) if err.is_retryable() && attempts < self.max_commit_retries => {
                    attempts += 1;
                    debug!(user = %user_id, attempts, "progress commit conflicted, retrying");
                }
                Err(err) => return Err(err),
            }
        };

        if let Err(err) = self.ledger.append(user_id, amount, source).await {
            warn!(user = %user_id, %err, "ledger append failed, backing the award out");
            self.compensate_failed_award(&before, amount, &streak).await;
            return Err(err);
        }

        if let Some(up) = level_up {
            info!(
                user = %user_id,
                old_level = up.old_level,
                new_level = up.new_level,
                "level up"
            );
        }

        let snapshot = self.snapshot(user_id).await?;
        let new_achievements = self.evaluator.evaluate(user_id, &snapshot).await?;

        Ok(ProgressionResult {
            level_up,
            streak_count: streak.count,
            new_achievements,
        })
    }

    /// XP transaction history, most recent first.
    pub async fn history(&self, user_id: &UserId) -> Result<Vec<XpTransaction>> {
        self.ledger.history(user_id).await
    }

    /// Score one relationship for display. Read-only.
    pub async fn score_relationship(
        &self,
        id: &RelationshipId,
        now: DateTime<Utc>,
    ) -> Result<(Relationship, RelationshipScore)> {
        let rel = self.relationships.get_relationship(id).await?;
        let score = scoring::score(&rel, now, &self.decay)?;
        Ok((rel, score))
    }

    /// Score every tracked relationship of a user against `now`. Read-only.
    pub async fn score_relationships(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Relationship, RelationshipScore)>> {
        let rels = self.relationships.list_relationships(user_id).await?;
        let mut scored = Vec::with_capacity(rels.len());
        for rel in rels {
            let score = scoring::score(&rel, now, &self.decay)?;
            scored.push((rel, score));
        }
        Ok(scored)
    }

    /// Back a committed award out after its ledger append failed, so the
    /// transaction sum and `total_xp` agree again.
    ///
    /// Other awards may have committed between this award's progress write
    /// and the failed append, so a snapshot restore would clobber them.
    /// Instead the awarded amount is subtracted from the current total
    /// under the same versioned-write discipline as the commit itself. The
    /// streak reverts to its prior state only while the stored streak is
    /// still the one this award wrote; once a later writer moved it, it is
    /// theirs to keep.
    async fn compensate_failed_award(
        &self,
        before: &User,
        amount: u64,
        written_streak: &StreakState,
    ) {
        let mut attempts = 0u32;
        loop {
            let current = match self.users.get_user(&before.id).await {
                Ok(user) => user,
                Err(err) => {
                    error!(user = %before.id, %err, "compensation read failed, ledger and total_xp diverge");
                    return;
                }
            };
            let new_xp = current.total_xp.saturating_sub(amount);
            let streak = if current.streak.as_ref() == Some(written_streak) {
                before.streak.clone()
            } else {
                current.streak.clone()
            };
            let progress = Progress {
                total_xp: new_xp,
                level: self.curve.level_for(new_xp),
                streak,
            };
            match self
                .users
                .update_progress(&before.id, current.version, progress)
                .await
            {
                Ok(()) => return,
                Err(err) if err.is_retryable() && attempts < self.max_commit_retries => {
                    attempts += 1;
                    debug!(user = %before.id, attempts, "compensation conflicted, retrying");
                }
                Err(err) => {
                    error!(user = %before.id, %err, "compensation failed, ledger and total_xp diverge");
                    return;
                }
            }
        }
    }

    /// Aggregate the facts achievement criteria are evaluated against.
    async fn snapshot(&self, user_id: &UserId) -> Result<ProgressionSnapshot> {
        let user = self.users.get_user(user_id).await?;
        let transactions = self.ledger.history(user_id).await?;
        let rels = self.relationships.list_relationships(user_id).await?;

        let now = Utc::now();
        let mut top_simp_index = None;
        for rel in &rels {
            match scoring::score(rel, now, &self.decay) {
                Ok(score) => {
                    top_simp_index = top_simp_index.max(Some(score.simp_index));
                }
                Err(err) => {
                    // A malformed relationship must not sink the award.
                    warn!(relationship = %rel.id, %err, "skipping unscorable relationship");
                }
            }
        }

        Ok(ProgressionSnapshot {
            total_xp: user.total_xp,
            level: user.level,
            streak_count: user.streak_count(),
            transaction_count: transactions.len() as u64,
            relationship_count: rels.len() as u64,
            financial_total: rels.iter().map(|r| r.financial_total).sum(),
            top_simp_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn engine_with_user(id: &str) -> (Progression, Arc<MemoryStore>, UserId) {
        let store = Arc::new(MemoryStore::new());
        let user_id = UserId::new(id);
        store.insert_user(User::new(user_id.clone(), "Test"));
        let engine =
            Progression::with_memory_store(&ProgressionConfig::default(), store.clone()).unwrap();
        (engine, store, user_id)
    }

    #[tokio::test]
    async fn test_zero_amount_rejected_before_any_write() {
        let (engine, store, user_id) = engine_with_user("u1");
        let err = engine
            .award_xp(&user_id, 0, XpSource::Bonus, date("2026-08-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.transaction_count(), 0);
        assert_eq!(store.get_user(&user_id).await.unwrap().total_xp, 0);
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let (engine, _, _) = engine_with_user("u1");
        let err = engine
            .award_xp(&UserId::new("ghost"), 10, XpSource::Bonus, date("2026-08-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_out_of_order_date_leaves_state_unchanged() {
        let (engine, store, user_id) = engine_with_user("u1");
        engine
            .award_xp(&user_id, 10, XpSource::Bonus, date("2026-08-05"))
            .await
            .unwrap();

        let err = engine
            .award_xp(&user_id, 10, XpSource::Bonus, date("2026-08-04"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let user = store.get_user(&user_id).await.unwrap();
        assert_eq!(user.total_xp, 10);
        assert_eq!(store.transaction_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_append_rolls_back_progress() {
        let (engine, store, user_id) = engine_with_user("u1");
        engine
            .award_xp(&user_id, 10, XpSource::Bonus, date("2026-08-01"))
            .await
            .unwrap();

        store.fail_next_append();
        let err = engine
            .award_xp(&user_id, 90, XpSource::Bonus, date("2026-08-02"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store(_)));

        // Ledger sum and total_xp still agree; streak untouched.
        let user = store.get_user(&user_id).await.unwrap();
        assert_eq!(user.total_xp, 10);
        assert_eq!(user.level, 1);
        assert_eq!(user.streak_count(), 1);
        assert_eq!(store.transaction_count(), 1);
    }
}
