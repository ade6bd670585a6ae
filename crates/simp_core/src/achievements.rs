//! Achievement evaluator: rule engine matching aggregate state against
//! unlock criteria.
//!
//! Definitions live in a catalog (configuration); unlock records live
//! behind the store's uniqueness constraint, so an achievement unlocks at
//! most once per user no matter how often or how concurrently evaluation
//! runs.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::UserId;
use crate::store::AchievementStore;

/// Aggregate facts criteria are evaluated against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressionSnapshot {
    pub total_xp: u64,
    pub level: u32,
    pub streak_count: u32,
    pub transaction_count: u64,
    pub relationship_count: u64,
    /// Money spent across all tracked relationships.
    pub financial_total: f64,
    /// Highest simp index among the user's relationships, if any scored.
    pub top_simp_index: Option<i64>,
}

/// Unlock predicate over a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    TotalXpAtLeast(u64),
    LevelAtLeast(u32),
    StreakAtLeast(u32),
    TransactionsAtLeast(u64),
    RelationshipsAtLeast(u64),
    FinancialTotalAtLeast(f64),
    SimpIndexAtLeast(i64),
}

impl Criterion {
    pub fn matches(&self, snapshot: &ProgressionSnapshot) -> bool {
        match self {
            Self::TotalXpAtLeast(n) => snapshot.total_xp >= *n,
            Self::LevelAtLeast(n) => snapshot.level >= *n,
            Self::StreakAtLeast(n) => snapshot.streak_count >= *n,
            Self::TransactionsAtLeast(n) => snapshot.transaction_count >= *n,
            Self::RelationshipsAtLeast(n) => snapshot.relationship_count >= *n,
            Self::FinancialTotalAtLeast(n) => snapshot.financial_total >= *n,
            Self::SimpIndexAtLeast(n) => snapshot.top_simp_index.is_some_and(|top| top >= *n),
        }
    }
}

/// One achievement definition. Higher priority sorts first in unlock
/// notifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    pub key: String,
    pub name: String,
    pub description: String,
    pub priority: u8,
    pub criterion: Criterion,
}

impl AchievementDef {
    fn new(key: &str, name: &str, description: &str, priority: u8, criterion: Criterion) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            priority,
            criterion,
        }
    }
}

/// Ordered achievement catalog with unique keys. Definition order breaks
/// priority ties in unlock notifications.
#[derive(Debug, Clone)]
pub struct AchievementCatalog {
    defs: Vec<AchievementDef>,
}

impl AchievementCatalog {
    pub fn new(defs: Vec<AchievementDef>) -> Result<Self> {
        let mut seen = HashSet::new();
        for def in &defs {
            if !seen.insert(def.key.as_str()) {
                return Err(Error::validation(format!(
                    "duplicate achievement key: {}",
                    def.key
                )));
            }
        }
        Ok(Self { defs })
    }

    /// Default catalog of milestone, streak, spending and devotion badges.
    pub fn standard() -> Self {
        Self {
            defs: vec![
                AchievementDef::new(
                    "first_tribute",
                    "First Tribute",
                    "Log your first point-earning activity",
                    1,
                    Criterion::TransactionsAtLeast(1),
                ),
                AchievementDef::new(
                    "level_5",
                    "Mid-Tier Devotee",
                    "Reach level 5",
                    3,
                    Criterion::LevelAtLeast(5),
                ),
                AchievementDef::new(
                    "level_10",
                    "Peak Devotion",
                    "Reach the level cap",
                    5,
                    Criterion::LevelAtLeast(10),
                ),
                AchievementDef::new(
                    "streak_7",
                    "Week of Worship",
                    "Maintain a 7-day activity streak",
                    3,
                    Criterion::StreakAtLeast(7),
                ),
                AchievementDef::new(
                    "streak_30",
                    "Monthly Martyr",
                    "Maintain a 30-day activity streak",
                    4,
                    Criterion::StreakAtLeast(30),
                ),
                AchievementDef::new(
                    "big_spender",
                    "Big Spender",
                    "Spend 1000 across tracked relationships",
                    4,
                    Criterion::FinancialTotalAtLeast(1000.0),
                ),
                AchievementDef::new(
                    "certified_simp",
                    "Certified Simp",
                    "Push a relationship's simp index past 100",
                    5,
                    Criterion::SimpIndexAtLeast(100),
                ),
                AchievementDef::new(
                    "collector",
                    "Portfolio Manager",
                    "Track 3 relationships at once",
                    2,
                    Criterion::RelationshipsAtLeast(3),
                ),
                AchievementDef::new(
                    "grinder",
                    "The Grind Never Stops",
                    "Log 100 point-earning activities",
                    2,
                    Criterion::TransactionsAtLeast(100),
                ),
                AchievementDef::new(
                    "xp_5000",
                    "Seasoned Simp",
                    "Accumulate 5000 XP",
                    3,
                    Criterion::TotalXpAtLeast(5000),
                ),
            ],
        }
    }

    pub fn defs(&self) -> &[AchievementDef] {
        &self.defs
    }
}

/// Evaluates the catalog against a snapshot and records unlocks.
pub struct AchievementEvaluator {
    catalog: AchievementCatalog,
    store: Arc<dyn AchievementStore>,
}

impl AchievementEvaluator {
    pub fn new(catalog: AchievementCatalog, store: Arc<dyn AchievementStore>) -> Self {
        Self { catalog, store }
    }

    /// Return the achievements unlocked *by this call*, sorted by
    /// descending priority, ties broken by catalog order.
    ///
    /// Already-unlocked achievements are skipped; a concurrent evaluation
    /// that loses the insert race simply omits the achievement from its
    /// result. Calling twice with unchanged state returns an empty list
    /// the second time.
    pub async fn evaluate(
        &self,
        user_id: &UserId,
        snapshot: &ProgressionSnapshot,
    ) -> Result<Vec<AchievementDef>> {
        let already: HashSet<String> = self
            .store
            .list_unlocked(user_id)
            .await?
            .into_iter()
            .map(|record| record.achievement_key)
            .collect();

        let mut unlocked: Vec<(usize, AchievementDef)> = Vec::new();
        for (index, def) in self.catalog.defs().iter().enumerate() {
            if already.contains(&def.key) || !def.criterion.matches(snapshot) {
                continue;
            }
            // First writer wins; losing the race is a silent no-op.
            if self.store.insert_unlock_if_absent(user_id, &def.key).await? {
                info!(user = %user_id, achievement = %def.key, "achievement unlocked");
                unlocked.push((index, def.clone()));
            }
        }

        unlocked.sort_by(|(ia, a), (ib, b)| b.priority.cmp(&a.priority).then(ia.cmp(ib)));
        Ok(unlocked.into_iter().map(|(_, def)| def).collect())
    }
}
