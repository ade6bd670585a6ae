//! Core data model for the progression engine.
//!
//! Users, XP transactions, streak state, relationships and unlock records.
//! XP transactions are immutable and append-only; the sum of a user's
//! transactions always equals that user's `total_xp`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque user identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque relationship identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationshipId(pub String);

impl RelationshipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Consecutive-day activity state, tracked per calendar date (never a
/// wall-clock instant), so repeated same-day registrations are no-ops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreakState {
    pub count: u32,
    pub last_activity: NaiveDate,
}

/// A tracked account. Progression fields (`total_xp`, `level`, `streak`)
/// are mutated only through the orchestrator; `version` is the
/// optimistic-concurrency token bumped by every progress write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub total_xp: u64,
    pub level: u32,
    pub streak: Option<StreakState>,
    pub version: u64,
}

impl User {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            total_xp: 0,
            level: 1,
            streak: None,
            version: 0,
        }
    }

    pub fn streak_count(&self) -> u32 {
        self.streak.as_ref().map(|s| s.count).unwrap_or(0)
    }
}

/// The progression fields of a user, written back as one atomic unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub total_xp: u64,
    pub level: u32,
    pub streak: Option<StreakState>,
}

/// Tag describing which activity earned the points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XpSource {
    InteractionLogged,
    SpendingLogged,
    TimeLogged,
    RatingLogged,
    Bonus,
}

impl std::fmt::Display for XpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InteractionLogged => write!(f, "interaction_logged"),
            Self::SpendingLogged => write!(f, "spending_logged"),
            Self::TimeLogged => write!(f, "time_logged"),
            Self::RatingLogged => write!(f, "rating_logged"),
            Self::Bonus => write!(f, "bonus"),
        }
    }
}

/// Immutable point-earning record. Created once, never edited or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XpTransaction {
    pub id: Uuid,
    pub user_id: UserId,
    /// Always positive; zero-amount awards are rejected up front.
    pub amount: u64,
    pub source: XpSource,
    pub recorded_at: DateTime<Utc>,
}

impl XpTransaction {
    pub fn new(user_id: UserId, amount: u64, source: XpSource) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount,
            source,
            recorded_at: Utc::now(),
        }
    }
}

/// Tracking status of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Active,
    Paused,
    Ended,
}

/// A tracked partner entity. `simp_index` and `decay_level` are derived on
/// every read (see `scoring`), never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub id: RelationshipId,
    pub user_id: UserId,
    pub name: String,
    /// Cumulative money spent, in whole currency units.
    pub financial_total: f64,
    /// Cumulative time invested, in hours.
    pub time_total_hours: f64,
    /// Self-reported intimacy rating, 1-10.
    pub intimacy_score: u8,
    pub last_updated_at: DateTime<Utc>,
    pub status: RelationshipStatus,
}

/// One-shot unlock marker. At most one per (user, achievement) pair, ever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRecord {
    pub user_id: UserId,
    pub achievement_key: String,
    pub unlocked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_starts_at_level_one() {
        let user = User::new(UserId::new("u1"), "Test");
        assert_eq!(user.total_xp, 0);
        assert_eq!(user.level, 1);
        assert_eq!(user.streak_count(), 0);
        assert_eq!(user.version, 0);
    }

    #[test]
    fn test_xp_source_serializes_snake_case() {
        let json = serde_json::to_string(&XpSource::SpendingLogged).unwrap();
        assert_eq!(json, "\"spending_logged\"");
    }
}
