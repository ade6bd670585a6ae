//! Relationship scorer: Simp Index and decay classification.
//!
//! Both outputs are pure functions of the relationship's current attributes
//! and the caller-supplied "now"; they are recomputed on every read and
//! never cached.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Relationship;

/// Weight applied to invested hours when combined with money spent.
const TIME_WEIGHT: f64 = 20.0;

/// Staleness classification of a relationship. Buckets only ever move
/// forward (`Active` to `Rust` to `Cobweb`) as elapsed time grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecayLevel {
    Active,
    Rust,
    Cobweb,
}

impl std::fmt::Display for DecayLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Rust => write!(f, "rust"),
            Self::Cobweb => write!(f, "cobweb"),
        }
    }
}

/// Day boundaries for the decay buckets. Configuration, not constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DecayThresholds {
    /// Days of silence before a relationship shows rust.
    #[serde(default = "default_rust_after_days")]
    pub rust_after_days: i64,
    /// Days of silence before cobwebs take over.
    #[serde(default = "default_cobweb_after_days")]
    pub cobweb_after_days: i64,
}

fn default_rust_after_days() -> i64 {
    7
}

fn default_cobweb_after_days() -> i64 {
    30
}

impl Default for DecayThresholds {
    fn default() -> Self {
        Self {
            rust_after_days: default_rust_after_days(),
            cobweb_after_days: default_cobweb_after_days(),
        }
    }
}

impl DecayThresholds {
    pub fn validate(&self) -> Result<()> {
        if self.rust_after_days <= 0 || self.cobweb_after_days <= self.rust_after_days {
            return Err(Error::validation(format!(
                "decay thresholds must satisfy 0 < rust ({}) < cobweb ({})",
                self.rust_after_days, self.cobweb_after_days
            )));
        }
        Ok(())
    }

    /// Classify an elapsed number of days since last update.
    pub fn classify(&self, elapsed_days: i64) -> DecayLevel {
        if elapsed_days < self.rust_after_days {
            DecayLevel::Active
        } else if elapsed_days < self.cobweb_after_days {
            DecayLevel::Rust
        } else {
            DecayLevel::Cobweb
        }
    }
}

/// Derived score for one relationship.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelationshipScore {
    /// Investment-to-intimacy ratio, rounded to the nearest integer.
    pub simp_index: i64,
    pub decay: DecayLevel,
}

/// Score one relationship against `now`.
///
/// `simp_index = (financial_total + time_total_hours * 20) / intimacy`,
/// with the denominator clamped to 1 so an unrated (zero) intimacy score
/// never divides by zero. Malformed attributes are rejected up front.
pub fn score(
    rel: &Relationship,
    now: DateTime<Utc>,
    thresholds: &DecayThresholds,
) -> Result<RelationshipScore> {
    if !rel.financial_total.is_finite() || rel.financial_total < 0.0 {
        return Err(Error::validation(format!(
            "financial_total must be a non-negative number, got {}",
            rel.financial_total
        )));
    }
    if !rel.time_total_hours.is_finite() || rel.time_total_hours < 0.0 {
        return Err(Error::validation(format!(
            "time_total_hours must be a non-negative number, got {}",
            rel.time_total_hours
        )));
    }
    if rel.intimacy_score > 10 {
        return Err(Error::validation(format!(
            "intimacy_score must be at most 10, got {}",
            rel.intimacy_score
        )));
    }

    let denominator = rel.intimacy_score.max(1) as f64;
    let raw = (rel.financial_total + rel.time_total_hours * TIME_WEIGHT) / denominator;
    let simp_index = raw.round() as i64;

    let elapsed_days = now
        .signed_duration_since(rel.last_updated_at)
        .num_days()
        .max(0);

    Ok(RelationshipScore {
        simp_index,
        decay: thresholds.classify(elapsed_days),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RelationshipId, RelationshipStatus, UserId};
    use chrono::Duration;

    fn rel(financial: f64, hours: f64, intimacy: u8, updated: DateTime<Utc>) -> Relationship {
        Relationship {
            id: RelationshipId::new("r1"),
            user_id: UserId::new("u1"),
            name: "Alex".to_string(),
            financial_total: financial,
            time_total_hours: hours,
            intimacy_score: intimacy,
            last_updated_at: updated,
            status: RelationshipStatus::Active,
        }
    }

    #[test]
    fn test_simp_index_exact_fixture() {
        let now = Utc::now();
        let scored = score(&rel(45.0, 3.0, 3, now), now, &DecayThresholds::default()).unwrap();
        // (45 + 3*20) / 3 = 35
        assert_eq!(scored.simp_index, 35);
    }

    #[test]
    fn test_simp_index_rounded_fixture() {
        let now = Utc::now();
        let scored = score(&rel(120.0, 10.0, 7, now), now, &DecayThresholds::default()).unwrap();
        // (120 + 200) / 7 = 45.71 -> 46
        assert_eq!(scored.simp_index, 46);
    }

    #[test]
    fn test_zero_intimacy_clamps_denominator() {
        let now = Utc::now();
        let scored = score(&rel(50.0, 0.0, 0, now), now, &DecayThresholds::default()).unwrap();
        assert_eq!(scored.simp_index, 50);
    }

    #[test]
    fn test_malformed_attributes_rejected() {
        let now = Utc::now();
        let thresholds = DecayThresholds::default();
        assert!(score(&rel(-1.0, 0.0, 5, now), now, &thresholds).is_err());
        assert!(score(&rel(0.0, f64::NAN, 5, now), now, &thresholds).is_err());
        assert!(score(&rel(0.0, 0.0, 11, now), now, &thresholds).is_err());
    }

    #[test]
    fn test_decay_buckets_move_forward_only() {
        let thresholds = DecayThresholds::default();
        let now = Utc::now();
        let mut last = DecayLevel::Active;
        for days in 0..60 {
            let r = rel(10.0, 1.0, 5, now - Duration::days(days));
            let decay = score(&r, now, &thresholds).unwrap().decay;
            assert!(decay >= last, "decay moved backwards at day {}", days);
            last = decay;
        }
        assert_eq!(last, DecayLevel::Cobweb);
    }

    #[test]
    fn test_decay_boundaries_are_configurable() {
        let thresholds = DecayThresholds {
            rust_after_days: 2,
            cobweb_after_days: 4,
        };
        assert_eq!(thresholds.classify(0), DecayLevel::Active);
        assert_eq!(thresholds.classify(1), DecayLevel::Active);
        assert_eq!(thresholds.classify(2), DecayLevel::Rust);
        assert_eq!(thresholds.classify(3), DecayLevel::Rust);
        assert_eq!(thresholds.classify(4), DecayLevel::Cobweb);
    }

    #[test]
    fn test_future_timestamp_counts_as_active() {
        let now = Utc::now();
        let r = rel(10.0, 1.0, 5, now + Duration::days(2));
        let scored = score(&r, now, &DecayThresholds::default()).unwrap();
        assert_eq!(scored.decay, DecayLevel::Active);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(DecayThresholds::default().validate().is_ok());
        let bad = DecayThresholds {
            rust_after_days: 30,
            cobweb_after_days: 7,
        };
        assert!(bad.validate().is_err());
    }
}
