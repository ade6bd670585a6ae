//! Leveling calculator: pure mapping from cumulative XP to level.
//!
//! Backed by a validated monotonic threshold table. Level 1 starts at 0 XP;
//! the table caps the maximum level, after which further XP never changes
//! the result.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Informational level-up notice. Never mutates anything itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    pub old_level: u32,
    pub new_level: u32,
    pub xp_gained: u64,
}

/// Monotonic XP-to-level threshold table.
///
/// `thresholds[n]` is the cumulative XP required for level `n + 1`, so the
/// table `[0, 100, 250]` means level 1 at 0 XP, level 2 at 100, level 3
/// (the cap) at 250.
#[derive(Debug, Clone)]
pub struct LevelCurve {
    thresholds: Vec<u64>,
}

impl LevelCurve {
    /// Build a curve from a threshold table. Rejects empty tables, tables
    /// not starting at 0, and tables that are not strictly increasing.
    pub fn new(thresholds: Vec<u64>) -> Result<Self> {
        if thresholds.is_empty() {
            return Err(Error::validation("level threshold table is empty"));
        }
        if thresholds[0] != 0 {
            return Err(Error::validation(format!(
                "level 1 threshold must be 0, got {}",
                thresholds[0]
            )));
        }
        for pair in thresholds.windows(2) {
            if pair[1] <= pair[0] {
                return Err(Error::validation(format!(
                    "level thresholds must be strictly increasing ({} then {})",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(Self { thresholds })
    }

    /// Highest reachable level.
    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// Greatest level `n` such that `threshold(n) <= total_xp`, capped at
    /// the maximum level.
    pub fn level_for(&self, total_xp: u64) -> u32 {
        self.thresholds
            .iter()
            .take_while(|&&t| t <= total_xp)
            .count() as u32
    }

    /// Compare levels before and after an award. Returns `None` when the
    /// award does not cross a threshold.
    pub fn detect_level_up(&self, old_xp: u64, new_xp: u64) -> Option<LevelUp> {
        let old_level = self.level_for(old_xp);
        let new_level = self.level_for(new_xp);
        if new_level == old_level {
            return None;
        }
        Some(LevelUp {
            old_level,
            new_level,
            xp_gained: new_xp.saturating_sub(old_xp),
        })
    }
}

impl Default for LevelCurve {
    /// Ten-level ladder with a widening gap per level.
    fn default() -> Self {
        Self {
            thresholds: vec![0, 100, 250, 500, 1000, 1750, 2750, 4000, 5500, 7500],
        }
    }
}
