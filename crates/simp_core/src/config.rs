//! Engine configuration.
//!
//! Level thresholds, decay boundaries, the commit retry budget and an
//! optional achievement catalog override. Loadable from a TOML file; every
//! field has a default so an empty file is a valid config.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::achievements::{AchievementCatalog, AchievementDef};
use crate::leveling::LevelCurve;
use crate::scoring::DecayThresholds;

fn default_level_thresholds() -> Vec<u64> {
    vec![0, 100, 250, 500, 1000, 1750, 2750, 4000, 5500, 7500]
}

fn default_max_commit_retries() -> u32 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// Cumulative XP required for each level, starting at level 1 = 0.
    #[serde(default = "default_level_thresholds")]
    pub level_thresholds: Vec<u64>,

    /// Day boundaries for the relationship decay buckets.
    #[serde(default)]
    pub decay: DecayThresholds,

    /// How many times an award retries its commit after a version conflict
    /// before surfacing the failure.
    #[serde(default = "default_max_commit_retries")]
    pub max_commit_retries: u32,

    /// Replacement achievement catalog; `None` uses the standard one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<AchievementDef>>,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            level_thresholds: default_level_thresholds(),
            decay: DecayThresholds::default(),
            max_commit_retries: default_max_commit_retries(),
            achievements: None,
        }
    }
}

impl ProgressionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Validated level curve from the configured thresholds.
    pub fn level_curve(&self) -> crate::error::Result<LevelCurve> {
        LevelCurve::new(self.level_thresholds.clone())
    }

    /// Configured catalog, or the standard one when not overridden.
    pub fn catalog(&self) -> crate::error::Result<AchievementCatalog> {
        match &self.achievements {
            Some(defs) => AchievementCatalog::new(defs.clone()),
            None => Ok(AchievementCatalog::standard()),
        }
    }
}
