//! # Environment Configuration
//!
//! Every tunable of the simulation lives here: grid size, obstacle density,
//! reward shaping and episode strictness.
//!
//! ## Presets
//! - `EnvConfig::default()` — 10x10, ten obstacle pairs per episode
//! - `EnvConfig::sparse()` — fewer obstacles, same rewards
//! - `EnvConfig::dense()` — more obstacles on a larger grid
//!
//! ## Usage
//! ```rust
//! use gridnav_core::config::EnvConfig;
//!
//! let config = EnvConfig::from_json_str(r#"{ "width": 7, "height": 9 }"#).unwrap();
//! assert_eq!(config.obstacles.min_count, 10);
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{GridError, Result};
use crate::geometry::{GridSize, Tile};
use crate::player::MoveRule;

/// How obstacles are produced on `reset()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Regenerated procedurally every episode.
    #[default]
    Random,
    /// Replayed from the layout edited during setup.
    Manual,
}

impl std::str::FromStr for Mode {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Mode::Random),
            "manual" => Ok(Mode::Manual),
            other => Err(GridError::InvalidConfig(format!("unknown mode '{}'", other))),
        }
    }
}

/// Procedural generator settings. Counts are obstacle pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub min_count: u32,
    pub max_count: u32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self { min_count: 10, max_count: 10 }
    }
}

/// Reward shaping, checked in priority order: win, loss, stand-still,
/// then by the action taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reaching row 0 (default: 50)
    pub win: i32,
    /// Leaving the grid or hitting an obstacle (default: -100)
    pub loss: i32,
    /// Move that left the player in place (default: -50)
    pub stand_still: i32,
    /// Moving up earns `up_scale * (height - y)` (default: 1)
    pub up_scale: i32,
    /// Moving down (default: -2)
    pub down: i32,
    /// Moving left or right (default: -1)
    pub sideways: i32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self { win: 50, loss: -100, stand_still: -50, up_scale: 1, down: -2, sideways: -1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub width: i32,
    pub height: i32,
    pub mode: Mode,
    /// Fixed seed for reproducible obstacle layouts. `None` draws from entropy.
    pub seed: Option<u64>,
    pub obstacles: ObstacleConfig,
    pub rewards: RewardConfig,
    pub move_rule: MoveRule,
    /// Reject `step` before the first `reset` or after a terminal step.
    pub strict_episodes: bool,
    /// Initial manual layout.
    pub manual_layout: Vec<Tile>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 10,
            mode: Mode::Random,
            seed: None,
            obstacles: ObstacleConfig::default(),
            rewards: RewardConfig::default(),
            move_rule: MoveRule::Free,
            strict_episodes: true,
            manual_layout: Vec::new(),
        }
    }
}

impl EnvConfig {
    pub fn sparse() -> Self {
        let mut cfg = Self::default();
        cfg.obstacles = ObstacleConfig { min_count: 3, max_count: 6 };
        cfg
    }

    pub fn dense() -> Self {
        let mut cfg = Self::default();
        cfg.width = 14;
        cfg.height = 14;
        cfg.obstacles = ObstacleConfig { min_count: 18, max_count: 24 };
        cfg
    }

    /// Manual mode on an empty layout.
    pub fn manual(width: i32, height: i32) -> Self {
        let mut cfg = Self::default();
        cfg.width = width;
        cfg.height = height;
        cfg.mode = Mode::Manual;
        cfg
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn size(&self) -> Result<GridSize> {
        GridSize::new(self.width, self.height)
    }

    pub fn validate(&self) -> Result<()> {
        let size = self.size()?;
        if self.mode == Mode::Random && (size.width < 4 || size.height < 5) {
            return Err(GridError::InvalidConfig(format!(
                "random mode needs at least a 4x5 grid, got {}",
                size
            )));
        }
        if self.obstacles.max_count < self.obstacles.min_count {
            tracing::warn!(
                min = self.obstacles.min_count,
                max = self.obstacles.max_count,
                "obstacles.max_count below min_count, generator will use min_count"
            );
        }
        if let Some(t) = self.manual_layout.iter().find(|t| !size.in_bounds(**t)) {
            return Err(GridError::InvalidConfig(format!("manual layout tile {} outside {}", t, size)));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load by file extension: `.yaml`/`.yml` as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            _ => Self::from_json_str(&text),
        }
    }
}
