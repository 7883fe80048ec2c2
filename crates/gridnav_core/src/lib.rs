//! # gridnav_core - Grid-World Navigation Simulation Engine
//!
//! Turn-based environment for training and driving an agent that walks from
//! the bottom row of a grid to row 0 while avoiding obstacles.
//!
//! ## Features
//! - Deterministic obstacle generation (same seed = same layouts)
//! - `reset()` / `step(action)` / `observe()` contract for any agent
//! - Manual layout editing through a command queue
//! - Transport-agnostic remote session protocol with stuck detection
//!
//! ```rust
//! use gridnav_core::{Action, EnvConfig, Environment};
//!
//! let mut env = Environment::new(EnvConfig::manual(5, 5)).unwrap();
//! env.reset().unwrap();
//! let t = env.step(Action::Up).unwrap();
//! assert_eq!(t.info.coords.y, 3);
//! ```

// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]

pub mod config;
pub mod env;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod observation;
pub mod obstacles;
pub mod player;
pub mod session;
pub mod setup;

pub use config::{EnvConfig, Mode, ObstacleConfig, RewardConfig};
pub use env::{Environment, EpisodePhase, StepInfo, Transition};
pub use error::{GridError, Result};
pub use geometry::{GridSize, Tile};
pub use layout::{LayoutError, ObstacleLayout};
pub use observation::{observation_len, Observation, ObservationEncoder};
pub use obstacles::ObstacleField;
pub use player::{Action, MoveRule, PlayerState};
pub use session::{Inbound, Outbound, Policy, RemoteSession, ScriptedPolicy, Status};
pub use setup::{Command, SetupController, SetupState};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
