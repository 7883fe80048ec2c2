use thiserror::Error;

use crate::geometry::Tile;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("Invalid action: {0} (expected 0..=3)")]
    InvalidAction(i64),

    #[error("Invalid grid size: {width}x{height}")]
    InvalidGridSize { width: i32, height: i32 },

    #[error("Grid {width}x{height} is too small for obstacle generation (need at least 4x5)")]
    GridTooSmall { width: i32, height: i32 },

    #[error("Episode already finished; call reset() before stepping again")]
    EpisodeFinished,

    #[error("Episode not started; call reset() first")]
    NotStarted,

    #[error("Command {command} is not accepted in {state} state")]
    UnexpectedCommand { command: String, state: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Tile {0} is outside the grid")]
    OutOfGrid(Tile),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config IO error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(String),
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        GridError::ConfigParse(err.to_string())
    }
}

impl From<serde_yaml::Error> for GridError {
    fn from(err: serde_yaml::Error) -> Self {
        GridError::ConfigParse(err.to_string())
    }
}

impl GridError {
    /// Errors the driver can recover from by calling `reset()`.
    pub fn needs_reset(&self) -> bool {
        matches!(self, GridError::EpisodeFinished | GridError::NotStarted)
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
