// Manual obstacle layouts on disk
// JSON documents with a format version, written atomically.

use serde::{Deserialize, Serialize};
use std::fs::{rename, File};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::env::Environment;
use crate::geometry::{GridSize, Tile};
use crate::obstacles::ObstacleField;

pub const LAYOUT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Version mismatch: found {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Layout is {found}, environment is {expected}")]
    SizeMismatch { found: GridSize, expected: GridSize },

    #[error("Tile {0} is outside the layout grid")]
    TileOutOfBounds(Tile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleLayout {
    pub version: u32,
    pub width: i32,
    pub height: i32,
    pub tiles: Vec<Tile>,
}

impl ObstacleLayout {
    pub fn new(size: GridSize, tiles: Vec<Tile>) -> Self {
        Self { version: LAYOUT_VERSION, width: size.width, height: size.height, tiles }
    }

    /// The manual layout currently held by `env`.
    pub fn from_env(env: &Environment) -> Self {
        Self::new(env.size(), env.manual_obstacles().iter().collect())
    }

    pub fn size(&self) -> GridSize {
        GridSize { width: self.width, height: self.height }
    }

    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.version != LAYOUT_VERSION {
            return Err(LayoutError::VersionMismatch { found: self.version, expected: LAYOUT_VERSION });
        }
        let size = self.size();
        if let Some(t) = self.tiles.iter().find(|t| !size.in_bounds(**t)) {
            return Err(LayoutError::TileOutOfBounds(*t));
        }
        Ok(())
    }

    /// Install as the manual layout of `env`. Sizes must match.
    pub fn apply(&self, env: &mut Environment) -> Result<(), LayoutError> {
        self.validate()?;
        if self.size() != env.size() {
            return Err(LayoutError::SizeMismatch { found: self.size(), expected: env.size() });
        }
        env.set_manual_layout(self.tiles.iter().copied().collect::<ObstacleField>());
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), LayoutError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_vec_pretty(self)?;

        // Atomic save: write to temp file, then rename
        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.flush()?;
            file.sync_all()?;
        }
        rename(&temp_path, path)?;

        log::debug!("Saved layout with {} tiles to {:?}", self.tiles.len(), path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        if !path.exists() {
            return Err(LayoutError::FileNotFound { path: path.display().to_string() });
        }
        let text = std::fs::read_to_string(path)?;
        let layout: Self = serde_json::from_str(&text)?;
        layout.validate()?;

        log::debug!("Loaded layout with {} tiles from {:?}", layout.tiles.len(), path);
        Ok(layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EnvConfig;
    use tempfile::tempdir;

    fn size() -> GridSize {
        GridSize::new(5, 5).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("layouts").join("wall.json");
        let layout = ObstacleLayout::new(size(), vec![Tile::new(1, 2), Tile::new(2, 2)]);

        layout.save(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        let loaded = ObstacleLayout::load(&path).unwrap();
        assert_eq!(loaded, layout);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = ObstacleLayout::load(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, LayoutError::FileNotFound { .. }));
    }

    #[test]
    fn test_apply_checks_size() {
        let mut env = Environment::new(EnvConfig::manual(6, 6)).unwrap();
        let layout = ObstacleLayout::new(size(), vec![Tile::new(1, 1)]);
        assert!(matches!(layout.apply(&mut env), Err(LayoutError::SizeMismatch { .. })));
    }

    #[test]
    fn test_apply_then_reset_uses_layout() {
        let mut env = Environment::new(EnvConfig::manual(5, 5)).unwrap();
        ObstacleLayout::new(size(), vec![Tile::new(3, 3)]).apply(&mut env).unwrap();

        env.reset().unwrap();
        assert!(env.obstacles().contains(Tile::new(3, 3)));
        assert_eq!(ObstacleLayout::from_env(&env).tiles, vec![Tile::new(3, 3)]);
    }

    #[test]
    fn test_rejects_wrong_version_and_bad_tiles() {
        let mut layout = ObstacleLayout::new(size(), vec![Tile::new(7, 0)]);
        assert!(matches!(layout.validate(), Err(LayoutError::TileOutOfBounds(_))));
        layout.version = 2;
        assert!(matches!(layout.validate(), Err(LayoutError::VersionMismatch { .. })));
    }
}
