//! Grid geometry
//!
//! Pure coordinate math over an implicit `width × height` grid:
//! - Row 0 is the goal row, the player starts on the bottom row
//! - Tiles are signed so moves and the observation window can leave the grid
//! - No cell objects; the grid is only its size

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{GridError, Result};
use crate::obstacles::ObstacleField;

/// A grid coordinate `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

impl From<(i32, i32)> for Tile {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl From<Tile> for (i32, i32) {
    fn from(t: Tile) -> Self {
        (t.x, t.y)
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Largest observation window, in cells, a grid may produce.
pub const MAX_WINDOW_CELLS: u64 = 1 << 24;

/// Grid dimensions in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSize {
    pub width: i32,
    pub height: i32,
}

impl GridSize {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(GridError::InvalidGridSize { width, height });
        }
        let size = Self { width, height };
        if size.window_cells() > MAX_WINDOW_CELLS {
            return Err(GridError::InvalidGridSize { width, height });
        }
        Ok(size)
    }

    /// Cells in the `(2w+1) × (2h+1)` observation window.
    #[inline]
    pub fn window_cells(&self) -> u64 {
        let cols = 2 * self.width.max(0) as u64 + 1;
        let rows = 2 * self.height.max(0) as u64 + 1;
        cols.saturating_mul(rows)
    }

    /// `0 <= x <= width-1` and `0 <= y <= height-1`.
    #[inline]
    pub fn in_bounds(&self, tile: Tile) -> bool {
        (0..self.width).contains(&tile.x) && (0..self.height).contains(&tile.y)
    }

    /// Blocked for the purposes of observation.
    ///
    /// Unlike [`GridSize::in_bounds`] there is no lower bound on `y`: tiles
    /// above the goal row read as open space.
    #[inline]
    pub fn is_obstacle_or_oob(&self, tile: Tile, obstacles: &ObstacleField) -> bool {
        tile.x < 0 || tile.x > self.width - 1 || tile.y > self.height - 1 || obstacles.contains(tile)
    }

    /// Bottom-centre tile where every episode begins.
    #[inline]
    pub fn start_tile(&self) -> Tile {
        Tile::new(self.width / 2, self.height - 1)
    }

    /// Inclusive straight-line span between two tiles sharing a column
    /// (first) or a row. Empty when they share neither.
    pub fn tiles_between(a: Tile, b: Tile) -> Vec<Tile> {
        if a.x == b.x {
            (a.y.min(b.y)..=a.y.max(b.y)).map(|y| Tile::new(a.x, y)).collect()
        } else if a.y == b.y {
            (a.x.min(b.x)..=a.x.max(b.x)).map(|x| Tile::new(x, a.y)).collect()
        } else {
            Vec::new()
        }
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size() -> GridSize {
        GridSize::new(5, 5).unwrap()
    }

    #[test]
    fn test_rejects_non_positive_size() {
        assert!(GridSize::new(0, 5).is_err());
        assert!(GridSize::new(5, -1).is_err());
    }

    #[test]
    fn test_rejects_size_with_oversized_window() {
        let err = GridSize::new(40_000, 40_000).unwrap_err();
        assert!(matches!(err, GridError::InvalidGridSize { width: 40_000, height: 40_000 }));
        assert!(GridSize::new(i32::MAX, 1).is_err());

        let wide = GridSize::new(2047, 2047).unwrap();
        assert_eq!(wide.window_cells(), 4095 * 4095);
    }

    #[test]
    fn test_in_bounds_edges() {
        let s = size();
        assert!(s.in_bounds(Tile::new(0, 0)));
        assert!(s.in_bounds(Tile::new(4, 4)));
        assert!(!s.in_bounds(Tile::new(5, 0)));
        assert!(!s.in_bounds(Tile::new(0, -1)));
        assert!(!s.in_bounds(Tile::new(-1, 2)));
    }

    #[test]
    fn test_negative_y_is_open_space() {
        let s = size();
        let empty = ObstacleField::new();
        assert!(!s.is_obstacle_or_oob(Tile::new(2, -3), &empty));
        assert!(s.is_obstacle_or_oob(Tile::new(2, 5), &empty));
        assert!(s.is_obstacle_or_oob(Tile::new(-1, 2), &empty));
        assert!(s.is_obstacle_or_oob(Tile::new(5, 2), &empty));
    }

    #[test]
    fn test_obstacle_membership_blocks() {
        let s = size();
        let mut field = ObstacleField::new();
        field.add(Tile::new(1, 1));
        assert!(s.is_obstacle_or_oob(Tile::new(1, 1), &field));
        assert!(!s.is_obstacle_or_oob(Tile::new(1, 2), &field));
    }

    #[test]
    fn test_start_tile_is_bottom_centre() {
        assert_eq!(size().start_tile(), Tile::new(2, 4));
        assert_eq!(GridSize::new(10, 8).unwrap().start_tile(), Tile::new(5, 7));
    }

    #[test]
    fn test_tiles_between() {
        let col = GridSize::tiles_between(Tile::new(3, 5), Tile::new(3, 2));
        assert_eq!(col, vec![Tile::new(3, 2), Tile::new(3, 3), Tile::new(3, 4), Tile::new(3, 5)]);

        let row = GridSize::tiles_between(Tile::new(4, 1), Tile::new(2, 1));
        assert_eq!(row.len(), 3);

        assert!(GridSize::tiles_between(Tile::new(0, 0), Tile::new(1, 1)).is_empty());
    }
}
