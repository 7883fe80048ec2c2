//! Obstacle field
//!
//! Owns the blocked tiles of one environment. Entries keep insertion order
//! (for renderers and layout files) and an occurrence count per tile so that
//! membership is O(1).
//!
//! `add` does not deduplicate. Membership-checked edits (`insert`, `toggle`,
//! `smart_add`) keep at most one entry per tile; the procedural generator
//! deliberately does not, so overlapping draws stack up.

use fxhash::{FxHashMap, FxHashSet};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::geometry::{GridSize, Tile};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Tile>", into = "Vec<Tile>")]
pub struct ObstacleField {
    tiles: Vec<Tile>,
    counts: FxHashMap<Tile, u32>,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `tile`, even if it is already present.
    pub fn add(&mut self, tile: Tile) {
        self.tiles.push(tile);
        *self.counts.entry(tile).or_insert(0) += 1;
    }

    /// Add `tile` only if absent. Returns whether it was added.
    pub fn insert(&mut self, tile: Tile) -> bool {
        if self.contains(tile) {
            return false;
        }
        self.add(tile);
        true
    }

    /// Remove one occurrence of `tile`. Absent tiles are a no-op returning `false`.
    pub fn remove(&mut self, tile: Tile) -> bool {
        let Some(count) = self.counts.get_mut(&tile) else {
            return false;
        };
        *count -= 1;
        if *count == 0 {
            self.counts.remove(&tile);
        }
        if let Some(idx) = self.tiles.iter().position(|t| *t == tile) {
            self.tiles.remove(idx);
        }
        true
    }

    #[inline]
    pub fn contains(&self, tile: Tile) -> bool {
        self.counts.contains_key(&tile)
    }

    /// Remove if present, else add. Returns whether `tile` is blocked afterwards.
    pub fn toggle(&mut self, tile: Tile) -> bool {
        if self.remove(tile) {
            false
        } else {
            self.add(tile);
            true
        }
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.counts.clear();
    }

    /// Number of entries, counting repeated tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Tile> + '_ {
        self.tiles.iter().copied()
    }

    /// Unique tiles in first-insertion order.
    pub fn distinct(&self) -> Vec<Tile> {
        let mut seen = FxHashSet::default();
        self.tiles.iter().copied().filter(|t| seen.insert(*t)).collect()
    }

    /// Scatter `count ∈ [min_count, max_count]` adjacent obstacle pairs.
    ///
    /// One side is drawn for the whole call and shifts the anchor column
    /// range: `[1, w-3]` for side 1, `[2, w-2]` for side 0. Anchor rows are
    /// `[2, h-3]`. The second tile of each pair lands right, below or left of
    /// the anchor and is not clamped.
    ///
    /// Returns the number of pairs placed.
    pub fn generate<R: Rng + ?Sized>(
        &mut self,
        min_count: u32,
        max_count: u32,
        size: GridSize,
        rng: &mut R,
    ) -> Result<u32> {
        if size.width < 4 || size.height < 5 {
            return Err(GridError::GridTooSmall { width: size.width, height: size.height });
        }
        let max_count = max_count.max(min_count);
        let count = rng.gen_range(min_count..=max_count);
        let side = rng.gen_range(0..=1);

        for _ in 0..count {
            let x = if side == 1 {
                rng.gen_range(1..=size.width - 3)
            } else {
                rng.gen_range(2..=size.width - 2)
            };
            let y = rng.gen_range(2..=size.height - 3);
            let anchor = Tile::new(x, y);
            self.add(anchor);

            let second = match rng.gen_range(1..=3) {
                1 => anchor.offset(1, 0),
                2 => anchor.offset(0, 1),
                _ => anchor.offset(-1, 0),
            };
            self.add(second);
        }

        tracing::debug!(count, side, entries = self.len(), "generated obstacles");
        Ok(count)
    }

    /// Clear the straight path between `player` and `tile` along a shared
    /// column, then along a shared row, then add `tile` if it lies inside
    /// the grid. The two clears are independent: when `tile == player`
    /// that tile loses one occurrence per pass.
    ///
    /// Returns whether `tile` was added.
    pub fn smart_add(&mut self, tile: Tile, player: Tile, size: GridSize) -> bool {
        let passes = [player.x == tile.x, player.y == tile.y];
        for _ in passes.iter().filter(|aligned| **aligned) {
            for t in GridSize::tiles_between(player, tile) {
                self.remove(t);
            }
        }
        if size.in_bounds(tile) {
            self.add(tile);
            true
        } else {
            false
        }
    }
}

impl From<Vec<Tile>> for ObstacleField {
    fn from(tiles: Vec<Tile>) -> Self {
        let mut field = Self::new();
        for t in tiles {
            field.add(t);
        }
        field
    }
}

impl From<ObstacleField> for Vec<Tile> {
    fn from(field: ObstacleField) -> Self {
        field.tiles
    }
}

impl FromIterator<Tile> for ObstacleField {
    fn from_iter<I: IntoIterator<Item = Tile>>(iter: I) -> Self {
        let mut field = Self::new();
        for t in iter {
            field.add(t);
        }
        field
    }
}

impl PartialEq for ObstacleField {
    fn eq(&self, other: &Self) -> bool {
        self.tiles == other.tiles
    }
}
