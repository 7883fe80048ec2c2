//! Observation encoding
//!
//! Layout of the vector handed to agents:
//!
//! ```text
//! [ window (2w+1)*(2h+1) | action code (2) | x | y ]
//! ```
//!
//! The window is a binary occupancy grid centred on the player, row-major,
//! and reaches past the grid on every side. Off-grid tiles left, right and
//! below read as blocked; tiles above the goal row read as open.

use serde::{Deserialize, Serialize};

use crate::error::GridError;
use crate::geometry::{GridSize, Tile};
use crate::obstacles::ObstacleField;
use crate::player::PlayerState;

/// Shortest possible observation: a 1x1 grid.
const MIN_OBSERVATION_LEN: usize = 9 + 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Vec<i32>", try_from = "Vec<i32>")]
pub struct Observation(Vec<i32>);

impl Observation {
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<i32> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Occupancy window portion.
    pub fn window(&self) -> &[i32] {
        &self.0[..self.0.len().saturating_sub(4)]
    }

    pub fn action_code(&self) -> [i32; 2] {
        let n = self.0.len();
        [self.0[n - 4], self.0[n - 3]]
    }

    pub fn coords(&self) -> Tile {
        let n = self.0.len();
        Tile::new(self.0[n - 2], self.0[n - 1])
    }
}

impl TryFrom<Vec<i32>> for Observation {
    type Error = GridError;

    fn try_from(data: Vec<i32>) -> Result<Self, Self::Error> {
        if data.len() < MIN_OBSERVATION_LEN {
            return Err(GridError::InvalidPayload(format!(
                "observation of length {} is shorter than {}",
                data.len(),
                MIN_OBSERVATION_LEN
            )));
        }
        Ok(Self(data))
    }
}

impl From<Observation> for Vec<i32> {
    fn from(obs: Observation) -> Self {
        obs.0
    }
}

/// Total observation length for `size`.
#[inline]
pub fn observation_len(size: GridSize) -> usize {
    window_len(size) + 4
}

#[inline]
fn window_len(size: GridSize) -> usize {
    size.window_cells() as usize
}

pub struct ObservationEncoder;

impl ObservationEncoder {
    pub fn encode(size: GridSize, obstacles: &ObstacleField, player: &PlayerState) -> Observation {
        let mut data = Self::window(size, obstacles, player.coords());
        data.reserve(4);
        data.extend_from_slice(&player.last_action().code());
        let coords = player.coords();
        data.push(coords.x);
        data.push(coords.y);
        Observation(data)
    }

    /// Occupancy of every tile within `width` columns and `height` rows of `center`.
    pub fn window(size: GridSize, obstacles: &ObstacleField, center: Tile) -> Vec<i32> {
        let cols = 2 * size.width + 1;
        let rows = 2 * size.height + 1;
        let mut cells = vec![0; window_len(size)];

        for j in 0..rows {
            for i in 0..cols {
                let tile = Tile::new(center.x - size.width + i, center.y - size.height + j);
                if size.is_obstacle_or_oob(tile, obstacles) {
                    cells[j as usize * cols as usize + i as usize] = 1;
                }
            }
        }
        cells
    }

    /// Blocked flags of the four neighbours in `[up, right, down, left]` order.
    pub fn neighbors(size: GridSize, obstacles: &ObstacleField, center: Tile) -> [u8; 4] {
        let mut out = [0u8; 4];
        for (slot, (dx, dy)) in [(0, -1), (1, 0), (0, 1), (-1, 0)].into_iter().enumerate() {
            if size.is_obstacle_or_oob(center.offset(dx, dy), obstacles) {
                out[slot] = 1;
            }
        }
        out
    }
}
