//! Player state and actions
//!
//! The player is the only moving entity. The environment reads its
//! position, last transition, history and last action; the player decides
//! for itself whether a requested move is allowed ([`MoveRule`]).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GridError;
use crate::geometry::{GridSize, Tile};

/// Discrete move. Numeric values are the wire encoding used by agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Action {
    #[default]
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Up, Action::Right, Action::Down, Action::Left];

    /// Tile offset. Up moves towards the goal row (`y - 1`).
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (0, -1),
            Action::Right => (1, 0),
            Action::Down => (0, 1),
            Action::Left => (-1, 0),
        }
    }

    /// Two-bit code written into observations (not one-hot).
    #[inline]
    pub fn code(self) -> [i32; 2] {
        match self {
            Action::Up => [0, 0],
            Action::Right => [0, 1],
            Action::Down => [1, 0],
            Action::Left => [1, 1],
        }
    }

    #[inline]
    pub fn index(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for Action {
    type Error = GridError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Action::Up),
            1 => Ok(Action::Right),
            2 => Ok(Action::Down),
            3 => Ok(Action::Left),
            other => Err(GridError::InvalidAction(other)),
        }
    }
}

impl TryFrom<u8> for Action {
    type Error = GridError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Action::try_from(value as i64)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Action::Up => "up",
            Action::Right => "right",
            Action::Down => "down",
            Action::Left => "left",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Action {
    type Err = GridError;

    /// Accepts names (`up`, `u`, ...) or the numeric encoding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(Action::Up),
            "right" | "r" => Ok(Action::Right),
            "down" | "d" => Ok(Action::Down),
            "left" | "l" => Ok(Action::Left),
            other => other
                .parse::<i64>()
                .map_err(|_| GridError::InvalidPayload(format!("unknown action '{}'", s)))
                .and_then(Action::try_from),
        }
    }
}

/// How the player validates a requested move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveRule {
    /// Every move is applied; leaving the grid ends the episode.
    #[default]
    Free,
    /// Moves off the left/right edges or below the bottom row are refused
    /// and the player stays put. Moving onto the goal row is always allowed.
    Confined,
}

/// Position and movement record of the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    coords: Tile,
    prev_pos: (Tile, Tile),
    history: Vec<Tile>,
    last_action: Action,
    rule: MoveRule,
    start: Tile,
}

impl PlayerState {
    pub fn new(size: GridSize, rule: MoveRule) -> Self {
        let start = size.start_tile();
        Self {
            coords: start,
            prev_pos: (start, start),
            history: Vec::new(),
            last_action: Action::Up,
            rule,
            start,
        }
    }

    /// Back to the start tile with an empty history.
    pub fn reset(&mut self) {
        self.coords = self.start;
        self.prev_pos = (self.start, self.start);
        self.history.clear();
        self.last_action = Action::Up;
    }

    /// Apply `action` and return the new coordinates.
    pub fn apply(&mut self, action: Action, size: GridSize) -> Tile {
        let before = self.coords;
        let (dx, dy) = action.delta();
        let target = before.offset(dx, dy);

        let after = match self.rule {
            MoveRule::Free => target,
            MoveRule::Confined => {
                if target.x < 0 || target.x > size.width - 1 || target.y > size.height - 1 {
                    before
                } else {
                    target
                }
            }
        };

        self.last_action = action;
        self.prev_pos = (before, after);
        self.coords = after;
        self.history.push(after);
        after
    }

    #[inline]
    pub fn coords(&self) -> Tile {
        self.coords
    }

    /// `(before, after)` of the last move.
    #[inline]
    pub fn prev_pos(&self) -> (Tile, Tile) {
        self.prev_pos
    }

    pub fn history(&self) -> &[Tile] {
        &self.history
    }

    #[inline]
    pub fn last_action(&self) -> Action {
        self.last_action
    }

    pub fn rule(&self) -> MoveRule {
        self.rule
    }

    pub fn start(&self) -> Tile {
        self.start
    }

    /// True when the last move left the player where it was.
    pub fn stood_still(&self) -> bool {
        self.coords == self.prev_pos.0
    }

    #[cfg(test)]
    pub(crate) fn place(&mut self, tile: Tile) {
        self.coords = tile;
        self.prev_pos = (tile, tile);
    }
}
