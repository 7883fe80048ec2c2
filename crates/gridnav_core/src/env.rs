//! Environment
//!
//! Owns the grid, the obstacle field and the player, and drives the episode
//! lifecycle:
//!
//! ```text
//! Idle ──reset()──▶ Running ──step()──▶ Won | Lost
//!                      ▲                    │
//!                      └──────reset()───────┘
//! ```
//!
//! One driver owns one `Environment`; every mutating call takes `&mut self`.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{EnvConfig, Mode};
use crate::error::{GridError, Result};
use crate::geometry::{GridSize, Tile};
use crate::obstacles::ObstacleField;
use crate::observation::{Observation, ObservationEncoder};
use crate::player::{Action, PlayerState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodePhase {
    Idle,
    Running,
    Won,
    Lost,
}

impl EpisodePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, EpisodePhase::Won | EpisodePhase::Lost)
    }
}

/// Side information returned with every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    pub won: bool,
    pub coords: Tile,
    pub prev_pos: (Tile, Tile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub observation: Observation,
    pub reward: i32,
    pub done: bool,
    pub info: StepInfo,
}

impl Transition {
    /// `(observation, reward, done, info)`
    pub fn into_parts(self) -> (Observation, i32, bool, StepInfo) {
        (self.observation, self.reward, self.done, self.info)
    }
}

pub struct Environment {
    config: EnvConfig,
    size: GridSize,
    mode: Mode,
    obstacles: ObstacleField,
    manual_obstacles: ObstacleField,
    player: PlayerState,
    phase: EpisodePhase,
    rng: ChaCha8Rng,
    episode: u64,
    steps: u32,
    episode_return: i64,
}

impl Environment {
    pub fn new(config: EnvConfig) -> Result<Self> {
        config.validate()?;
        let size = config.size()?;
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            size,
            mode: config.mode,
            obstacles: ObstacleField::new(),
            manual_obstacles: config.manual_layout.iter().copied().collect(),
            player: PlayerState::new(size, config.move_rule),
            phase: EpisodePhase::Idle,
            rng,
            episode: 0,
            steps: 0,
            episode_return: 0,
            config,
        })
    }

    /// Start a new episode and return its first observation.
    ///
    /// Random mode regenerates the obstacles; Manual mode restores the
    /// manual layout.
    pub fn reset(&mut self) -> Result<Observation> {
        match self.mode {
            Mode::Random => {
                self.obstacles.clear();
                let cfg = self.config.obstacles;
                self.obstacles.generate(cfg.min_count, cfg.max_count, self.size, &mut self.rng)?;
            }
            Mode::Manual => {
                self.obstacles = self.manual_obstacles.clone();
            }
        }
        Ok(self.begin_episode())
    }

    /// Start a new episode on the manual layout regardless of mode.
    pub fn restore_manual(&mut self) -> Observation {
        self.obstacles = self.manual_obstacles.clone();
        self.begin_episode()
    }

    fn begin_episode(&mut self) -> Observation {
        let start = self.player.start();
        let mut cleared = 0;
        while self.obstacles.remove(start) {
            cleared += 1;
        }
        if cleared > 0 {
            tracing::warn!(tile = %start, cleared, "removed obstacle from start tile");
        }

        self.player.reset();
        self.phase = EpisodePhase::Running;
        self.episode += 1;
        self.steps = 0;
        self.episode_return = 0;

        tracing::debug!(
            episode = self.episode,
            mode = ?self.mode,
            obstacles = self.obstacles.len(),
            "episode reset"
        );
        self.observe()
    }

    /// Advance one move.
    ///
    /// With `strict_episodes` off, stepping outside a running episode is
    /// allowed and simply computes another transition from the current state.
    pub fn step(&mut self, action: Action) -> Result<Transition> {
        if self.config.strict_episodes {
            match self.phase {
                EpisodePhase::Idle => return Err(GridError::NotStarted),
                EpisodePhase::Won | EpisodePhase::Lost => return Err(GridError::EpisodeFinished),
                EpisodePhase::Running => {}
            }
        }

        self.player.apply(action, self.size);
        self.steps += 1;

        let done = self.is_done();
        let won = self.is_won();
        let reward = self.reward();
        self.episode_return += reward as i64;

        self.phase = if won {
            EpisodePhase::Won
        } else if done {
            EpisodePhase::Lost
        } else {
            EpisodePhase::Running
        };

        let info = StepInfo {
            won,
            coords: self.player.coords(),
            prev_pos: self.player.prev_pos(),
        };
        let observation = self.observe();

        tracing::debug!(
            step = self.steps,
            action = %action,
            coords = %info.coords,
            reward,
            done,
            won,
            "step"
        );
        if self.phase.is_terminal() {
            tracing::info!(
                episode = self.episode,
                steps = self.steps,
                won,
                episode_return = self.episode_return,
                "episode finished"
            );
        }

        Ok(Transition { observation, reward, done, info })
    }

    /// [`Environment::step`] for untyped agent output.
    pub fn step_raw(&mut self, action: i64) -> Result<Transition> {
        self.step(Action::try_from(action)?)
    }

    /// Encode the current state without advancing.
    pub fn observe(&self) -> Observation {
        ObservationEncoder::encode(self.size, &self.obstacles, &self.player)
    }

    /// Blocked flags around the player in `[up, right, down, left]` order.
    pub fn observe_neighbors(&self) -> [u8; 4] {
        ObservationEncoder::neighbors(self.size, &self.obstacles, self.player.coords())
    }

    /// Left the grid horizontally, left rows `[1, h-1]`, or stands on an obstacle.
    ///
    /// Row 0 counts as done here too; [`Environment::is_won`] decides whether
    /// that is a win.
    pub fn is_done(&self) -> bool {
        let c = self.player.coords();
        c.x < 0
            || c.x > self.size.width - 1
            || c.y < 1
            || c.y > self.size.height - 1
            || self.obstacles.contains(c)
    }

    pub fn is_won(&self) -> bool {
        self.player.coords().y == 0
    }

    /// Reward of the current state, first match wins:
    /// won, lost, stood still, then by last action.
    pub fn reward(&self) -> i32 {
        let r = &self.config.rewards;
        if self.is_won() {
            r.win
        } else if self.is_done() {
            r.loss
        } else if self.player.stood_still() {
            r.stand_still
        } else {
            match self.player.last_action() {
                Action::Up => r.up_scale * (self.size.height - self.player.coords().y),
                Action::Down => r.down,
                Action::Left | Action::Right => r.sideways,
            }
        }
    }

    // ========================
    // Obstacle editing
    // ========================

    /// Flip one tile. Returns whether it is blocked afterwards.
    pub fn toggle_obstacle(&mut self, tile: Tile) -> bool {
        self.obstacles.toggle(tile)
    }

    /// Place an obstacle after clearing the straight path to the player.
    pub fn smart_add_obstacle(&mut self, tile: Tile) -> bool {
        self.obstacles.smart_add(tile, self.player.coords(), self.size)
    }

    /// Add `tile` unless it is already blocked.
    pub fn add_obstacle(&mut self, tile: Tile) -> bool {
        self.obstacles.insert(tile)
    }

    pub fn remove_obstacle(&mut self, tile: Tile) -> bool {
        self.obstacles.remove(tile)
    }

    /// Snapshot the live obstacles as the manual layout.
    pub fn commit_manual_layout(&mut self) {
        self.manual_obstacles = self.obstacles.clone();
    }

    /// Replace the manual layout. Takes effect on the next Manual reset.
    pub fn set_manual_layout(&mut self, layout: ObstacleField) {
        self.manual_obstacles = layout;
    }

    /// Switch between Random and Manual obstacle sources for later resets.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if mode == Mode::Random && (self.size.width < 4 || self.size.height < 5) {
            return Err(GridError::GridTooSmall { width: self.size.width, height: self.size.height });
        }
        self.mode = mode;
        Ok(())
    }

    // ========================
    // Read-only state
    // ========================

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn manual_obstacles(&self) -> &ObstacleField {
        &self.manual_obstacles
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    /// Episodes started so far.
    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Sum of rewards in the current episode.
    pub fn episode_return(&self) -> i64 {
        self.episode_return
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self) -> &mut PlayerState {
        &mut self.player
    }
}
