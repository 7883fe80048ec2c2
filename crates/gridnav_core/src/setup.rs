//! Setup / manual editing
//!
//! A UI front end decodes pointer and keyboard input into [`Command`]s and
//! pushes them here. The controller consumes them one at a time:
//!
//! ```text
//!          Reset / ToggleObstacle
//!            ┌────────┐
//!            ▼        │
//! enter ─▶ Setup ─────┘ ──Start──▶ Run ──Reset──▶ Run
//! ```
//!
//! Every command handled in `Setup` snapshots the live obstacles as the
//! manual layout, so `Manual` resets replay exactly what was edited.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::error::{GridError, Result};
use crate::env::Environment;
use crate::geometry::Tile;
use crate::observation::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Start,
    Reset,
    ToggleObstacle(Tile),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::Start => f.write_str("Start"),
            Command::Reset => f.write_str("Reset"),
            Command::ToggleObstacle(t) => write!(f, "ToggleObstacle{}", t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupState {
    Setup,
    Run,
}

impl fmt::Display for SetupState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SetupState::Setup => f.write_str("Setup"),
            SetupState::Run => f.write_str("Run"),
        }
    }
}

#[derive(Debug)]
pub struct SetupController {
    state: SetupState,
    queue: VecDeque<Command>,
}

impl Default for SetupController {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupController {
    pub fn new() -> Self {
        Self { state: SetupState::Run, queue: VecDeque::new() }
    }

    pub fn state(&self) -> SetupState {
        self.state
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn push(&mut self, command: Command) {
        self.queue.push_back(command);
    }

    /// Enter `Setup` on the manual layout with the player back at the start.
    pub fn enter_setup(&mut self, env: &mut Environment) -> Observation {
        self.state = SetupState::Setup;
        tracing::debug!("entering setup");
        env.restore_manual()
    }

    /// Go straight to `Run` without editing.
    pub fn skip_setup(&mut self) {
        self.state = SetupState::Run;
    }

    /// Handle one queued command. `Ok(None)` when the queue is empty.
    pub fn process_next(&mut self, env: &mut Environment) -> Result<Option<SetupState>> {
        let Some(command) = self.queue.pop_front() else {
            return Ok(None);
        };
        self.handle(command, env)?;
        Ok(Some(self.state))
    }

    /// Handle every queued command, stopping at the first error.
    pub fn drain(&mut self, env: &mut Environment) -> Result<SetupState> {
        while self.process_next(env)?.is_some() {}
        Ok(self.state)
    }

    fn handle(&mut self, command: Command, env: &mut Environment) -> Result<()> {
        match (self.state, command) {
            (SetupState::Setup, Command::Start) => {
                self.state = SetupState::Run;
            }
            (SetupState::Setup, Command::Reset) => {
                env.reset()?;
            }
            (SetupState::Setup, Command::ToggleObstacle(tile)) => {
                if !env.size().in_bounds(tile) {
                    return Err(GridError::OutOfGrid(tile));
                }
                env.toggle_obstacle(tile);
            }
            (SetupState::Run, Command::Reset) => {
                env.reset()?;
                return Ok(());
            }
            (state, command) => {
                return Err(GridError::UnexpectedCommand {
                    command: command.to_string(),
                    state: state.to_string(),
                });
            }
        }

        env.commit_manual_layout();
        tracing::debug!(%command, state = %self.state, obstacles = env.obstacles().len(), "setup command");
        Ok(())
    }
}
