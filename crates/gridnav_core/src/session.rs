//! Remote session protocol
//!
//! Message handling for driving an environment from a remote executor
//! (e.g. a physical robot) over a topic-based bus. The transport itself is
//! not here: callers feed decoded [`Inbound`] messages in and publish the
//! returned [`Outbound`] messages.
//!
//! ## Flow
//! 1. `ready()` announces the session
//! 2. `Start` resets the episode and sends the first action
//! 3. Each `Move` confirmation steps the environment and sends the next action
//! 4. The session closes with `Finish` on a terminal step, or `Stuck` when
//!    the agent keeps returning to visited tiles
//!
//! Every inbound message is acknowledged before it is acted on.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::env::{Environment, EpisodePhase};
use crate::error::{GridError, Result};
use crate::geometry::Tile;
use crate::observation::Observation;
use crate::player::Action;

/// Revisits tolerated before the session reports `Stuck`.
pub const DEFAULT_MAX_REPEATS: u32 = 5;

/// Produces the next action from an observation.
pub trait Policy {
    fn predict(&mut self, observation: &Observation) -> Action;
}

impl<F> Policy for F
where
    F: FnMut(&Observation) -> Action,
{
    fn predict(&mut self, observation: &Observation) -> Action {
        self(observation)
    }
}

/// Replays a fixed action list, then keeps repeating the last action.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPolicy {
    actions: Vec<Action>,
    cursor: usize,
}

impl ScriptedPolicy {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions, cursor: 0 }
    }

    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

impl Policy for ScriptedPolicy {
    fn predict(&mut self, _observation: &Observation) -> Action {
        let action = match self.actions.get(self.cursor) {
            Some(a) => *a,
            None => self.actions.last().copied().unwrap_or_default(),
        };
        self.cursor += 1;
        action
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Start,
    Coords,
    Move,
    Obstacle(Tile),
}

impl Inbound {
    /// Decode by topic suffix (`Zumo/Start`, `Zumo/Move`, ...).
    /// Obstacle payloads look like `(x, y)`.
    pub fn parse(topic: &str, payload: &[u8]) -> Result<Self> {
        if topic.contains("Start") {
            Ok(Inbound::Start)
        } else if topic.contains("Coords") {
            Ok(Inbound::Coords)
        } else if topic.contains("Move") {
            Ok(Inbound::Move)
        } else if topic.contains("Obst") {
            let text = std::str::from_utf8(payload)
                .map_err(|e| GridError::InvalidPayload(e.to_string()))?;
            Ok(Inbound::Obstacle(parse_tile(text)?))
        } else {
            Err(GridError::InvalidPayload(format!("unknown topic '{}'", topic)))
        }
    }
}

/// Parse `"(x, y)"`.
pub fn parse_tile(text: &str) -> Result<Tile> {
    let bad = || GridError::InvalidPayload(format!("expected '(x, y)', got '{}'", text));
    let inner = text.trim().strip_prefix('(').and_then(|s| s.strip_suffix(')')).ok_or_else(bad)?;
    let (x, y) = inner.split_once(',').ok_or_else(bad)?;
    let x = x.trim().parse::<i32>().map_err(|_| bad())?;
    let y = y.trim().parse::<i32>().map_err(|_| bad())?;
    Ok(Tile::new(x, y))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Ready,
    Stuck,
    Finish,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Status::Ready => f.write_str("Ready"),
            Status::Stuck => f.write_str("Stuck"),
            Status::Finish => f.write_str("Finish"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Ack(String),
    Action(Action),
    Coords(Tile),
    Status(Status),
}

impl Outbound {
    pub fn topic(&self) -> &'static str {
        match self {
            Outbound::Ack(_) => "Net/Ack",
            Outbound::Action(_) => "Net/Action",
            Outbound::Coords(_) => "Net/Coords",
            Outbound::Status(_) => "Net/Status",
        }
    }

    pub fn payload(&self) -> String {
        match self {
            Outbound::Ack(label) => label.clone(),
            Outbound::Action(a) => a.index().to_string(),
            Outbound::Coords(t) => t.to_string(),
            Outbound::Status(s) => s.to_string(),
        }
    }
}

/// One remote episode driver. Owns the environment, so messages are
/// handled strictly one at a time.
pub struct RemoteSession<P: Policy> {
    env: Environment,
    policy: P,
    history: Vec<Tile>,
    pending: Option<Action>,
    repeated: u32,
    max_repeats: u32,
    done: bool,
    closed: bool,
}

impl<P: Policy> RemoteSession<P> {
    pub fn new(env: Environment, policy: P) -> Self {
        Self {
            env,
            policy,
            history: Vec::new(),
            pending: None,
            repeated: 0,
            max_repeats: DEFAULT_MAX_REPEATS,
            done: false,
            closed: false,
        }
    }

    pub fn with_max_repeats(mut self, max_repeats: u32) -> Self {
        self.max_repeats = max_repeats;
        self
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn repeated(&self) -> u32 {
        self.repeated
    }

    pub fn into_parts(self) -> (Environment, P) {
        (self.env, self.policy)
    }

    pub fn ready(&self) -> Vec<Outbound> {
        tracing::info!("session ready");
        vec![Outbound::Status(Status::Ready)]
    }

    /// Handle one inbound message. A closed session ignores everything.
    pub fn handle(&mut self, message: Inbound) -> Result<Vec<Outbound>> {
        if self.closed {
            tracing::debug!(?message, "session closed, ignoring message");
            return Ok(Vec::new());
        }

        match message {
            Inbound::Start => self.on_start(),
            Inbound::Coords => Ok(vec![
                Outbound::Ack("Coords".to_string()),
                Outbound::Coords(self.env.player().coords()),
            ]),
            Inbound::Move => self.on_move(),
            Inbound::Obstacle(tile) => {
                self.env.add_obstacle(tile);
                tracing::info!(%tile, "obstacle reported");
                Ok(vec![Outbound::Ack(format!("Obst {}", tile))])
            }
        }
    }

    /// [`RemoteSession::handle`] straight from a raw topic and payload.
    pub fn handle_raw(&mut self, topic: &str, payload: &[u8]) -> Result<Vec<Outbound>> {
        self.handle(Inbound::parse(topic, payload)?)
    }

    fn on_start(&mut self) -> Result<Vec<Outbound>> {
        let mut out = vec![Outbound::Ack("Start".to_string())];
        let observation = self.env.reset()?;
        self.history.clear();
        self.repeated = 0;
        self.done = false;

        let action = self.policy.predict(&observation);
        self.pending = Some(action);
        out.push(Outbound::Action(action));
        tracing::info!(%action, "episode started");
        Ok(out)
    }

    /// The executor confirmed the last action it was sent: apply that same
    /// action to the simulation, then send the next one.
    fn on_move(&mut self) -> Result<Vec<Outbound>> {
        let mut out = vec![Outbound::Ack("Move".to_string())];

        // A session is live from the moment it exists, Start or not.
        if self.env.phase() == EpisodePhase::Idle {
            tracing::debug!("move before start, resetting environment");
            self.env.reset()?;
        }

        if !self.done {
            let action = match self.pending.take() {
                Some(a) => a,
                None => self.policy.predict(&self.env.observe()),
            };
            let transition = self.env.step(action)?;
            self.done = transition.done;

            let coords = transition.info.coords;
            if self.history.contains(&coords) {
                self.repeated += 1;
                if self.repeated > self.max_repeats {
                    tracing::warn!(repeated = self.repeated, %coords, "agent stuck");
                    out.push(Outbound::Status(Status::Stuck));
                    self.closed = true;
                    return Ok(out);
                }
            }

            if !self.done {
                self.history.push(coords);
                let next = self.policy.predict(&transition.observation);
                self.pending = Some(next);
                out.push(Outbound::Action(next));
            }
        }

        if self.done {
            tracing::info!(won = self.env.is_won(), "episode complete");
            out.push(Outbound::Status(Status::Finish));
            self.closed = true;
        }
        Ok(out)
    }
}
