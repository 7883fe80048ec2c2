//! Episode driver library
//!
//! Scripted episodes, parallel batch runs and layout editing on top of
//! `gridnav_core`. The `gridnav` binary is a thin clap front end over this.

use anyhow::{bail, Context, Result};
use gridnav_core::{
    Action, Command, EnvConfig, Environment, Mode, ObstacleLayout, Policy, ScriptedPolicy,
    SetupController, SetupState, Tile, Transition,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Command-line overrides applied on top of a config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub seed: Option<u64>,
    pub mode: Option<Mode>,
}

/// Load `path` (or defaults) and apply overrides.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<EnvConfig> {
    let mut config = match path {
        Some(p) => EnvConfig::load(p).with_context(|| format!("Failed to load config: {}", p.display()))?,
        None => EnvConfig::default(),
    };
    if let Some(w) = overrides.width {
        config.width = w;
    }
    if let Some(h) = overrides.height {
        config.height = h;
    }
    if overrides.seed.is_some() {
        config.seed = overrides.seed;
    }
    if let Some(m) = overrides.mode {
        config.mode = m;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Build an environment, installing a layout file if given.
pub fn build_env(config: EnvConfig, layout: Option<&Path>) -> Result<Environment> {
    let mut env = Environment::new(config)?;
    if let Some(path) = layout {
        ObstacleLayout::load(path)
            .and_then(|l| l.apply(&mut env))
            .with_context(|| format!("Failed to apply layout: {}", path.display()))?;
    }
    Ok(env)
}

/// `up,up,left` / `u r d l` / `0,0,3`.
pub fn parse_actions(text: &str) -> Result<Vec<Action>> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Action>().with_context(|| format!("Bad action '{}'", s)))
        .collect()
}

/// `x,y`
pub fn parse_tile(text: &str) -> Result<Tile> {
    let Some((x, y)) = text.split_once(',') else {
        bail!("Expected 'x,y', got '{}'", text);
    };
    Ok(Tile::new(
        x.trim().parse().with_context(|| format!("Bad x in '{}'", text))?,
        y.trim().parse().with_context(|| format!("Bad y in '{}'", text))?,
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub seed: Option<u64>,
    pub steps: u32,
    pub won: bool,
    pub done: bool,
    pub total_reward: i64,
    pub transitions: Vec<Transition>,
}

/// Reset and play `policy` until the episode ends or `max_steps` moves.
pub fn run_episode<P: Policy>(env: &mut Environment, policy: &mut P, max_steps: u32) -> Result<EpisodeReport> {
    let mut observation = env.reset()?;
    let mut transitions = Vec::new();

    for _ in 0..max_steps {
        let action = policy.predict(&observation);
        let t = env.step(action)?;
        observation = t.observation.clone();
        let done = t.done;
        transitions.push(t);
        if done {
            break;
        }
    }

    let last = transitions.last();
    Ok(EpisodeReport {
        seed: env.config().seed,
        steps: env.steps(),
        won: last.map(|t| t.info.won).unwrap_or(false),
        done: last.map(|t| t.done).unwrap_or(false),
        total_reward: env.episode_return(),
        transitions,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub episodes: u64,
    pub won: u64,
    pub lost: u64,
    pub unfinished: u64,
    pub mean_return: f64,
}

/// Play the same action script once per seed, one environment per task.
pub fn run_batch(
    config: &EnvConfig,
    actions: &[Action],
    seeds: std::ops::Range<u64>,
    max_steps: u32,
) -> Result<BatchSummary> {
    let reports: Vec<EpisodeReport> = seeds
        .into_par_iter()
        .map(|seed| -> Result<EpisodeReport> {
            let mut env = Environment::new(config.clone().with_seed(seed))?;
            let mut policy = ScriptedPolicy::new(actions.to_vec());
            let mut report = run_episode(&mut env, &mut policy, max_steps)?;
            report.transitions.clear();
            Ok(report)
        })
        .collect::<Result<_>>()?;

    let mut summary = BatchSummary { episodes: reports.len() as u64, ..Default::default() };
    let mut total = 0i64;
    for r in &reports {
        total += r.total_reward;
        match (r.done, r.won) {
            (true, true) => summary.won += 1,
            (true, false) => summary.lost += 1,
            _ => summary.unfinished += 1,
        }
    }
    if summary.episodes > 0 {
        summary.mean_return = total as f64 / summary.episodes as f64;
    }
    tracing::info!(?summary, "batch finished");
    Ok(summary)
}

/// Toggle tiles through the setup controller and return the resulting layout.
pub fn edit_layout(env: &mut Environment, toggles: &[Tile]) -> Result<ObstacleLayout> {
    let mut ctl = SetupController::new();
    ctl.enter_setup(env);
    for tile in toggles {
        ctl.push(Command::ToggleObstacle(*tile));
    }
    ctl.push(Command::Start);
    let state = ctl.drain(env)?;
    debug_assert_eq!(state, SetupState::Run);
    Ok(ObstacleLayout::from_env(env))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!(
            parse_actions("up, r 2,left").unwrap(),
            vec![Action::Up, Action::Right, Action::Down, Action::Left]
        );
        assert!(parse_actions("up,fly").is_err());
        assert!(parse_actions("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_tile() {
        assert_eq!(parse_tile("3, 2").unwrap(), Tile::new(3, 2));
        assert!(parse_tile("3").is_err());
    }

    #[test]
    fn test_run_episode_stops_on_done() {
        let mut env = Environment::new(EnvConfig::manual(5, 5)).unwrap();
        let mut policy = ScriptedPolicy::new(vec![Action::Up]);
        let report = run_episode(&mut env, &mut policy, 100).unwrap();

        assert_eq!(report.steps, 4);
        assert!(report.won);
        assert_eq!(report.total_reward, 2 + 3 + 4 + 50);
    }

    #[test]
    fn test_run_episode_respects_max_steps() {
        let mut env = Environment::new(EnvConfig::manual(5, 5)).unwrap();
        let mut policy = ScriptedPolicy::new(vec![Action::Up, Action::Down]);
        let report = run_episode(&mut env, &mut policy, 6).unwrap();
        assert_eq!(report.steps, 6);
        assert!(!report.done);
    }

    #[test]
    fn test_batch_counts_every_seed() {
        let config = EnvConfig::default();
        let summary = run_batch(&config, &[Action::Up], 0..16, 50).unwrap();
        assert_eq!(summary.episodes, 16);
        assert_eq!(summary.won + summary.lost + summary.unfinished, 16);
        assert_eq!(summary.unfinished, 0);
    }

    #[test]
    fn test_batch_is_deterministic() {
        let config = EnvConfig::sparse();
        let a = run_batch(&config, &[Action::Up, Action::Left], 0..8, 30).unwrap();
        let b = run_batch(&config, &[Action::Up, Action::Left], 0..8, 30).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_edit_layout() {
        let mut env = Environment::new(EnvConfig::manual(5, 5)).unwrap();
        let layout = edit_layout(&mut env, &[Tile::new(1, 1), Tile::new(3, 2)]).unwrap();
        assert_eq!(layout.tiles, vec![Tile::new(1, 1), Tile::new(3, 2)]);
    }

    #[test]
    fn test_load_config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("env.yaml");
        std::fs::write(&path, "width: 6\nheight: 7\n").unwrap();

        let overrides = Overrides { height: Some(9), seed: Some(4), ..Default::default() };
        let cfg = load_config(Some(&path), &overrides).unwrap();
        assert_eq!((cfg.width, cfg.height, cfg.seed), (6, 9, Some(4)));
    }
}
