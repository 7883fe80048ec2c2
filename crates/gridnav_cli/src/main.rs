//! gridnav CLI
//!
//! Scripted episodes, batch statistics and manual layout editing.

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use gridnav_core::{Mode, ScriptedPolicy};
#[cfg(feature = "cli")]
use gridnav_cli::{build_env, edit_layout, load_config, parse_actions, parse_tile, run_batch, run_episode, Overrides};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "gridnav")]
#[command(about = "Drive the grid navigation environment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Args, Clone)]
struct EnvArgs {
    /// Config file (.json, .yaml or .yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Manual layout file to install before the first reset
    #[arg(long)]
    layout: Option<PathBuf>,

    #[arg(long)]
    width: Option<i32>,

    #[arg(long)]
    height: Option<i32>,

    #[arg(long)]
    seed: Option<u64>,

    /// "random" or "manual"
    #[arg(long)]
    mode: Option<String>,
}

#[cfg(feature = "cli")]
impl EnvArgs {
    fn overrides(&self) -> Result<Overrides> {
        let mode = match &self.mode {
            Some(m) => Some(m.parse::<Mode>()?),
            None => None,
        };
        Ok(Overrides { width: self.width, height: self.height, seed: self.seed, mode })
    }
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Play one episode and print each transition as a JSON line
    Run {
        #[command(flatten)]
        env: EnvArgs,

        /// Actions, e.g. "up,up,left" or "0,0,3"
        #[arg(long)]
        actions: String,

        #[arg(long, default_value = "200")]
        max_steps: u32,
    },

    /// Print the first observation of a fresh episode
    Observe {
        #[command(flatten)]
        env: EnvArgs,
    },

    /// Play the same script over a range of seeds in parallel
    Batch {
        #[command(flatten)]
        env: EnvArgs,

        #[arg(long)]
        actions: String,

        #[arg(long, default_value = "100")]
        episodes: u64,

        #[arg(long, default_value = "0")]
        first_seed: u64,

        #[arg(long, default_value = "200")]
        max_steps: u32,
    },

    /// Toggle tiles in setup mode and save the manual layout
    Layout {
        #[command(flatten)]
        env: EnvArgs,

        /// Tile to toggle, "x,y" (repeatable)
        #[arg(long = "toggle")]
        toggles: Vec<String>,

        /// Output layout JSON
        #[arg(long)]
        out: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let mut filter = EnvFilter::from_default_env();
    if let Ok(d) = "gridnav_core=info".parse() {
        filter = filter.add_directive(d);
    }
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { env, actions, max_steps } => {
            let config = load_config(env.config.as_deref(), &env.overrides()?)?;
            let mut environment = build_env(config, env.layout.as_deref())?;
            let mut policy = ScriptedPolicy::new(parse_actions(&actions)?);

            let report = run_episode(&mut environment, &mut policy, max_steps)?;
            for t in &report.transitions {
                println!("{}", serde_json::to_string(t)?);
            }
            eprintln!(
                "steps={} won={} done={} return={}",
                report.steps, report.won, report.done, report.total_reward
            );
        }

        Commands::Observe { env } => {
            let config = load_config(env.config.as_deref(), &env.overrides()?)?;
            let mut environment = build_env(config, env.layout.as_deref())?;
            let observation = environment.reset()?;
            println!("{}", serde_json::to_string(&observation)?);
        }

        Commands::Batch { env, actions, episodes, first_seed, max_steps } => {
            let config = load_config(env.config.as_deref(), &env.overrides()?)?;
            let actions = parse_actions(&actions)?;
            let summary = run_batch(&config, &actions, first_seed..first_seed + episodes, max_steps)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Layout { env, toggles, out } => {
            let mut overrides = env.overrides()?;
            overrides.mode = Some(Mode::Manual);
            let config = load_config(env.config.as_deref(), &overrides)?;
            let mut environment = build_env(config, env.layout.as_deref())?;

            let tiles = toggles.iter().map(|t| parse_tile(t)).collect::<Result<Vec<_>>>()?;
            let layout = edit_layout(&mut environment, &tiles)?;
            layout.save(&out)?;
            eprintln!("Saved {} tiles to {}", layout.tiles.len(), out.display());
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("gridnav CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
