//! Command-line frontend for the micromouse simulator.

mod agent;
mod commands;
mod generator;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::agent::AgentKind;
use crate::commands::run::RunOptions;

#[derive(Parser)]
#[command(
    name = "mms",
    about = "mms: a differential-drive micromouse maze simulator",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive a demo agent through a maze in real time and report statistics
    Run {
        /// Maze layout JSON file (default: generate one from --seed)
        #[arg(short, long)]
        maze: Option<PathBuf>,

        /// Width of a generated maze, in tiles
        #[arg(long, default_value = "16")]
        width: usize,

        /// Height of a generated maze, in tiles
        #[arg(long, default_value = "16")]
        height: usize,

        /// RNG seed for maze generation
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Control agent to run on its own thread
        #[arg(short, long, value_enum, default_value_t = AgentKind::WallFollower)]
        agent: AgentKind,

        /// Simulation seconds to run for
        #[arg(long, default_value = "10.0")]
        seconds: f64,

        /// Simulation speed multiplier
        #[arg(long, default_value = "1.0")]
        speed: f64,

        /// Print statistics as JSON instead of a table
        #[arg(long)]
        json: bool,

        /// Also print the event log
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate a random maze with a depth-first backtracker
    Maze {
        /// Width in tiles
        #[arg(long, default_value = "16")]
        width: usize,

        /// Height in tiles
        #[arg(long, default_value = "16")]
        height: usize,

        /// RNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Emit the layout as JSON instead of ASCII art
        #[arg(long)]
        json: bool,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the preset mouse's wheels, sensors and footprint
    Inspect {
        /// Emit the mouse description as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            maze,
            width,
            height,
            seed,
            agent,
            seconds,
            speed,
            json,
            verbose,
        } => commands::run::run(&RunOptions {
            maze,
            width,
            height,
            seed,
            agent,
            seconds,
            speed,
            json,
            verbose,
        }),
        Commands::Maze {
            width,
            height,
            seed,
            json,
            output,
        } => commands::maze::run(width, height, seed, json, output.as_deref()),
        Commands::Inspect { json } => commands::inspect::run(json),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
