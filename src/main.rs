//! hexconquest CLI - generate maps, replay action scripts and soak-test the rules.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// hexconquest - a hex-grid territory-conquest engine
#[derive(Parser, Debug)]
#[command(name = "hexconquest")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Board options shared by every command.
#[derive(clap::Args, Debug, Clone)]
struct BoardArgs {
    /// TOML match config; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long)]
    width: Option<u16>,

    /// Grid height in cells
    #[arg(long)]
    height: Option<u16>,

    /// Map archetype name (Full, Circles)
    #[arg(short, long)]
    map: Option<String>,

    /// Number of player slots (1-4)
    #[arg(short, long)]
    players: Option<u8>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a map and print its layout
    Map {
        #[command(flatten)]
        board: BoardArgs,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Play a JSON action script and print the resulting events
    Run {
        /// Script file (JSON)
        #[arg(required = true)]
        script: PathBuf,

        #[command(flatten)]
        board: BoardArgs,

        /// Output format: text or json (one record per line)
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Run many seeded random-bot matches in parallel and aggregate statistics
    Soak {
        #[command(flatten)]
        board: BoardArgs,

        /// Number of matches to run
        #[arg(short = 'n', long, default_value = "100")]
        matches: u64,

        /// Tick limit per match
        #[arg(short = 't', long, default_value = "3000")]
        max_ticks: u32,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hexconquest=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Map { board, format } => {
            cli::board_config(&board).and_then(|config| cli::map::execute(&config, format))
        }

        Commands::Run {
            script,
            board,
            format,
        } => cli::board_config(&board).and_then(|config| cli::run::execute(&script, config, format)),

        Commands::Soak {
            board,
            matches,
            max_ticks,
            threads,
            format,
            progress,
        } => cli::board_config(&board).and_then(|config| {
            cli::soak::execute(config, matches, max_ticks, threads, format, progress)
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
