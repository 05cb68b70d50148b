//! CLI command implementations for hexconquest.

pub(crate) mod map;
pub(crate) mod run;
pub(crate) mod soak;

mod output;

use clap::ValueEnum;
use hexconquest::{ConfigError, MapKind, MatchConfig, MatchError};
use std::error::Error;
use std::fmt;

use crate::BoardArgs;

/// Output format shared by all commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<MatchError> for CliError {
    fn from(e: MatchError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON error: {e}"))
    }
}

/// Resolve the match config from an optional file plus flag overrides.
pub(crate) fn board_config(board: &BoardArgs) -> Result<MatchConfig, CliError> {
    let mut config = match &board.config {
        Some(path) => MatchConfig::load(path)
            .map_err(|e| CliError::new(format!("{}: {e}", path.display())))?,
        None => MatchConfig::default(),
    };
    if let Some(width) = board.width {
        config.width = width;
    }
    if let Some(height) = board.height {
        config.height = height;
    }
    if let Some(name) = &board.map {
        config.map = MapKind::from_name(name);
    }
    if let Some(players) = board.players {
        config.max_players = players;
    }
    if let Some(seed) = board.seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}
