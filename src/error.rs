//! Error types for configuration, map generation and match management.
//!
//! Gameplay outcomes (a rejected click, an unmet skill precondition) are not errors;
//! they are returned as [`crate::game::ActionOutcome`] values.

use thiserror::Error;

use crate::game::PlayerId;

/// Invalid or unreadable match configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("grid dimensions must be positive, got {width}x{height}")]
    InvalidDimensions {
        /// Configured width.
        width: u16,
        /// Configured height.
        height: u16,
    },

    /// Width or height exceeds the supported maximum.
    #[error("grid dimensions must be at most {max}x{max}, got {width}x{height}")]
    DimensionsTooLarge {
        /// Configured width.
        width: u16,
        /// Configured height.
        height: u16,
        /// Largest supported side length.
        max: u16,
    },

    /// Player count outside `1..=4`.
    #[error("max_players must be in 1..={max}, got {got}")]
    InvalidPlayerCount {
        /// Configured player count.
        got: u8,
        /// Largest supported player count.
        max: u8,
    },

    /// A circles shape parameter is out of range.
    #[error("invalid circles shape: {0}")]
    InvalidShape(String),

    /// The TOML document could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
}

/// Map generation failure.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapGenError {
    /// The archetype produced no active cells.
    #[error("map generation produced no active cells ({width}x{height})")]
    EmptyMap {
        /// Grid width.
        width: u16,
        /// Grid height.
        height: u16,
    },
}

/// Match setup and management failure.
#[derive(Error, Debug)]
pub enum MatchError {
    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Map generation failed.
    #[error(transparent)]
    MapGen(#[from] MapGenError),

    /// Player id 0 is reserved for neutral.
    #[error("player id 0 is reserved for neutral cells")]
    ReservedPlayerId,

    /// Player id beyond the configured player count.
    #[error("player {id} exceeds max_players ({max})")]
    PlayerOutOfRange {
        /// Requested id.
        id: PlayerId,
        /// Configured player count.
        max: u8,
    },

    /// A player with this id already joined.
    #[error("player {0} already joined")]
    DuplicatePlayer(PlayerId),

    /// The grid was already built for this match.
    #[error("grid already built")]
    GridAlreadyBuilt,
}

/// Failure talking to a match worker.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker thread has stopped and no longer accepts commands.
    #[error("match worker has shut down")]
    Disconnected,

    /// The worker thread panicked.
    #[error("match worker panicked")]
    Panicked,
}
