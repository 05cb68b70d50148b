// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! hexconquest: a real-time territory-conquest engine on a hexagonal grid.
//!
//! Players start in the corners of an odd-q hex board, click cells to reinforce,
//! capture and attack, and use one-shot skills (Artillery, EMP, Deep Strike, Trap).
//! The last player owning cells wins.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   CLI / soak harness / worker       │
//! ├─────────────────────────────────────┤
//! │   Match authority (game::Match)     │
//! ├─────────────────────────────────────┤
//! │   Rules: resolver, skills, victory  │
//! ├─────────────────────────────────────┤
//! │   Map generation and hex geometry   │
//! └─────────────────────────────────────┘
//! ```
//!
//! Time ([`game::SimTime`]) and randomness (a seeded `ChaCha8Rng`) are injected, so a
//! match replays identically from its seed and its request sequence.

pub mod config;
pub mod error;
pub mod game;
pub mod hex;
pub mod mapgen;
pub mod sim;
pub mod worker;

pub use config::{MapKind, MatchConfig};
pub use error::{ConfigError, MapGenError, MatchError, WorkerError};
pub use game::{
    ActionOutcome, ActionRequest, Cell, CellId, CellRef, Match, MatchEvent, MatchResult, Player,
    PlayerId, Rejection, SimTime, Skill, WinSignal,
};
pub use hex::Coord;
pub use worker::{MatchHandle, MatchWorker};
