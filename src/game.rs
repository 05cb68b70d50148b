//! Game layer for hexconquest.
//!
//! Implements the rules of a match on top of the hex geometry and the map layout:
//! - Grid of cells with owners, force, gold mines, EMP freezes and traps
//! - Starting-cell assignment with bounded retries
//! - Action resolution (reinforce, capture, attack) and the four skills
//! - Elimination and win detection
//! - The [`Match`] authority that ties them together

mod cell;
mod clock;
pub mod combat;
mod cooldown;
mod events;
mod grid;
pub mod invariants;
mod player;
pub mod reach;
mod resolver;
pub mod skills;
mod spawn;
mod state;
mod victory;

pub use cell::{Cell, CellId};
pub use clock::{Clock, ManualClock, MonotonicClock, SimTime};
pub use cooldown::{Cooldowns, CLICK_COOLDOWN};
pub use events::MatchEvent;
pub use grid::{CellChange, GridState, NEUTRAL_FORCE_RANGE};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use player::{Player, PlayerId, Roster, Skill, DEFAULT_POWER};
pub use resolver::{resolve, ActionOutcome, Rejection};
pub use spawn::{
    corner_for, spawn_target, try_assign, PendingSpawn, SpawnOutcome, SPAWN_RETRY_INTERVAL,
    SPAWN_TIMEOUT, STARTING_FORCE,
};
pub use state::{ActionRequest, CellRef, Match};
pub use victory::{Evaluation, MatchResult, WinConditionEvaluator, WinSignal};
