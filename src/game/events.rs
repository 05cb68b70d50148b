//! Notifications emitted by a match, in the order they happened.

use serde::{Deserialize, Serialize};

use crate::game::{CellChange, CellId, PlayerId, WinSignal};
use crate::hex::Coord;

/// Something observers of a match should know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A cell's state changed.
    CellChanged(CellChange),
    /// A player received a starting cell.
    SpawnAssigned {
        /// The player.
        player: PlayerId,
        /// Starting cell.
        cell: CellId,
        /// Its coordinate.
        coord: Coord,
    },
    /// A player's starting cell could not be assigned before the deadline.
    SpawnFailed {
        /// The player.
        player: PlayerId,
    },
    /// A player lost their last cell.
    PlayerEliminated {
        /// The player.
        player: PlayerId,
    },
    /// The match has a winner. Emitted at most once.
    MatchWon(WinSignal),
    /// The match ended with nobody owning a cell. Emitted at most once.
    MatchDrawn,
}
