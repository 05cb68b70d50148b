//! A single board cell.

use serde::{Deserialize, Serialize};

use crate::game::{PlayerId, SimTime};
use crate::hex::Coord;

/// Stable identifier of a cell, assigned at grid build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(pub u32);

impl CellId {
    /// Position of the cell in the grid's storage.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// State of one active coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Position on the board. Never changes.
    pub coord: Coord,
    /// Owning player, `None` for neutral.
    pub owner: Option<PlayerId>,
    /// Defensive strength.
    pub force: u32,
    /// Whether the cell yields passive income.
    pub gold_mine: bool,
    /// The cell is frozen while `now < emp_until`.
    pub emp_until: Option<SimTime>,
    /// Player whose trap is armed on this cell.
    pub trap_owner: Option<PlayerId>,
}

impl Cell {
    /// A neutral cell with the given starting force.
    #[must_use]
    pub const fn neutral(coord: Coord, force: u32, gold_mine: bool) -> Self {
        Self {
            coord,
            owner: None,
            force,
            gold_mine,
            emp_until: None,
            trap_owner: None,
        }
    }

    /// Whether an EMP freeze is active at `now`.
    #[must_use]
    pub fn is_frozen(&self, now: SimTime) -> bool {
        self.emp_until.is_some_and(|until| now < until)
    }

    /// Neutral with no force left: the next adjacent click captures it.
    #[must_use]
    pub const fn is_neutral_capturable(&self) -> bool {
        self.owner.is_none() && self.force == 0
    }

    /// Neutral but still holding force: it must be attacked down first.
    #[must_use]
    pub const fn is_neutral_contested(&self) -> bool {
        self.owner.is_none() && self.force > 0
    }

    /// Whether `player` owns this cell.
    #[must_use]
    pub fn is_owned_by(&self, player: PlayerId) -> bool {
        self.owner == Some(player)
    }

    /// Whether a player other than `player` owns this cell.
    #[must_use]
    pub fn is_enemy_of(&self, player: PlayerId) -> bool {
        self.owner.is_some_and(|owner| owner != player)
    }

    /// Whether a trap is armed on this cell.
    #[must_use]
    pub const fn has_trap(&self) -> bool {
        self.trap_owner.is_some()
    }

    /// The trap owner as seen by `viewer`. Traps are only revealed to their owner.
    #[must_use]
    pub fn visible_trap_owner(&self, viewer: PlayerId) -> Option<PlayerId> {
        self.trap_owner.filter(|&owner| owner == viewer)
    }

    /// Copy of this cell with foreign traps hidden from `viewer`.
    #[must_use]
    pub fn as_seen_by(&self, viewer: PlayerId) -> Self {
        Self {
            trap_owner: self.visible_trap_owner(viewer),
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_predicates() {
        let mut cell = Cell::neutral(Coord::new(1, 1), 12, false);
        assert!(cell.is_neutral_contested());
        assert!(!cell.is_neutral_capturable());

        cell.force = 0;
        assert!(cell.is_neutral_capturable());
        assert!(!cell.is_neutral_contested());

        cell.owner = Some(2);
        assert!(!cell.is_neutral_capturable());
        assert!(!cell.is_neutral_contested());
        assert!(cell.is_owned_by(2));
        assert!(cell.is_enemy_of(1));
        assert!(!cell.is_enemy_of(2));
    }

    #[test]
    fn test_frozen_window() {
        let mut cell = Cell::neutral(Coord::new(0, 0), 5, false);
        assert!(!cell.is_frozen(SimTime::ZERO));

        cell.emp_until = Some(SimTime::from_millis(5_000));
        assert!(cell.is_frozen(SimTime::from_millis(4_999)));
        assert!(!cell.is_frozen(SimTime::from_millis(5_000)));
    }

    #[test]
    fn test_trap_visibility() {
        let mut cell = Cell::neutral(Coord::new(0, 0), 0, false);
        cell.owner = Some(1);
        cell.trap_owner = Some(1);

        assert_eq!(cell.visible_trap_owner(1), Some(1));
        assert_eq!(cell.visible_trap_owner(2), None);
        assert!(cell.as_seen_by(2).trap_owner.is_none());
        assert_eq!(cell.as_seen_by(2).owner, Some(1));
    }
}
