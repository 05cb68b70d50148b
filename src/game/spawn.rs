//! Starting-cell assignment.
//!
//! Each player slot maps to a grid corner. The starting cell is the layout's planned
//! spawn for that slot, or the nearest active cell to the corner when no plan exists.
//! Assignment that cannot happen yet (no grid, unknown player) is retried on a fixed
//! interval until a deadline, see [`PendingSpawn`].

use std::time::Duration;

use crate::game::{CellId, GridState, PlayerId, SimTime};
use crate::hex::Coord;
use crate::mapgen::nearest_where;

/// Force placed on a player's starting cell.
pub const STARTING_FORCE: u32 = 200;

/// Delay between assignment attempts for a pending spawn.
pub const SPAWN_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// How long a pending spawn is retried before giving up.
pub const SPAWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Grid corner for a player slot. Slots outside `1..=4` fall back to the origin.
#[must_use]
pub fn corner_for(ordinal: PlayerId, width: u16, height: u16) -> Coord {
    let right = i32::from(width) - 1;
    let bottom = i32::from(height) - 1;
    match ordinal {
        2 => Coord::new(right, 0),
        3 => Coord::new(0, bottom),
        4 => Coord::new(right, bottom),
        _ => Coord::new(0, 0),
    }
}

/// Coordinate a player should start on.
///
/// Uses `planned` when it is an active cell, else the nearest active cell to the slot's
/// corner, else the first cell of the grid.
#[must_use]
pub fn spawn_target(grid: &GridState, planned: Option<Coord>, ordinal: PlayerId) -> Option<Coord> {
    if let Some(coord) = planned.filter(|&c| grid.contains(c)) {
        return Some(coord);
    }
    let corner = corner_for(ordinal, grid.width(), grid.height());
    nearest_where(corner, grid.width(), grid.height(), |c| grid.contains(c))
        .or_else(|| grid.iter().next().map(|(_, cell)| cell.coord))
}

/// Result of one assignment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// The player now holds the cell with [`STARTING_FORCE`].
    Assigned {
        /// Starting cell.
        cell: CellId,
        /// Its coordinate.
        coord: Coord,
    },
    /// Another player already holds the starting cell. Resolved, nothing written.
    Occupied {
        /// Starting cell.
        cell: CellId,
        /// Current holder.
        holder: PlayerId,
    },
    /// The slot is outside `1..=max_players`. Resolved, nothing written.
    NoSlot,
    /// The match is decided, or the player is eliminated or already placed. Resolved,
    /// nothing written.
    Ineligible,
    /// The grid has no cell to assign. Retry later.
    NotReady,
}

impl SpawnOutcome {
    /// Whether the request is finished (successfully or not) and needs no retry.
    #[must_use]
    pub const fn is_resolved(self) -> bool {
        !matches!(self, Self::NotReady)
    }
}

/// Try to give `player` its starting cell now.
///
/// Only fields that differ are written, so re-assigning a player that already holds its
/// start with full force records no changes.
pub fn try_assign(
    grid: &mut GridState,
    planned: Option<Coord>,
    player: PlayerId,
    max_players: u8,
) -> SpawnOutcome {
    if player == 0 || player > max_players {
        return SpawnOutcome::NoSlot;
    }
    let Some(coord) = spawn_target(grid, planned, player) else {
        return SpawnOutcome::NotReady;
    };
    let Some(cell) = grid.id_at(coord) else {
        return SpawnOutcome::NotReady;
    };
    let owner = grid.cell(cell).and_then(|c| c.owner);
    if let Some(holder) = owner.filter(|&holder| holder != player) {
        return SpawnOutcome::Occupied { cell, holder };
    }

    grid.set_owner(cell, Some(player));
    grid.set_force(cell, STARTING_FORCE);
    SpawnOutcome::Assigned { cell, coord }
}

/// A spawn waiting for its preconditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSpawn {
    /// Player waiting for a starting cell.
    pub player: PlayerId,
    /// Earliest time of the next attempt.
    pub next_attempt: SimTime,
    /// Give up at or after this time.
    pub deadline: SimTime,
}

impl PendingSpawn {
    /// Schedule retries starting one interval after `now`.
    #[must_use]
    pub fn new(player: PlayerId, now: SimTime) -> Self {
        Self {
            player,
            next_attempt: now + SPAWN_RETRY_INTERVAL,
            deadline: now + SPAWN_TIMEOUT,
        }
    }

    /// Whether an attempt is due at `now`.
    #[must_use]
    pub fn is_due(&self, now: SimTime) -> bool {
        now >= self.next_attempt
    }

    /// Whether the deadline has passed at `now`.
    #[must_use]
    pub fn is_expired(&self, now: SimTime) -> bool {
        now >= self.deadline
    }

    /// Push the next attempt one interval past `now`.
    pub fn reschedule(&mut self, now: SimTime) {
        self.next_attempt = now + SPAWN_RETRY_INTERVAL;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Cell;

    fn full_grid(width: u16, height: u16) -> GridState {
        let cells = (0..i32::from(width))
            .flat_map(|x| (0..i32::from(height)).map(move |y| Cell::neutral(Coord::new(x, y), 30, false)))
            .collect();
        GridState::from_cells(width, height, cells)
    }

    #[test]
    fn test_corners() {
        assert_eq!(corner_for(1, 10, 8), Coord::new(0, 0));
        assert_eq!(corner_for(2, 10, 8), Coord::new(9, 0));
        assert_eq!(corner_for(3, 10, 8), Coord::new(0, 7));
        assert_eq!(corner_for(4, 10, 8), Coord::new(9, 7));
        assert_eq!(corner_for(5, 10, 8), Coord::new(0, 0));
    }

    #[test]
    fn test_assign_sets_owner_and_force() {
        let mut grid = full_grid(10, 10);
        let outcome = try_assign(&mut grid, None, 2, 4);
        let SpawnOutcome::Assigned { cell, coord } = outcome else {
            panic!("expected assignment, got {outcome:?}");
        };
        assert_eq!(coord, Coord::new(9, 0));
        let c = grid.cell(cell).unwrap();
        assert_eq!(c.owner, Some(2));
        assert_eq!(c.force, STARTING_FORCE);
        assert_eq!(grid.take_changes().len(), 2);
    }

    #[test]
    fn test_reassign_writes_nothing() {
        let mut grid = full_grid(4, 4);
        assert!(matches!(try_assign(&mut grid, None, 1, 4), SpawnOutcome::Assigned { .. }));
        grid.take_changes();
        assert!(matches!(try_assign(&mut grid, None, 1, 4), SpawnOutcome::Assigned { .. }));
        assert!(!grid.has_changes());
    }

    #[test]
    fn test_occupied_is_resolved_without_writes() {
        let mut grid = full_grid(4, 4);
        let id = grid.id_at(Coord::new(0, 0)).unwrap();
        grid.set_owner(id, Some(3));
        grid.take_changes();

        let outcome = try_assign(&mut grid, None, 1, 4);
        assert_eq!(outcome, SpawnOutcome::Occupied { cell: id, holder: 3 });
        assert!(outcome.is_resolved());
        assert!(!grid.has_changes());
    }

    #[test]
    fn test_out_of_range_slot() {
        let mut grid = full_grid(4, 4);
        assert_eq!(try_assign(&mut grid, None, 3, 2), SpawnOutcome::NoSlot);
        assert_eq!(try_assign(&mut grid, None, 0, 4), SpawnOutcome::NoSlot);
        assert!(!grid.has_changes());
    }

    #[test]
    fn test_missing_corner_uses_nearest_active() {
        let cells = vec![
            Cell::neutral(Coord::new(2, 2), 5, false),
            Cell::neutral(Coord::new(1, 1), 5, false),
        ];
        let mut grid = GridState::from_cells(5, 5, cells);
        let outcome = try_assign(&mut grid, None, 1, 4);
        assert!(matches!(outcome, SpawnOutcome::Assigned { coord, .. } if coord == Coord::new(1, 1)));
    }

    #[test]
    fn test_planned_spawn_preferred() {
        let mut grid = full_grid(6, 6);
        let outcome = try_assign(&mut grid, Some(Coord::new(2, 3)), 1, 4);
        assert!(matches!(outcome, SpawnOutcome::Assigned { coord, .. } if coord == Coord::new(2, 3)));

        // A plan that is not on the grid is ignored.
        let outcome = try_assign(&mut grid, Some(Coord::new(40, 40)), 4, 4);
        assert!(matches!(outcome, SpawnOutcome::Assigned { coord, .. } if coord == Coord::new(5, 5)));
    }

    #[test]
    fn test_empty_grid_not_ready() {
        let mut grid = GridState::from_cells(3, 3, Vec::new());
        assert_eq!(try_assign(&mut grid, None, 1, 4), SpawnOutcome::NotReady);
        assert!(!SpawnOutcome::NotReady.is_resolved());
    }

    #[test]
    fn test_pending_schedule() {
        let mut pending = PendingSpawn::new(1, SimTime::from_millis(1_000));
        assert!(!pending.is_due(SimTime::from_millis(1_050)));
        assert!(pending.is_due(SimTime::from_millis(1_100)));
        pending.reschedule(SimTime::from_millis(1_100));
        assert_eq!(pending.next_attempt, SimTime::from_millis(1_200));
        assert!(!pending.is_expired(SimTime::from_millis(5_999)));
        assert!(pending.is_expired(SimTime::from_millis(6_000)));
    }
}
