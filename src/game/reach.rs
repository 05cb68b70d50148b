//! Bounded reachability from a player's territory.

use std::collections::{HashMap, VecDeque};

use crate::game::{GridState, PlayerId};
use crate::hex::Coord;

/// Whether `target` is within `steps` neighbor steps of any cell `player` owns.
///
/// Multi-source breadth-first search seeded with every owned cell at distance 0. The
/// search walks any in-bounds coordinate, including inactive ones, so gaps in the map do
/// not block it. Targets outside the grid are never reachable.
#[must_use]
pub fn is_reachable_within(grid: &GridState, player: PlayerId, target: Coord, steps: u32) -> bool {
    if !grid.in_bounds(target) {
        return false;
    }

    let mut frontier = VecDeque::new();
    let mut dist: HashMap<Coord, u32> = HashMap::new();
    for (_, cell) in grid.owned_by(player) {
        frontier.push_back(cell.coord);
        dist.insert(cell.coord, 0);
    }

    while let Some(current) = frontier.pop_front() {
        let d = dist.get(&current).copied().unwrap_or(0);
        if current == target {
            return true;
        }
        if d >= steps {
            continue;
        }
        for n in current.neighbors() {
            if !grid.in_bounds(n) || dist.contains_key(&n) {
                continue;
            }
            dist.insert(n, d + 1);
            frontier.push_back(n);
        }
    }
    false
}
