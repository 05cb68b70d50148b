//! The authoritative board.
//!
//! All cell writes go through the mutation primitives on [`GridState`]. Each primitive
//! records a [`CellChange`] carrying the full post-write cell, and only when a field
//! actually changed; [`GridState::take_changes`] drains them in write order.

// Cell count is bounded by u16 x u16
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::{Cell, CellId, PlayerId, SimTime};
use crate::hex::Coord;
use crate::mapgen::MapLayout;

/// Neutral cells start with a force drawn uniformly from this range.
pub const NEUTRAL_FORCE_RANGE: std::ops::RangeInclusive<u32> = 1..=50;

/// Notification that a cell changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    /// Which cell.
    pub id: CellId,
    /// Its full state after the write.
    pub cell: Cell,
}

/// Board state: the fixed set of active cells and their mutable fields.
#[derive(Debug, Clone)]
pub struct GridState {
    width: u16,
    height: u16,
    /// Active cells, indexed by [`CellId`].
    cells: Vec<Cell>,
    /// Dense `width * height` lookup from coordinate to cell id.
    lookup: Vec<Option<CellId>>,
    /// Pending change notifications.
    changes: Vec<CellChange>,
}

impl GridState {
    /// Build the board for a layout.
    ///
    /// Cells are numbered in the layout's coordinate order. Every cell starts neutral
    /// with a random force from [`NEUTRAL_FORCE_RANGE`]. Building records no changes.
    #[must_use]
    pub fn build<R: Rng + ?Sized>(layout: &MapLayout, rng: &mut R) -> Self {
        let cells = layout
            .active()
            .iter()
            .map(|&coord| {
                let force = rng.gen_range(NEUTRAL_FORCE_RANGE);
                Cell::neutral(coord, force, layout.is_gold_mine(coord))
            })
            .collect();
        Self::from_cells(layout.width(), layout.height(), cells)
    }

    /// Build a board from explicit cells. Cells outside the bounds are dropped; of two
    /// cells on the same coordinate the first wins.
    #[must_use]
    pub fn from_cells(width: u16, height: u16, cells: Vec<Cell>) -> Self {
        let mut grid = Self {
            width,
            height,
            cells: Vec::with_capacity(cells.len()),
            lookup: vec![None; usize::from(width) * usize::from(height)],
            changes: Vec::new(),
        };
        for cell in cells {
            let Some(idx) = grid.lookup_index(cell.coord) else {
                continue;
            };
            if grid.lookup[idx].is_some() {
                continue;
            }
            grid.lookup[idx] = Some(CellId(grid.cells.len() as u32));
            grid.cells.push(cell);
        }
        grid
    }

    /// Grid width.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Grid height.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// Number of active cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the board has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Whether `coord` lies inside the grid rectangle (active or not).
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.in_bounds(self.width, self.height)
    }

    fn lookup_index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some(coord.y as usize * usize::from(self.width) + coord.x as usize)
        } else {
            None
        }
    }

    /// Cell id at a coordinate, if that coordinate is active.
    #[must_use]
    #[inline]
    pub fn id_at(&self, coord: Coord) -> Option<CellId> {
        self.lookup_index(coord).and_then(|idx| self.lookup[idx])
    }

    /// Whether `coord` is an active cell.
    #[must_use]
    pub fn contains(&self, coord: Coord) -> bool {
        self.id_at(coord).is_some()
    }

    /// Cell by id.
    #[must_use]
    #[inline]
    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    /// Cell at a coordinate.
    #[must_use]
    pub fn cell_at(&self, coord: Coord) -> Option<&Cell> {
        self.id_at(coord).and_then(|id| self.cell(id))
    }

    /// Coordinate of a cell.
    #[must_use]
    pub fn coord_of(&self, id: CellId) -> Option<Coord> {
        self.cell(id).map(|cell| cell.coord)
    }

    /// Iterate all cells with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (CellId, &Cell)> {
        self.cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| (CellId(idx as u32), cell))
    }

    /// The active neighbors of `coord`.
    pub fn neighbor_ids(&self, coord: Coord) -> impl Iterator<Item = CellId> + '_ {
        coord.neighbors().into_iter().filter_map(|n| self.id_at(n))
    }

    /// Whether any active neighbor of `coord` is owned by `player`.
    #[must_use]
    pub fn is_adjacent_to_owned(&self, coord: Coord, player: PlayerId) -> bool {
        coord
            .neighbors()
            .into_iter()
            .any(|n| self.cell_at(n).is_some_and(|cell| cell.is_owned_by(player)))
    }

    /// Cells owned by `player`.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = (CellId, &Cell)> {
        self.iter().filter(move |(_, cell)| cell.is_owned_by(player))
    }

    /// Owned-cell count per owner. Neutral cells are not counted.
    #[must_use]
    pub fn tally_owners(&self) -> BTreeMap<PlayerId, usize> {
        let mut counts = BTreeMap::new();
        for cell in &self.cells {
            if let Some(owner) = cell.owner {
                *counts.entry(owner).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Snapshot of every cell as `viewer` may see it: foreign traps are hidden.
    #[must_use]
    pub fn view_for(&self, viewer: PlayerId) -> Vec<Cell> {
        self.cells.iter().map(|cell| cell.as_seen_by(viewer)).collect()
    }

    /// Drain pending change notifications in write order.
    pub fn take_changes(&mut self) -> Vec<CellChange> {
        std::mem::take(&mut self.changes)
    }

    /// Whether there are undrained change notifications.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Apply `write` to a cell and record a change if it reports one.
    fn mutate(&mut self, id: CellId, write: impl FnOnce(&mut Cell) -> bool) -> bool {
        let Some(cell) = self.cells.get_mut(id.index()) else {
            return false;
        };
        if !write(cell) {
            return false;
        }
        let cell = *cell;
        self.changes.push(CellChange { id, cell });
        true
    }

    /// Set the owner. Returns whether the cell changed.
    pub fn set_owner(&mut self, id: CellId, owner: Option<PlayerId>) -> bool {
        self.mutate(id, |cell| replace_if_different(&mut cell.owner, owner))
    }

    /// Set the force. Returns whether the cell changed.
    pub fn set_force(&mut self, id: CellId, force: u32) -> bool {
        self.mutate(id, |cell| replace_if_different(&mut cell.force, force))
    }

    /// Freeze the cell until `until`. Returns whether the cell changed.
    pub fn set_emp_until(&mut self, id: CellId, until: SimTime) -> bool {
        self.mutate(id, |cell| replace_if_different(&mut cell.emp_until, Some(until)))
    }

    /// Arm a trap owned by `owner`. Returns whether the cell changed.
    pub fn set_trap(&mut self, id: CellId, owner: PlayerId) -> bool {
        self.mutate(id, |cell| replace_if_different(&mut cell.trap_owner, Some(owner)))
    }

    /// Disarm any trap. Returns whether the cell changed.
    pub fn clear_trap(&mut self, id: CellId) -> bool {
        self.mutate(id, |cell| replace_if_different(&mut cell.trap_owner, None))
    }

    /// Mark or unmark the cell as a gold mine. Returns whether the cell changed.
    pub fn set_gold_mine(&mut self, id: CellId, gold_mine: bool) -> bool {
        self.mutate(id, |cell| replace_if_different(&mut cell.gold_mine, gold_mine))
    }
}

fn replace_if_different<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapKind, MatchConfig};
    use crate::mapgen::generate_layout;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn small_grid() -> GridState {
        let cells = (0..3)
            .flat_map(|x| (0..3).map(move |y| Cell::neutral(Coord::new(x, y), 0, false)))
            .collect();
        GridState::from_cells(3, 3, cells)
    }

    #[test]
    fn test_build_from_layout() {
        let config = MatchConfig {
            width: 12,
            height: 12,
            map: MapKind::Circles,
            seed: 5,
            ..MatchConfig::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let layout = generate_layout(&config, &mut rng).unwrap();
        let grid = GridState::build(&layout, &mut rng);

        assert_eq!(grid.len(), layout.len());
        assert!(!grid.has_changes());
        for (id, cell) in grid.iter() {
            assert!(layout.is_active(cell.coord));
            assert_eq!(grid.id_at(cell.coord), Some(id));
            assert_eq!(cell.owner, None);
            assert!(NEUTRAL_FORCE_RANGE.contains(&cell.force));
            assert_eq!(cell.gold_mine, layout.is_gold_mine(cell.coord));
        }
        let inactive = (0..12)
            .flat_map(|x| (0..12).map(move |y| Coord::new(x, y)))
            .find(|c| !layout.is_active(*c))
            .unwrap();
        assert_eq!(grid.id_at(inactive), None);
    }

    #[test]
    fn test_lookups_out_of_bounds() {
        let grid = small_grid();
        assert!(grid.cell_at(Coord::new(-1, 0)).is_none());
        assert!(grid.cell_at(Coord::new(3, 0)).is_none());
        assert!(grid.cell(CellId(99)).is_none());
        assert_eq!(grid.coord_of(CellId(0)), Some(Coord::new(0, 0)));
    }

    #[test]
    fn test_primitives_emit_only_on_change() {
        let mut grid = small_grid();
        let id = grid.id_at(Coord::new(1, 1)).unwrap();

        assert!(grid.set_owner(id, Some(1)));
        assert!(!grid.set_owner(id, Some(1)));
        assert!(grid.set_force(id, 200));
        assert!(!grid.set_force(id, 200));
        assert!(grid.set_trap(id, 1));
        assert!(!grid.set_trap(id, 1));
        assert!(grid.clear_trap(id));
        assert!(!grid.clear_trap(id));

        let changes = grid.take_changes();
        assert_eq!(changes.len(), 4);
        assert_eq!(changes[0].cell.owner, Some(1));
        assert_eq!(changes[0].cell.force, 0);
        assert_eq!(changes[1].cell.force, 200);
        assert_eq!(changes[2].cell.trap_owner, Some(1));
        assert_eq!(changes[3].cell.trap_owner, None);
        assert!(grid.take_changes().is_empty());
    }

    #[test]
    fn test_set_gold_mine_emits_on_change() {
        let mut grid = small_grid();
        let id = grid.id_at(Coord::new(2, 1)).unwrap();

        assert!(!grid.set_gold_mine(id, false));
        assert!(!grid.has_changes());
        assert!(grid.set_gold_mine(id, true));
        assert!(!grid.set_gold_mine(id, true));
        assert!(grid.set_gold_mine(id, false));

        let changes = grid.take_changes();
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].id, id);
        assert!(changes[0].cell.gold_mine);
        assert!(!changes[1].cell.gold_mine);
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let mut grid = small_grid();
        assert!(!grid.set_force(CellId(1_000), 5));
        assert!(!grid.has_changes());
    }

    #[test]
    fn test_adjacency_and_tally() {
        let mut grid = small_grid();
        let center = grid.id_at(Coord::new(1, 1)).unwrap();
        let corner = grid.id_at(Coord::new(2, 2)).unwrap();
        grid.set_owner(center, Some(1));
        grid.set_owner(corner, Some(2));

        assert!(grid.is_adjacent_to_owned(Coord::new(1, 0), 1));
        assert!(!grid.is_adjacent_to_owned(Coord::new(0, 0), 2));

        let tally = grid.tally_owners();
        assert_eq!(tally.get(&1), Some(&1));
        assert_eq!(tally.get(&2), Some(&1));
        assert_eq!(tally.len(), 2);
        assert_eq!(grid.owned_by(1).count(), 1);
    }

    #[test]
    fn test_neighbor_ids_skip_inactive() {
        let cells = vec![
            Cell::neutral(Coord::new(0, 0), 1, false),
            Cell::neutral(Coord::new(1, 0), 1, false),
        ];
        let grid = GridState::from_cells(3, 3, cells);
        let ids: Vec<_> = grid.neighbor_ids(Coord::new(0, 0)).collect();
        assert_eq!(ids, vec![CellId(1)]);
    }

    #[test]
    fn test_view_hides_foreign_traps() {
        let mut grid = small_grid();
        let id = grid.id_at(Coord::new(0, 0)).unwrap();
        grid.set_owner(id, Some(1));
        grid.set_trap(id, 1);

        assert_eq!(grid.view_for(1)[id.index()].trap_owner, Some(1));
        assert_eq!(grid.view_for(2)[id.index()].trap_owner, None);
    }

    #[test]
    fn test_from_cells_drops_duplicates_and_out_of_bounds() {
        let cells = vec![
            Cell::neutral(Coord::new(0, 0), 1, false),
            Cell::neutral(Coord::new(0, 0), 2, false),
            Cell::neutral(Coord::new(5, 5), 3, false),
        ];
        let grid = GridState::from_cells(2, 2, cells);
        assert_eq!(grid.len(), 1);
        assert_eq!(grid.cell(CellId(0)).map(|c| c.force), Some(1));
    }
}
