//! Map generation: active coordinates, planned spawns and gold mines.
//!
//! Generation is a pure function of the configuration and the injected RNG, so a given
//! seed always yields the same layout.

// Grid sizes are u16 and coordinates i32
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use rand::Rng;
use tracing::debug;

use crate::config::{CirclesShape, MapKind, MatchConfig, MAX_PLAYERS};
use crate::error::MapGenError;
use crate::game::{corner_for, PlayerId};
use crate::hex::Coord;

/// Upper bound on nodes dequeued by the nearest-active-cell search.
pub const NEAREST_SEARCH_GUARD: usize = 100_000;

/// The static shape of a match board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapLayout {
    width: u16,
    height: u16,
    kind: MapKind,
    active: BTreeSet<Coord>,
    gold_mines: BTreeSet<Coord>,
    planned_spawns: BTreeMap<PlayerId, Coord>,
}

impl MapLayout {
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

    /// Archetype the layout was generated from.
    #[must_use]
    pub const fn kind(&self) -> MapKind {
        self.kind
    }

    /// Active coordinates in column-major order.
    #[must_use]
    pub const fn active(&self) -> &BTreeSet<Coord> {
        &self.active
    }

    /// Coordinates carrying a gold mine. Always a subset of the active set.
    #[must_use]
    pub const fn gold_mines(&self) -> &BTreeSet<Coord> {
        &self.gold_mines
    }

    /// Whether `coord` is an active cell.
    #[must_use]
    pub fn is_active(&self, coord: Coord) -> bool {
        self.active.contains(&coord)
    }

    /// Whether `coord` carries a gold mine.
    #[must_use]
    pub fn is_gold_mine(&self, coord: Coord) -> bool {
        self.gold_mines.contains(&coord)
    }

    /// Planned spawn for a player slot, if the slot exists on this map.
    #[must_use]
    pub fn planned_spawn(&self, ordinal: PlayerId) -> Option<Coord> {
        self.planned_spawns.get(&ordinal).copied()
    }

    /// All planned spawns keyed by player slot.
    #[must_use]
    pub const fn planned_spawns(&self) -> &BTreeMap<PlayerId, Coord> {
        &self.planned_spawns
    }

    /// Number of active cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether the layout has no active cells. Never true for a generated layout.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Generate the layout for a match.
///
/// Planned spawns are resolved for slots `1..=max_players` by mapping each corner onto
/// the nearest active cell, and gold mines are placed away from the planned spawns.
///
/// # Errors
///
/// Returns [`MapGenError::EmptyMap`] if the archetype yields no active cells (only
/// possible for a zero-sized grid).
pub fn generate_layout<R: Rng + ?Sized>(
    config: &MatchConfig,
    rng: &mut R,
) -> Result<MapLayout, MapGenError> {
    let (width, height) = (config.width, config.height);
    let active = active_cells(config.map, width, height, config.circles_shape());
    if active.is_empty() {
        return Err(MapGenError::EmptyMap { width, height });
    }

    let mut planned_spawns = BTreeMap::new();
    for ordinal in 1..=config.max_players {
        if let Some(spawn) = nearest_allowed(corner_for(ordinal, width, height), &active, width, height) {
            planned_spawns.insert(ordinal, spawn);
        }
    }

    // Slots beyond max_players still reserve their raw corner.
    let blocked: HashSet<Coord> = (1..=MAX_PLAYERS)
        .map(|ordinal| {
            planned_spawns
                .get(&ordinal)
                .copied()
                .unwrap_or_else(|| corner_for(ordinal, width, height))
        })
        .filter(|coord| active.contains(coord))
        .collect();

    let gold_mines = gold_mine_coords(&active, &blocked, config.max_players, rng);
    debug!(
        map = %config.map,
        active = active.len(),
        mines = gold_mines.len(),
        "generated layout"
    );

    Ok(MapLayout {
        width,
        height,
        kind: config.map,
        active,
        gold_mines,
        planned_spawns,
    })
}

/// Active coordinates for an archetype.
#[must_use]
pub fn active_cells(kind: MapKind, width: u16, height: u16, shape: CirclesShape) -> BTreeSet<Coord> {
    match kind {
        MapKind::Full => full_rectangle(width, height),
        MapKind::Circles => circles(width, height, shape),
    }
}

fn full_rectangle(width: u16, height: u16) -> BTreeSet<Coord> {
    (0..i32::from(width))
        .flat_map(|x| (0..i32::from(height)).map(move |y| Coord::new(x, y)))
        .collect()
}

fn circles(width: u16, height: u16, shape: CirclesShape) -> BTreeSet<Coord> {
    let mut active = BTreeSet::new();
    if width == 0 || height == 0 {
        return active;
    }

    let (w, h) = (i32::from(width), i32::from(height));
    let clamp = |c: Coord| Coord::new(c.x.clamp(0, w - 1), c.y.clamp(0, h - 1));

    let inset = (shape.corner_radius as i32).clamp(0, (w - 1).min(h - 1));
    let center = clamp(Coord::new(w / 2, h / 2));
    let corners = [
        clamp(Coord::new(inset, inset)),
        clamp(Coord::new(w - 1 - inset, inset)),
        clamp(Coord::new(inset, h - 1 - inset)),
        clamp(Coord::new(w - 1 - inset, h - 1 - inset)),
    ];

    for corner in corners {
        add_disk(&mut active, corner, shape.corner_radius, width, height);
    }
    add_disk(&mut active, center, shape.center_radius, width, height);
    for corner in corners {
        for point in corner.line_to(center) {
            add_disk(&mut active, point, shape.corridor_radius, width, height);
        }
    }
    active
}

/// Add every in-bounds coordinate within `radius` steps of `center`.
fn add_disk(set: &mut BTreeSet<Coord>, center: Coord, radius: u32, width: u16, height: u16) {
    let r = radius.min(u32::from(u16::MAX)) as i32;
    let pad = r * 2 + 2;
    let min_x = (center.x - pad).max(0);
    let max_x = (center.x + pad).min(i32::from(width) - 1);
    let min_y = (center.y - pad).max(0);
    let max_y = (center.y + pad).min(i32::from(height) - 1);

    for x in min_x..=max_x {
        for y in min_y..=max_y {
            let p = Coord::new(x, y);
            if p.distance(center) <= radius {
                set.insert(p);
            }
        }
    }
}

/// Nearest member of `allowed` to `start`, breadth-first over in-bounds neighbors.
///
/// Returns `start` itself when allowed. Falls back to the smallest allowed coordinate if
/// the search finds nothing; `None` only when `allowed` is empty.
#[must_use]
pub fn nearest_allowed(
    start: Coord,
    allowed: &BTreeSet<Coord>,
    width: u16,
    height: u16,
) -> Option<Coord> {
    let fallback = allowed.first().copied()?;
    Some(nearest_where(start, width, height, |c| allowed.contains(&c)).unwrap_or(fallback))
}

/// Nearest coordinate to `start` accepted by `accept`, breadth-first over in-bounds
/// neighbors.
///
/// `start` is tested first. The search gives up after dequeuing
/// [`NEAREST_SEARCH_GUARD`] nodes.
pub fn nearest_where(
    start: Coord,
    width: u16,
    height: u16,
    mut accept: impl FnMut(Coord) -> bool,
) -> Option<Coord> {
    if accept(start) {
        return Some(start);
    }

    let mut queue = VecDeque::from([start]);
    let mut seen = HashSet::from([start]);
    let mut steps = 0;

    while let Some(current) = queue.pop_front() {
        if steps >= NEAREST_SEARCH_GUARD {
            break;
        }
        steps += 1;
        for n in current.neighbors() {
            if !n.in_bounds(width, height) || !seen.insert(n) {
                continue;
            }
            if accept(n) {
                return Some(n);
            }
            queue.push_back(n);
        }
    }
    None
}

/// Pick gold mine coordinates by rejection sampling.
///
/// The target is `max(max_players, active / 25)` capped by the number of unblocked
/// cells. Sampling gives up after `max(50, active * 20)` draws, so the result may fall
/// short of the target on a crowded map.
fn gold_mine_coords<R: Rng + ?Sized>(
    active: &BTreeSet<Coord>,
    blocked: &HashSet<Coord>,
    max_players: u8,
    rng: &mut R,
) -> BTreeSet<Coord> {
    let cell_count = active.len();
    let desired = usize::from(max_players).max(cell_count / 25);
    let available = cell_count.saturating_sub(blocked.len());
    let mine_count = desired.min(available);

    let mut mines = BTreeSet::new();
    if mine_count == 0 {
        return mines;
    }

    let candidates: Vec<Coord> = active.iter().copied().collect();
    let attempts = 50.max(cell_count.saturating_mul(20));
    for _ in 0..attempts {
        if mines.len() >= mine_count {
            break;
        }
        let coord = candidates[rng.gen_range(0..candidates.len())];
        if !blocked.contains(&coord) {
            mines.insert(coord);
        }
    }
    mines
}
