//! Flat-top hex geometry on an odd-q offset grid.
//!
//! Cells are addressed by offset coordinates (`x` = column, `y` = row) where odd
//! columns are shoved down by half a cell. Distance and line computations go through
//! axial/cube coordinates, which is where hex arithmetic is well behaved.

// Cube rounding converts interpolated floats back to integer coordinates
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]

use serde::{Deserialize, Serialize};

/// An odd-q offset coordinate.
///
/// Signed so neighbor enumeration can step off the grid edge; callers bound-check
/// against the grid they are working with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

/// An axial coordinate (`q`, `r`). The implicit third cube axis is `s = -q - r`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Axial {
    /// Column axis.
    pub q: i32,
    /// Diagonal row axis.
    pub r: i32,
}

impl Axial {
    /// The implicit third cube coordinate.
    #[must_use]
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Convert back to odd-q offset form.
    #[must_use]
    pub const fn to_offset(self) -> Coord {
        Coord::new(self.q, self.r + (self.q - (self.q & 1)) / 2)
    }
}

/// Neighbor deltas for even columns.
const EVEN_COLUMN_DELTAS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, -1), (-1, -1)];

/// Neighbor deltas for odd columns.
const ODD_COLUMN_DELTAS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (-1, 1)];

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this coordinate lies in an odd column.
    #[must_use]
    pub const fn is_odd_column(self) -> bool {
        self.x & 1 == 1
    }

    /// Whether this coordinate lies inside a `width` x `height` rectangle.
    #[must_use]
    pub const fn in_bounds(self, width: u16, height: u16) -> bool {
        self.x >= 0 && self.y >= 0 && self.x < width as i32 && self.y < height as i32
    }

    /// Convert to axial form.
    #[must_use]
    pub const fn to_axial(self) -> Axial {
        Axial {
            q: self.x,
            r: self.y - (self.x - (self.x & 1)) / 2,
        }
    }

    /// Hex distance (number of steps through the neighbor graph) to `other`.
    #[must_use]
    pub const fn distance(self, other: Coord) -> u32 {
        let a = self.to_axial();
        let b = other.to_axial();
        let dq = a.q - b.q;
        let dr = a.r - b.r;
        (dq.unsigned_abs() + dr.unsigned_abs() + (dq + dr).unsigned_abs()) / 2
    }

    /// The six neighbors of this coordinate.
    ///
    /// The delta set depends on column parity. Results may lie outside any particular
    /// grid; filter with the grid's bounds check.
    #[must_use]
    #[inline]
    pub fn neighbors(self) -> [Coord; 6] {
        let deltas = if self.is_odd_column() {
            ODD_COLUMN_DELTAS
        } else {
            EVEN_COLUMN_DELTAS
        };
        deltas.map(|(dx, dy)| Coord::new(self.x + dx, self.y + dy))
    }

    /// Whether `other` is one of the six neighbors.
    #[must_use]
    pub fn is_adjacent(self, other: Coord) -> bool {
        self.neighbors().contains(&other)
    }

    /// Rasterize a hex line from `self` to `to`, both endpoints included.
    ///
    /// Samples `distance + 1` points by interpolating in cube space and rounding each
    /// sample to the nearest hex. Consecutive duplicates are dropped, so every step of
    /// the returned path moves to an adjacent hex.
    #[must_use]
    pub fn line_to(self, to: Coord) -> Vec<Coord> {
        let a = self.to_axial();
        let b = to.to_axial();
        let n = self.distance(to);

        let mut points: Vec<Coord> = Vec::with_capacity(n as usize + 1);
        for i in 0..=n {
            let t = if n == 0 { 0.0 } else { f64::from(i) / f64::from(n) };
            let q = lerp(f64::from(a.q), f64::from(b.q), t);
            let r = lerp(f64::from(a.r), f64::from(b.r), t);
            let s = lerp(f64::from(a.s()), f64::from(b.s()), t);
            let p = cube_round(q, r, s).to_offset();
            if points.last() != Some(&p) {
                points.push(p);
            }
        }
        points
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Round fractional cube coordinates to the nearest hex.
///
/// The axis with the largest rounding error is recomputed from the other two so the
/// result keeps `q + r + s == 0`. Halves round to even.
#[must_use]
pub fn cube_round(q: f64, r: f64, s: f64) -> Axial {
    let mut rq = q.round_ties_even();
    let mut rr = r.round_ties_even();
    let rs = s.round_ties_even();

    let q_diff = (rq - q).abs();
    let r_diff = (rr - r).abs();
    let s_diff = (rs - s).abs();

    if q_diff > r_diff && q_diff > s_diff {
        rq = -rr - rs;
    } else if r_diff > s_diff {
        rr = -rq - rs;
    }

    Axial {
        q: rq as i32,
        r: rr as i32,
    }
}
