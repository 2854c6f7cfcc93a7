//! Line-of-sight resolution between grid cells.
//!
//! A shot travels between cell centers; each block is the closed square
//! covering its cell. Touching a block boundary counts as blocked. The test
//! runs in integer grid space, so the answer never depends on how large a
//! cell is drawn. `Point` and `Rect` are the render-space view of the same
//! cells.

use crate::types::GridPos;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Closed axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Point,
    pub max: Point,
}

impl Rect {
    /// Square footprint of `cell` at the given cell size.
    pub fn of_cell(cell: GridPos, cell_size: f64) -> Self {
        let x = cell.x as f64 * cell_size;
        let y = cell.y as f64 * cell_size;
        Self {
            min: Point { x, y },
            max: Point { x: x + cell_size, y: y + cell_size },
        }
    }
}

/// Center of `cell` in render space.
pub fn cell_center(cell: GridPos, cell_size: f64) -> Point {
    Point {
        x: cell.x as f64 * cell_size + cell_size / 2.0,
        y: cell.y as f64 * cell_size + cell_size / 2.0,
    }
}

/// A point on the doubled grid: cell `x` spans `[2x, 2x + 2]` and its
/// center sits at `2x + 1`, so every center and corner is an integer.
type Lattice = (i64, i64);

fn doubled_center(cell: GridPos) -> Lattice {
    (2 * cell.x as i64 + 1, 2 * cell.y as i64 + 1)
}

/// Sign of the turn `a -> b -> c`: positive counter-clockwise, zero collinear.
fn orientation(a: Lattice, b: Lattice, c: Lattice) -> i64 {
    ((b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)).signum()
}

/// `p` is collinear with `a`-`b`; does it fall inside their bounding box?
fn within_span(a: Lattice, b: Lattice, p: Lattice) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

/// Closed segments `p1`-`p2` and `q1`-`q2` share at least one point.
fn segments_touch(p1: Lattice, p2: Lattice, q1: Lattice, q2: Lattice) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }
    (d1 == 0 && within_span(q1, q2, p1))
        || (d2 == 0 && within_span(q1, q2, p2))
        || (d3 == 0 && within_span(p1, p2, q1))
        || (d4 == 0 && within_span(p1, p2, q2))
}

/// Whether the shot between the centers of `shooter` and `target` touches
/// the closed square of `block`. Exact: no scaling, no rounding.
pub fn shot_touches_cell(shooter: GridPos, target: GridPos, block: GridPos) -> bool {
    let from = doubled_center(shooter);
    let to = doubled_center(target);
    let (x0, y0) = (2 * block.x as i64, 2 * block.y as i64);
    let (x1, y1) = (x0 + 2, y0 + 2);

    let inside = |p: Lattice| p.0 >= x0 && p.0 <= x1 && p.1 >= y0 && p.1 <= y1;
    if inside(from) || inside(to) {
        return true;
    }

    let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
    (0..4).any(|i| segments_touch(from, to, corners[i], corners[(i + 1) % 4]))
}

/// Whether a shot from `shooter` to `target` is stopped by any block.
///
/// A non-positive cell size means no geometry is available and nothing
/// blocks. Any positive size gives the same answer.
pub fn is_shot_blocked(shooter: GridPos, target: GridPos, blocks: &[GridPos], cell_size: f64) -> bool {
    if cell_size <= 0.0 {
        return false;
    }
    blocks
        .iter()
        .any(|&block| shot_touches_cell(shooter, target, block))
}
