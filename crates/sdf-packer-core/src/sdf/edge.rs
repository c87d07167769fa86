use super::{EdgeMap, Point, SolidityMask};

/// Neighbor offsets in scan order (row-major, center skipped).
pub(crate) const NEIGHBORS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Sub-pixel boundary point closest to `(x, y)`, or `None` when no neighbor differs in solidity.
///
/// For each of the 8 neighbors on the other side of the threshold the crossing is interpolated
/// along the segment between the two pixel centers:
/// `t = clamp((0.5 - a_self) / (a_neighbor - a_self), 0, 1)`.
/// The nearest crossing wins; ties keep the first in scan order.
pub fn edge_at(mask: &SolidityMask, x: u32, y: u32) -> Option<Point> {
    let a_self = mask.alpha(x, y);
    let solid = mask.is_solid(x, y);
    let (w, h) = (mask.width as i32, mask.height as i32);

    let mut best: Option<Point> = None;
    let mut best_dist = f32::INFINITY;
    for (dx, dy) in NEIGHBORS {
        let nx = x as i32 + dx;
        let ny = y as i32 + dy;
        if nx < 0 || ny < 0 || nx >= w || ny >= h {
            continue;
        }
        let (nx, ny) = (nx as u32, ny as u32);
        if mask.is_solid(nx, ny) == solid {
            continue;
        }
        let a_n = mask.alpha(nx, ny);
        let t = ((super::ALPHA_THRESHOLD - a_self) / (a_n - a_self)).clamp(0.0, 1.0);
        let ox = t * dx as f32;
        let oy = t * dy as f32;
        let d = ox * ox + oy * oy;
        if d < best_dist {
            best_dist = d;
            best = Some(Point::new(x as f32 + ox, y as f32 + oy));
        }
    }
    best
}

/// Runs `edge_at` over every pixel, row by row.
pub fn detect_edges(mask: &SolidityMask) -> EdgeMap {
    let seeds = (0..mask.len())
        .map(|i| {
            let (x, y) = mask.coords(i);
            edge_at(mask, x, y)
        })
        .collect();
    EdgeMap {
        width: mask.width,
        height: mask.height,
        seeds,
    }
}
