use super::edge::NEIGHBORS;
use super::{EdgeMap, Point};

/// Jump offsets for a `width x height` region: `2^k, 2^(k-1), ..., 1` with
/// `k = ceil(log2(max(width, height)))`, i.e. `k + 1` passes.
pub fn jump_offsets(width: u32, height: u32) -> Vec<u32> {
    let max_dim = width.max(height).max(1);
    // ceil(log2(n)) for n >= 1
    let k = u32::BITS - (max_dim - 1).leading_zeros();
    (0..=k).rev().map(|i| 1u32 << i).collect()
}

/// One pixel of one jump pass.
///
/// Reads only `prev` (the previous pass's buffer). The pixel's own candidate is considered first,
/// then the 8 pixels at `(±offset, ±offset)`, `(±offset, 0)`, `(0, ±offset)` in scan order; the
/// candidate boundary point closest to `(x, y)` is kept.
pub fn jump_at(
    prev: &[Option<Point>],
    width: u32,
    height: u32,
    x: u32,
    y: u32,
    offset: u32,
) -> Option<Point> {
    let (px, py) = (x as f32, y as f32);
    let w = width as i64;
    let h = height as i64;

    let mut best = prev[(y as usize) * (width as usize) + x as usize];
    let mut best_dist = best.map_or(f32::INFINITY, |p| p.dist_sq(px, py));
    for (dx, dy) in NEIGHBORS {
        let nx = x as i64 + dx as i64 * offset as i64;
        let ny = y as i64 + dy as i64 * offset as i64;
        if nx < 0 || ny < 0 || nx >= w || ny >= h {
            continue;
        }
        if let Some(candidate) = prev[(ny as usize) * (width as usize) + nx as usize] {
            let d = candidate.dist_sq(px, py);
            if d < best_dist {
                best_dist = d;
                best = Some(candidate);
            }
        }
    }
    best
}

/// Sequential reference propagation: one ping-pong pass per entry of `offsets`.
pub fn propagate(edges: EdgeMap, offsets: &[u32]) -> EdgeMap {
    let EdgeMap {
        width,
        height,
        seeds,
    } = edges;
    let mut front = seeds;
    let mut back = vec![None; front.len()];
    for &offset in offsets {
        for (i, slot) in back.iter_mut().enumerate() {
            let x = (i % width as usize) as u32;
            let y = (i / width as usize) as u32;
            *slot = jump_at(&front, width, height, x, y, offset);
        }
        std::mem::swap(&mut front, &mut back);
    }
    EdgeMap {
        width,
        height,
        seeds: front,
    }
}
