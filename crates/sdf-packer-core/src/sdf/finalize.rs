use super::{DistanceField, EdgeMap, Point, SolidityMask};

/// Normalized signed distance for one pixel.
///
/// `clamp(0.5 + d * (solid ? 1 : -1) / gradient_px, 0, 1)` where `d` is the distance from the pixel
/// to its resolved boundary point. A pixel without one (uniform region) saturates to 1 or 0.
pub fn distance_value(solid: bool, x: u32, y: u32, seed: Option<Point>, gradient_px: f32) -> f32 {
    let d = seed.map_or(f32::INFINITY, |p| p.dist_sq(x as f32, y as f32).sqrt());
    let signed = if solid { d } else { -d };
    (0.5 + signed / gradient_px).clamp(0.0, 1.0)
}

/// Runs `distance_value` over every pixel, row by row.
pub fn finalize(mask: &SolidityMask, seeds: &EdgeMap, gradient_px: f32) -> DistanceField {
    let values = (0..mask.len())
        .map(|i| {
            let (x, y) = mask.coords(i);
            distance_value(mask.is_solid(x, y), x, y, seeds.seeds[i], gradient_px)
        })
        .collect();
    DistanceField {
        width: mask.width,
        height: mask.height,
        values,
    }
}
