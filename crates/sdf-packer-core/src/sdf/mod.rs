//! Backend-agnostic pieces of the distance field algorithm.
//!
//! Every function here works on a single pixel (or a sequential sweep of them) and reads only
//! immutable inputs, so a backend is free to schedule the per-pixel calls however it likes.
//! Pixel `(x, y)` sits at coordinate `(x as f32, y as f32)`.

use image::RgbaImage;

pub mod edge;
pub mod finalize;
pub mod jump_flood;

pub use edge::{detect_edges, edge_at};
pub use finalize::{distance_value, finalize};
pub use jump_flood::{jump_at, jump_offsets, propagate};

/// Alpha at or above this fraction counts as solid.
pub const ALPHA_THRESHOLD: f32 = 0.5;

/// A sub-pixel position in region coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn dist_sq(&self, x: f32, y: f32) -> f32 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

/// Normalized alpha of a working region, the sole solidity signal.
#[derive(Debug, Clone)]
pub struct SolidityMask {
    pub width: u32,
    pub height: u32,
    alpha: Vec<f32>,
}

impl SolidityMask {
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let alpha = image.pixels().map(|p| p[3] as f32 / 255.0).collect();
        Self {
            width,
            height,
            alpha,
        }
    }

    /// Builds a mask straight from normalized alpha values (row-major).
    pub fn from_alpha(width: u32, height: u32, alpha: Vec<f32>) -> Self {
        debug_assert_eq!(alpha.len(), (width as usize) * (height as usize));
        Self {
            width,
            height,
            alpha,
        }
    }

    pub fn len(&self) -> usize {
        self.alpha.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alpha.is_empty()
    }

    pub fn alpha(&self, x: u32, y: u32) -> f32 {
        self.alpha[self.index(x, y)]
    }

    pub fn is_solid(&self, x: u32, y: u32) -> bool {
        self.alpha(x, y) >= ALPHA_THRESHOLD
    }

    pub fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    /// Inverse of `index`.
    pub fn coords(&self, i: usize) -> (u32, u32) {
        let w = self.width as usize;
        ((i % w) as u32, (i / w) as u32)
    }
}

/// Per-pixel nearest boundary candidate; `None` means no boundary is known yet.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeMap {
    pub width: u32,
    pub height: u32,
    pub seeds: Vec<Option<Point>>,
}

impl EdgeMap {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            seeds: vec![None; (width as usize) * (height as usize)],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Point> {
        self.seeds[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Number of pixels that carry a boundary candidate.
    pub fn seeded(&self) -> usize {
        self.seeds.iter().filter(|s| s.is_some()).count()
    }
}

/// Normalized signed distance per pixel: 0.5 on the boundary, above inside, below outside.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceField {
    pub width: u32,
    pub height: u32,
    pub values: Vec<f32>,
}

impl DistanceField {
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.values[(y as usize) * (self.width as usize) + x as usize]
    }

    /// Quantizes a field value to 8 bits.
    pub fn to_u8(v: f32) -> u8 {
        (v.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn quantized(&self) -> Vec<u8> {
        self.values.iter().map(|v| Self::to_u8(*v)).collect()
    }
}
