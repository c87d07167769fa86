use crate::config::{AtlasConfig, BackendKind, GenerationSettings};
use serde::{Deserialize, Serialize};

/// Current layout of the serialized metadata. Bumped on breaking changes.
pub const SCHEMA_VERSION: &str = "2";

/// Axis-aligned rectangle (pixels). `x,y` is top-left; `w,h` are sizes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }
    /// Inclusive right edge coordinate (`x + w - 1`).
    pub fn right(&self) -> u32 {
        self.x + self.w.saturating_sub(1)
    }
    /// Inclusive bottom edge coordinate (`y + h - 1`).
    pub fn bottom(&self) -> u32 {
        self.y + self.h.saturating_sub(1)
    }
    /// Returns true if `r` is fully inside `self` (inclusive edges).
    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }
    /// Returns true if the two rectangles share at least one pixel.
    pub fn intersects(&self, r: &Rect) -> bool {
        !(self.x >= r.x + r.w
            || r.x >= self.x + self.w
            || self.y >= r.y + r.h
            || r.y >= self.y + self.h)
    }
    pub fn area(&self) -> u64 {
        (self.w as u64) * (self.h as u64)
    }
}

/// 9-slice border in pixels, measured inward from each edge of the sprite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Border {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl Border {
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    pub fn is_valid(&self) -> bool {
        [self.left, self.bottom, self.right, self.top]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
    }

    /// Scales every edge and then grows it by `padding` pixels.
    pub fn scaled_padded(&self, sx: f32, sy: f32, padding: f32) -> Self {
        Self {
            left: self.left * sx + padding,
            bottom: self.bottom * sy + padding,
            right: self.right * sx + padding,
            top: self.top * sy + padding,
        }
    }
}

fn default_pivot() -> [f32; 2] {
    [0.5, 0.5]
}

/// A sprite sub-rectangle of the source image.
///
/// `pivot` is normalized to the rect (0..1, origin bottom-left); `border` is in source pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteRect {
    pub name: String,
    pub rect: Rect,
    #[serde(default = "default_pivot")]
    pub pivot: [f32; 2],
    #[serde(default)]
    pub border: Border,
}

impl SpriteRect {
    pub fn new(name: impl Into<String>, rect: Rect) -> Self {
        Self {
            name: name.into(),
            rect,
            pivot: default_pivot(),
            border: Border::default(),
        }
    }

    pub fn with_pivot(mut self, x: f32, y: f32) -> Self {
        self.pivot = [x, y];
        self
    }

    pub fn with_border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    /// Maps the rect into an image resized by `scale` (`scaled_w x scaled_h`).
    /// Position floors, size rounds (at least one pixel), and the result is clamped to the image.
    pub fn scaled_rect(&self, scale: f32, scaled_w: u32, scaled_h: u32) -> Rect {
        if scale >= 1.0 {
            return self.rect;
        }
        let x = ((self.rect.x as f32 * scale).floor() as u32).min(scaled_w.saturating_sub(1));
        let y = ((self.rect.y as f32 * scale).floor() as u32).min(scaled_h.saturating_sub(1));
        let w = ((self.rect.w as f32 * scale).round() as u32)
            .max(1)
            .min(scaled_w - x);
        let h = ((self.rect.h as f32 * scale).round() as u32)
            .max(1)
            .min(scaled_h - y);
        Rect::new(x, y, w, h)
    }
}

/// Where one sprite's distance field ended up inside the atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    /// Index of the sprite in the input list.
    pub sprite_index: usize,
    pub name: String,
    /// Content rectangle within the atlas (padding and extrusion excluded).
    pub rect: Rect,
    /// Top-left origin UVs of `rect`.
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
    /// Border in atlas pixels (scaled and grown by the working-region padding).
    pub border: Border,
    /// Pivot normalized to `rect`.
    pub pivot: [f32; 2],
    /// Gradient width used for this sprite, in atlas pixels.
    pub gradient_px: f32,
    /// `gradient_px` relative to the larger side of the padded region.
    pub gradient_uv: f32,
}

impl Placement {
    /// Inverts the UV mapping back into a pixel rectangle of a `width x height` atlas.
    pub fn rect_from_uv(&self, width: u32, height: u32) -> Rect {
        let x0 = (self.uv_min[0] * width as f32).round() as u32;
        let y0 = (self.uv_min[1] * height as f32).round() as u32;
        let x1 = (self.uv_max[0] * width as f32).round() as u32;
        let y1 = (self.uv_max[1] * height as f32).round() as u32;
        Rect::new(x0, y0, x1.saturating_sub(x0), y1.saturating_sub(y0))
    }
}

/// Atlas-level metadata, including what is needed to decide whether a stored atlas is stale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasMeta {
    pub schema_version: String,
    pub app: String,
    pub version: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub backend: BackendKind,
    pub settings: GenerationSettings,
    /// Packing options the atlas was laid out with.
    pub atlas: AtlasConfig,
    /// Sprite list the atlas was generated from, in input order.
    pub sprites: Vec<SpriteRect>,
}

/// Serializable part of a generation run: per-sprite placements in input order plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasLayout {
    pub placements: Vec<Placement>,
    pub meta: AtlasMeta,
}

impl AtlasLayout {
    /// True when an atlas produced earlier can be reused as-is: same schema and generator
    /// version, same settings and packing options, and the same sprites (names, rects, pivots and
    /// borders) in the same order.
    pub fn is_current(
        &self,
        settings: &GenerationSettings,
        atlas: &AtlasConfig,
        sprites: &[SpriteRect],
    ) -> bool {
        self.meta.schema_version == SCHEMA_VERSION
            && self.meta.version == env!("CARGO_PKG_VERSION")
            && self.meta.settings == *settings
            && self.meta.atlas == *atlas
            && self.meta.sprites == sprites
            && self.placements.len() == sprites.len()
    }

    /// Computes packing statistics for this atlas.
    pub fn stats(&self) -> PackStats {
        let page_area = (self.meta.width as u64) * (self.meta.height as u64);
        let used_area: u64 = self.placements.iter().map(|p| p.rect.area()).sum();
        let occupancy = if page_area > 0 {
            used_area as f64 / page_area as f64
        } else {
            0.0
        };
        PackStats {
            num_sprites: self.placements.len(),
            page_area,
            used_area,
            occupancy,
        }
    }
}

/// Statistics about atlas packing efficiency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PackStats {
    pub num_sprites: usize,
    /// Atlas width * height.
    pub page_area: u64,
    /// Sum of placement areas.
    pub used_area: u64,
    /// used_area / page_area (0.0 to 1.0).
    pub occupancy: f64,
}

impl PackStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Sprites: {}, Occupancy: {:.2}%, Atlas Area: {} px², Used Area: {} px²",
            self.num_sprites,
            self.occupancy * 100.0,
            self.page_area,
            self.used_area,
        )
    }

    /// Returns wasted space in pixels.
    pub fn wasted_area(&self) -> u64 {
        self.page_area.saturating_sub(self.used_area)
    }
}
