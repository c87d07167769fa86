use crate::model::Rect;
use crate::sdf::DistanceField;
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};

/// Padded per-sprite sub-image, the unit of distance field generation.
#[derive(Debug, Clone)]
pub struct WorkingRegion {
    pub image: RgbaImage,
    /// Top-left corner of the region in source coordinates; negative when the padding reaches
    /// past the source edge.
    pub origin: (i64, i64),
    /// Padding added on every side.
    pub padding: u32,
    /// The sprite rectangle the region was cut around.
    pub sprite: Rect,
}

impl WorkingRegion {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Decodes any source image into an owned RGBA8 copy.
pub fn copy_source_image(source: &DynamicImage) -> RgbaImage {
    source.to_rgba8()
}

/// Dimensions of a `width x height` image after scaling by `scale` (never below 1x1).
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> (u32, u32) {
    if scale >= 1.0 {
        return (width, height);
    }
    let w = ((width as f32 * scale).round() as u32).max(1);
    let h = ((height as f32 * scale).round() as u32).max(1);
    (w, h)
}

/// Down-scales `image` by `scale`; scales of 1 or more return an unchanged copy.
pub fn resize_image(image: &RgbaImage, scale: f32) -> RgbaImage {
    let (w, h) = scaled_dimensions(image.width(), image.height(), scale);
    if (w, h) == image.dimensions() {
        return image.clone();
    }
    image::imageops::resize(image, w, h, FilterType::Triangle)
}

/// Copies `rect` expanded by `border_offset` on every side out of `source`.
/// Samples falling outside the source are fully transparent.
pub fn create_working_region(source: &RgbaImage, rect: Rect, border_offset: u32) -> WorkingRegion {
    let (sw, sh) = (source.width() as i64, source.height() as i64);
    let pad = border_offset as i64;
    let origin = (rect.x as i64 - pad, rect.y as i64 - pad);
    let w = rect.w + border_offset * 2;
    let h = rect.h + border_offset * 2;

    let mut image = RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 0]));
    for yy in 0..h {
        let sy = origin.1 + yy as i64;
        if sy < 0 || sy >= sh {
            continue;
        }
        for xx in 0..w {
            let sx = origin.0 + xx as i64;
            if sx < 0 || sx >= sw {
                continue;
            }
            image.put_pixel(xx, yy, *source.get_pixel(sx as u32, sy as u32));
        }
    }
    WorkingRegion {
        image,
        origin,
        padding: border_offset,
        sprite: rect,
    }
}

/// Writes the quantized field into the alpha channel of the region's own colors.
pub fn extract_result(region: &WorkingRegion, field: &DistanceField) -> RgbaImage {
    let mut out = region.image.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        px[3] = DistanceField::to_u8(field.get(x, y));
    }
    out
}
