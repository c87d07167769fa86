use crate::compositing::blit_extruded;
use crate::config::{
    AtlasConfig, BackendKind, GenerationSettings, MaxRectsHeuristic, PackAlgorithm, SortOrder,
};
use crate::error::{Result, SdfPackerError};
use crate::model::{
    AtlasLayout, AtlasMeta, PackStats, Placement, Rect, SCHEMA_VERSION, SpriteRect,
};
use crate::packer::{GuillotinePacker, MaxRectsPacker, Packer, ShelfPacker};
use image::RgbaImage;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One generated distance field waiting to be packed, in sprite-list order.
#[derive(Debug, Clone)]
pub struct SpriteField {
    pub name: String,
    /// Working-region colors with the distance field in alpha.
    pub image: RgbaImage,
    /// Padding the working region added on every side (after scaling).
    pub padding: u32,
    /// Resolution scale the field was generated at.
    pub scale: f32,
    /// Gradient width the field was generated with, in its own pixels.
    pub gradient_px: f32,
}

/// Packed atlas image plus its layout.
#[derive(Debug, Clone)]
pub struct AtlasResult {
    pub packed_image: RgbaImage,
    pub layout: AtlasLayout,
}

impl AtlasResult {
    pub fn stats(&self) -> PackStats {
        self.layout.stats()
    }

    /// Cuts the content of placement `index` back out of the packed image.
    pub fn sprite_image(&self, index: usize) -> Option<RgbaImage> {
        let p = self.layout.placements.get(index)?;
        let r = p.rect;
        Some(image::imageops::crop_imm(&self.packed_image, r.x, r.y, r.w, r.h).to_image())
    }
}

/// Checks that `fields` and `sprites` line up one to one, in the same order.
pub fn check_correspondence(fields: &[SpriteField], sprites: &[SpriteRect]) -> Result<()> {
    if fields.len() != sprites.len() {
        return Err(SdfPackerError::InputMismatch(format!(
            "{} distance fields for {} sprite rects",
            fields.len(),
            sprites.len()
        )));
    }
    let mismatched: Vec<String> = fields
        .iter()
        .zip(sprites)
        .enumerate()
        .filter(|(_, (f, s))| f.name != s.name)
        .map(|(i, (f, s))| format!("#{i}: field '{}' vs sprite '{}'", f.name, s.name))
        .collect();
    if !mismatched.is_empty() {
        return Err(SdfPackerError::InputMismatch(mismatched.join(", ")));
    }
    Ok(())
}

fn packing_order(sizes: &[(u32, u32)], order: &SortOrder) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..sizes.len()).collect();
    let area = |i: usize| sizes[i].0 as u64 * sizes[i].1 as u64;
    match order {
        SortOrder::None => {}
        SortOrder::AreaDesc => idx.sort_by(|&a, &b| area(b).cmp(&area(a)).then(a.cmp(&b))),
        SortOrder::MaxSideDesc => idx.sort_by(|&a, &b| {
            let ma = sizes[a].0.max(sizes[a].1);
            let mb = sizes[b].0.max(sizes[b].1);
            mb.cmp(&ma).then(a.cmp(&b))
        }),
        SortOrder::HeightDesc => {
            idx.sort_by(|&a, &b| sizes[b].1.cmp(&sizes[a].1).then(a.cmp(&b)))
        }
    }
    idx
}

fn next_pow2(v: u32) -> u32 {
    v.max(1).next_power_of_two()
}

/// Final page size for content frames `frames`, never larger than the configured maximum.
pub fn compute_page_size(frames: &[Rect], cfg: &AtlasConfig) -> (u32, u32) {
    if cfg.force_max_dimensions {
        return (cfg.max_width, cfg.max_height);
    }
    let pad_rem = cfg.texture_padding - cfg.texture_padding / 2;
    let extra = cfg.texture_extrusion + pad_rem + cfg.border_padding;
    let mut page_w = 0u32;
    let mut page_h = 0u32;
    for f in frames {
        page_w = page_w.max(f.right() + 1 + extra);
        page_h = page_h.max(f.bottom() + 1 + extra);
    }
    if cfg.power_of_two {
        page_w = next_pow2(page_w);
        page_h = next_pow2(page_h);
    }
    if cfg.square {
        let m = page_w.max(page_h);
        page_w = m;
        page_h = m;
    }
    (page_w.min(cfg.max_width), page_h.min(cfg.max_height))
}

/// Layout of one packing attempt: content frames indexed like the input sizes, plus page size.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub frames: Vec<Rect>,
    pub width: u32,
    pub height: u32,
}

impl PageLayout {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

fn make_packer(cfg: &AtlasConfig) -> Box<dyn Packer<usize>> {
    match cfg.family {
        PackAlgorithm::Shelf => Box::new(ShelfPacker::new(cfg.clone())),
        PackAlgorithm::Guillotine => Box::new(GuillotinePacker::new(cfg.clone())),
        PackAlgorithm::MaxRects | PackAlgorithm::Auto => {
            Box::new(MaxRectsPacker::new(cfg.clone(), cfg.mr_heuristic.clone()))
        }
    }
}

/// Packs every size with one family. `Err` carries the indices that did not fit.
fn layout_single(
    sizes: &[(u32, u32)],
    cfg: &AtlasConfig,
) -> std::result::Result<PageLayout, Vec<usize>> {
    let mut packer = make_packer(cfg);
    let mut frames: Vec<Option<Rect>> = vec![None; sizes.len()];
    for i in packing_order(sizes, &cfg.sort_order) {
        let (w, h) = sizes[i];
        if !packer.can_pack(w, h) {
            continue;
        }
        if let Some(slot) = packer.pack(i, w, h) {
            frames[slot.key] = Some(slot.frame);
        }
    }
    let unplaced: Vec<usize> = (0..sizes.len()).filter(|&i| frames[i].is_none()).collect();
    if !unplaced.is_empty() {
        return Err(unplaced);
    }
    let frames: Vec<Rect> = frames.into_iter().flatten().collect();
    let (width, height) = compute_page_size(&frames, cfg);
    Ok(PageLayout {
        frames,
        width,
        height,
    })
}

fn portfolio(base: &AtlasConfig) -> Vec<AtlasConfig> {
    let with = |family: PackAlgorithm, heuristic: MaxRectsHeuristic| {
        let mut c = base.clone();
        c.family = family;
        c.mr_heuristic = heuristic;
        c
    };
    vec![
        with(PackAlgorithm::MaxRects, MaxRectsHeuristic::BestAreaFit),
        with(PackAlgorithm::MaxRects, MaxRectsHeuristic::BestShortSideFit),
        with(PackAlgorithm::MaxRects, MaxRectsHeuristic::BottomLeft),
        with(PackAlgorithm::Guillotine, base.mr_heuristic.clone()),
        with(PackAlgorithm::Shelf, base.mr_heuristic.clone()),
    ]
}

/// Lays out rectangles of `sizes` on one page. `Auto` tries every family and keeps the smallest
/// page (earliest candidate on ties).
///
/// Rectangles that do not fit are reported by input index in `OutOfSpace::unplaced`.
pub fn layout_sizes(sizes: &[(u32, u32)], cfg: &AtlasConfig) -> Result<PageLayout> {
    layout_labeled(sizes, cfg, |i| format!("#{i}"))
}

fn layout_labeled(
    sizes: &[(u32, u32)],
    cfg: &AtlasConfig,
    label: impl Fn(usize) -> String,
) -> Result<PageLayout> {
    cfg.validate()?;
    if sizes.is_empty() {
        return Err(SdfPackerError::Empty);
    }
    let out_of_space = |unplaced: Vec<usize>| SdfPackerError::OutOfSpace {
        placed: sizes.len() - unplaced.len(),
        total: sizes.len(),
        unplaced: unplaced.into_iter().map(&label).collect(),
    };
    if !matches!(cfg.family, PackAlgorithm::Auto) {
        return layout_single(sizes, cfg).map_err(out_of_space);
    }

    let candidates = portfolio(cfg);
    #[cfg(feature = "parallel")]
    let results: Vec<_> = candidates.par_iter().map(|c| layout_single(sizes, c)).collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = candidates.iter().map(|c| layout_single(sizes, c)).collect();

    let mut best: Option<PageLayout> = None;
    let mut fewest_unplaced: Option<Vec<usize>> = None;
    for r in results {
        match r {
            Ok(layout) => {
                if best.as_ref().is_none_or(|b| layout.area() < b.area()) {
                    best = Some(layout);
                }
            }
            Err(unplaced) => {
                if fewest_unplaced.as_ref().is_none_or(|f| unplaced.len() < f.len()) {
                    fewest_unplaced = Some(unplaced);
                }
            }
        }
    }
    match best {
        Some(layout) => Ok(layout),
        None => Err(out_of_space(fewest_unplaced.unwrap_or_default())),
    }
}

/// Packs the per-sprite distance fields into one atlas.
///
/// `fields[i]` must belong to `sprites[i]`; any count or name mismatch aborts with
/// `InputMismatch` before anything is packed. Placements come back in sprite order regardless of
/// the packing order.
#[instrument(skip_all, fields(sprites = sprites.len()))]
pub fn pack_fields(
    fields: Vec<SpriteField>,
    sprites: &[SpriteRect],
    cfg: &AtlasConfig,
    settings: &GenerationSettings,
    backend: BackendKind,
) -> Result<AtlasResult> {
    check_correspondence(&fields, sprites)?;
    let sizes: Vec<(u32, u32)> = fields.iter().map(|f| f.image.dimensions()).collect();
    let page = layout_labeled(&sizes, cfg, |i| format!("#{i} '{}'", sprites[i].name))?;
    debug!(width = page.width, height = page.height, "atlas laid out");

    let mut canvas = RgbaImage::new(page.width, page.height);
    let (aw, ah) = (page.width as f32, page.height as f32);
    let mut placements = Vec::with_capacity(fields.len());
    let items = fields.iter().zip(sprites).zip(&page.frames);
    for (i, ((field, sprite), frame)) in items.enumerate() {
        blit_extruded(&field.image, &mut canvas, frame.x, frame.y, cfg.texture_extrusion);

        let pad = field.padding as f32;
        let (rw, rh) = (frame.w as f32, frame.h as f32);
        // content size is the scaled, rounded sprite rect the region was cut around
        let content_w = frame.w.saturating_sub(field.padding * 2) as f32;
        let content_h = frame.h.saturating_sub(field.padding * 2) as f32;
        let pivot = [
            (sprite.pivot[0] * content_w + pad) / rw,
            (sprite.pivot[1] * content_h + pad) / rh,
        ];
        placements.push(Placement {
            sprite_index: i,
            name: sprite.name.clone(),
            rect: *frame,
            uv_min: [frame.x as f32 / aw, frame.y as f32 / ah],
            uv_max: [(frame.x + frame.w) as f32 / aw, (frame.y + frame.h) as f32 / ah],
            border: sprite.border.scaled_padded(field.scale, field.scale, pad),
            pivot,
            gradient_px: field.gradient_px,
            gradient_uv: field.gradient_px / rw.max(rh),
        });
    }

    let layout = AtlasLayout {
        placements,
        meta: AtlasMeta {
            schema_version: SCHEMA_VERSION.into(),
            app: "sdf-packer".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            format: "RGBA8888".into(),
            width: page.width,
            height: page.height,
            backend,
            settings: settings.clone(),
            atlas: cfg.clone(),
            sprites: sprites.to_vec(),
        },
    };
    Ok(AtlasResult {
        packed_image: canvas,
        layout,
    })
}
