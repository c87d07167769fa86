use crate::atlas::{self, AtlasResult, SpriteField};
use crate::backend::{self, Generation, SdfBackend};
use crate::config::{AtlasConfig, BackendKind, GenerationSettings};
use crate::error::{Result, SdfPackerError};
use crate::model::SpriteRect;
use crate::region;
use image::DynamicImage;
use tracing::{debug, info, instrument};

/// Gradient width in pixels of the (possibly down-scaled) working region for `sprite`.
///
/// `gradient_size` is a fraction of the sprite's larger side in source pixels; the result is
/// expressed in generation pixels, so it shrinks with `resolution_scale`.
pub fn resolve_gradient_px(settings: &GenerationSettings, sprite: &SpriteRect) -> f32 {
    let max_side = sprite.rect.w.max(sprite.rect.h) as f32;
    settings.gradient_size * max_side * settings.resolution_scale
}

/// Checks every sprite against the source bounds and its own invariants.
pub fn validate_sprites(sprites: &[SpriteRect], width: u32, height: u32) -> Result<()> {
    for (index, sprite) in sprites.iter().enumerate() {
        let r = sprite.rect;
        if r.w == 0 || r.h == 0 {
            return Err(SdfPackerError::InvalidInput(format!(
                "sprite #{index} '{}' has an empty rect",
                sprite.name
            )));
        }
        let inside = (r.x as u64 + r.w as u64) <= width as u64
            && (r.y as u64 + r.h as u64) <= height as u64;
        if !inside {
            return Err(SdfPackerError::SpriteOutOfBounds {
                index,
                name: sprite.name.clone(),
                rect: r,
                image_width: width,
                image_height: height,
            });
        }
        if !sprite.border.is_valid() {
            return Err(SdfPackerError::InvalidInput(format!(
                "sprite #{index} '{}' has a negative or non-finite border",
                sprite.name
            )));
        }
    }
    Ok(())
}

fn check_inputs(
    source: &DynamicImage,
    sprites: &[SpriteRect],
    settings: &GenerationSettings,
) -> Result<()> {
    settings.validate()?;
    if !settings.generate {
        return Err(SdfPackerError::GenerationDisabled);
    }
    if sprites.is_empty() {
        return Err(SdfPackerError::Empty);
    }
    let (w, h) = (source.width(), source.height());
    if w == 0 || h == 0 {
        return Err(SdfPackerError::InvalidDimensions {
            width: w,
            height: h,
        });
    }
    validate_sprites(sprites, w, h)
}

/// Drives one generation request: working regions, per-sprite distance fields, then packing.
pub struct SdfGenerator {
    backend: Box<dyn SdfBackend>,
    atlas: AtlasConfig,
}

impl std::fmt::Debug for SdfGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdfGenerator")
            .field("backend", &self.backend.kind())
            .field("atlas", &self.atlas)
            .finish()
    }
}

impl SdfGenerator {
    /// Creates the backend named by `settings.backend` (resolving `Auto`).
    pub fn new(settings: &GenerationSettings, atlas: AtlasConfig) -> Result<Self> {
        let backend = backend::create_backend(settings.backend)?;
        Ok(Self { backend, atlas })
    }

    pub fn with_backend(backend: Box<dyn SdfBackend>, atlas: AtlasConfig) -> Self {
        Self { backend, atlas }
    }

    pub fn initialize(&mut self) -> Result<()> {
        self.backend.initialize()
    }

    pub fn teardown(&mut self) {
        self.backend.teardown();
    }

    /// The backend actually in use (never `Auto`).
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn atlas_config(&self) -> &AtlasConfig {
        &self.atlas
    }

    /// Generates and packs a distance field for every sprite of `source`.
    ///
    /// Returns `Deferred` without a partial atlas when the backend is not ready; the same call
    /// can be repeated after `initialize`.
    #[instrument(skip_all, fields(sprites = sprites.len(), backend = %self.backend.kind()))]
    pub fn run(
        &self,
        source: &DynamicImage,
        sprites: &[SpriteRect],
        settings: &GenerationSettings,
    ) -> Generation<AtlasResult> {
        if let Err(e) = check_inputs(source, sprites, settings) {
            return Generation::Failed(e);
        }

        let copy = self.backend.copy_source_image(source);
        let scaled = self.backend.resize_image(&copy, settings.resolution_scale);
        let (sw, sh) = scaled.dimensions();
        let border = settings.scaled_border_offset();
        debug!(width = sw, height = sh, border, "source prepared");

        let mut fields = Vec::with_capacity(sprites.len());
        for (index, sprite) in sprites.iter().enumerate() {
            let rect = sprite.scaled_rect(settings.resolution_scale, sw, sh);
            let region = self.backend.create_working_region(&scaled, rect, border);
            let gradient_px = resolve_gradient_px(settings, sprite);
            let field = match self.backend.generate(&region, gradient_px) {
                Generation::Ready(field) => field,
                Generation::Deferred(reason) => {
                    info!(index, name = %sprite.name, %reason, "generation deferred");
                    return Generation::Deferred(reason);
                }
                Generation::Failed(e) => {
                    return Generation::Failed(SdfPackerError::Sprite {
                        index,
                        name: sprite.name.clone(),
                        source: Box::new(e),
                    });
                }
            };
            fields.push(SpriteField {
                name: sprite.name.clone(),
                image: self.backend.extract_result(&region, &field),
                padding: region.padding,
                scale: settings.resolution_scale,
                gradient_px,
            });
        }

        atlas::pack_fields(fields, sprites, &self.atlas, settings, self.backend.kind())
            .inspect(|r| info!(stats = %r.stats().summary(), "atlas packed"))
            .into()
    }
}

/// One-shot helper: builds the backend, initializes it, runs, and tears it down again.
#[instrument(skip_all, fields(sprites = sprites.len()))]
pub fn generate_atlas(
    source: &DynamicImage,
    sprites: &[SpriteRect],
    settings: &GenerationSettings,
    atlas: AtlasConfig,
) -> Result<AtlasResult> {
    settings.validate()?;
    if !settings.generate {
        return Err(SdfPackerError::GenerationDisabled);
    }
    let mut generator = SdfGenerator::new(settings, atlas)?;
    generator.initialize()?;
    let out = generator.run(source, sprites, settings).into_result();
    generator.teardown();
    out
}

/// Working-region size a sprite will get under `settings`, without generating anything.
pub fn planned_region_size(
    settings: &GenerationSettings,
    sprite: &SpriteRect,
    source_width: u32,
    source_height: u32,
) -> (u32, u32) {
    let (sw, sh) =
        region::scaled_dimensions(source_width, source_height, settings.resolution_scale);
    let rect = sprite.scaled_rect(settings.resolution_scale, sw, sh);
    let border = settings.scaled_border_offset();
    (rect.w + border * 2, rect.h + border * 2)
}
