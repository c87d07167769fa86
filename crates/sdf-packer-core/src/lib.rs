//! Core library for generating signed distance field sprite atlases.
//!
//! - Algorithm: sub-pixel edge detection, jump flood propagation and finalization (`sdf`)
//! - Backends: data-parallel CPU (default) and raster GPU (`gpu` feature) behind `SdfBackend`
//! - Pipeline: `generate_atlas` / `SdfGenerator::run` take a source image plus sprite rects and
//!   return one packed atlas with per-sprite placements, UVs, borders and pivots
//! - Data model is serde-serializable; `export::to_json` gives the metadata document.
//!
//! Quick example:
//! ```ignore
//! use image::ImageReader;
//! use sdf_packer_core::prelude::*;
//! # fn main() -> anyhow::Result<()> {
//! let source = ImageReader::open("sprites.png")?.decode()?;
//! let sprites = vec![
//!   SpriteRect::new("coin", Rect::new(0, 0, 32, 32)),
//!   SpriteRect::new("gem", Rect::new(32, 0, 24, 40)).with_pivot(0.5, 0.0),
//! ];
//! let settings = GenerationSettings::builder().backend(BackendKind::Cpu).build();
//! let out = generate_atlas(&source, &sprites, &settings, AtlasConfig::default())?;
//! out.packed_image.save("atlas.png")?;
//! println!("{}", out.stats().summary());
//! # Ok(()) }
//! ```

pub mod atlas;
pub mod backend;
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod packer;
pub mod pipeline;
pub mod region;
pub mod sdf;

pub use atlas::*;
pub use backend::{Generation, SdfBackend, create_backend, gpu_available};
pub use config::*;
pub use error::*;
pub use export::*;
pub use model::*;
pub use pipeline::*;

/// Convenience prelude for common types and functions.
/// Importing `sdf_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::atlas::{AtlasResult, SpriteField, pack_fields};
    pub use crate::backend::{CpuBackend, Generation, SdfBackend, create_backend, gpu_available};
    pub use crate::config::{
        AtlasConfig, AtlasConfigBuilder, BackendKind, GenerationSettings,
        GenerationSettingsBuilder, MaxRectsHeuristic, PackAlgorithm, SortOrder,
    };
    pub use crate::model::{AtlasLayout, AtlasMeta, Border, PackStats, Placement, Rect, SpriteRect};
    pub use crate::region::WorkingRegion;
    pub use crate::sdf::{DistanceField, SolidityMask};
    pub use crate::{SdfGenerator, generate_atlas, resolve_gradient_px};
    pub use crate::{SdfPackerError, from_json, to_json};
}
