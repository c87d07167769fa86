use crate::config::BackendKind;
use crate::model::Rect;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdfPackerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(
        "Sprite #{index} '{name}' ({rect:?}) lies outside the {image_width}x{image_height} source image"
    )]
    SpriteOutOfBounds {
        index: usize,
        name: String,
        rect: Rect,
        image_width: u32,
        image_height: u32,
    },
    #[error("Sprite inputs do not line up with the sprite list: {0}")]
    InputMismatch(String),
    #[error("{backend} backend unavailable: {reason}; use the CPU backend instead")]
    BackendUnavailable { backend: BackendKind, reason: String },
    #[error("Generation deferred: {0}")]
    NotReady(String),
    #[error(
        "Out of space: placed {placed} of {total} sprites within the maximum atlas size; did not fit: {}",
        .unplaced.join(", ")
    )]
    OutOfSpace {
        placed: usize,
        total: usize,
        unplaced: Vec<String>,
    },
    #[error("Sprite #{index} '{name}': {source}")]
    Sprite {
        index: usize,
        name: String,
        #[source]
        source: Box<SdfPackerError>,
    },
    #[error("Nothing to generate")]
    Empty,
    #[error("Distance field generation is disabled in the settings")]
    GenerationDisabled,
    #[error("GPU error: {0}")]
    Gpu(String),
}

pub type Result<T> = std::result::Result<T, SdfPackerError>;
