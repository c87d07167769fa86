use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Generation settings and atlas packing configuration.
// Key notes:
//   - `GenerationSettings` controls the distance field itself (gradient width, padding, scale, backend)
//   - `AtlasConfig` controls how the per-sprite fields are laid out in the output image

/// Execution substrate for distance field generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// GPU when a device can be created, CPU otherwise.
    Auto,
    /// Data-parallel per-pixel passes on the CPU.
    Cpu,
    /// Full-image raster passes on the GPU.
    Gpu,
}

impl FromStr for BackendKind {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            _ => Err(()),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
        })
    }
}

/// Rectangle packing families used to lay out the atlas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackAlgorithm {
    /// Rows of fixed height; fastest, wastes space on mixed heights.
    Shelf,
    /// Guillotine splitting of free space.
    Guillotine,
    /// MaxRects free-list (best quality).
    MaxRects,
    /// Try every family and keep the smallest atlas.
    Auto,
}

impl FromStr for PackAlgorithm {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "shelf" => Ok(Self::Shelf),
            "guillotine" => Ok(Self::Guillotine),
            "maxrects" => Ok(Self::MaxRects),
            "auto" => Ok(Self::Auto),
            _ => Err(()),
        }
    }
}

/// MaxRects placement heuristics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    BestAreaFit,
    BestShortSideFit,
    BottomLeft,
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "baf" | "bestareafit" => Ok(Self::BestAreaFit),
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "bl" | "bottomleft" => Ok(Self::BottomLeft),
            _ => Err(()),
        }
    }
}

/// Order in which sprites are offered to the packer. Never affects the order of placements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    AreaDesc,
    MaxSideDesc,
    HeightDesc,
    None,
}

impl FromStr for SortOrder {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "area_desc" => Ok(Self::AreaDesc),
            "max_side_desc" => Ok(Self::MaxSideDesc),
            "height_desc" => Ok(Self::HeightDesc),
            "none" => Ok(Self::None),
            _ => Err(()),
        }
    }
}

/// Largest accepted `GenerationSettings::border_offset`, in source pixels.
pub const MAX_BORDER_OFFSET: u32 = 4096;

/// Distance field generation settings supplied by the asset pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationSettings {
    /// Master switch; when false nothing is generated.
    #[serde(default = "default_generate")]
    pub generate: bool,
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Padding (source pixels) added around every sprite before generation.
    #[serde(default = "default_border_offset")]
    pub border_offset: u32,
    /// Down-scaling factor applied to the source before generation, in (0, 1].
    #[serde(default = "default_resolution_scale")]
    pub resolution_scale: f32,
    /// Gradient width as a fraction of the sprite's larger side.
    #[serde(default = "default_gradient_size")]
    pub gradient_size: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            generate: default_generate(),
            backend: default_backend(),
            border_offset: default_border_offset(),
            resolution_scale: default_resolution_scale(),
            gradient_size: default_gradient_size(),
        }
    }
}

impl GenerationSettings {
    /// Validates the settings.
    ///
    /// Returns an error if:
    /// - `gradient_size` is not a positive finite number
    /// - `resolution_scale` is outside (0, 1] (only down-scaling is supported)
    /// - `border_offset` exceeds [`MAX_BORDER_OFFSET`]
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SdfPackerError;

        if !self.gradient_size.is_finite() || self.gradient_size <= 0.0 {
            return Err(SdfPackerError::InvalidConfig(format!(
                "gradient_size must be > 0 (got {})",
                self.gradient_size
            )));
        }
        if !self.resolution_scale.is_finite()
            || self.resolution_scale <= 0.0
            || self.resolution_scale > 1.0
        {
            return Err(SdfPackerError::InvalidConfig(format!(
                "resolution_scale must be in (0, 1] (got {})",
                self.resolution_scale
            )));
        }
        if self.border_offset > MAX_BORDER_OFFSET {
            return Err(SdfPackerError::InvalidConfig(format!(
                "border_offset must be <= {MAX_BORDER_OFFSET} (got {})",
                self.border_offset
            )));
        }
        Ok(())
    }

    /// Border offset after resolution scaling.
    pub fn scaled_border_offset(&self) -> u32 {
        (self.border_offset as f32 * self.resolution_scale).round() as u32
    }

    /// Create a fluent builder for `GenerationSettings`.
    pub fn builder() -> GenerationSettingsBuilder {
        GenerationSettingsBuilder::new()
    }
}

fn default_generate() -> bool {
    true
}
fn default_backend() -> BackendKind {
    BackendKind::Auto
}
fn default_border_offset() -> u32 {
    4
}
fn default_resolution_scale() -> f32 {
    1.0
}
fn default_gradient_size() -> f32 {
    0.1
}

/// Builder for `GenerationSettings`.
#[derive(Debug, Default, Clone)]
pub struct GenerationSettingsBuilder {
    settings: GenerationSettings,
}

impl GenerationSettingsBuilder {
    pub fn new() -> Self {
        Self {
            settings: GenerationSettings::default(),
        }
    }
    pub fn generate(mut self, v: bool) -> Self {
        self.settings.generate = v;
        self
    }
    pub fn backend(mut self, v: BackendKind) -> Self {
        self.settings.backend = v;
        self
    }
    pub fn border_offset(mut self, v: u32) -> Self {
        self.settings.border_offset = v;
        self
    }
    pub fn resolution_scale(mut self, v: f32) -> Self {
        self.settings.resolution_scale = v;
        self
    }
    pub fn gradient_size(mut self, v: f32) -> Self {
        self.settings.gradient_size = v;
        self
    }
    pub fn build(self) -> GenerationSettings {
        self.settings
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AtlasConfig {
    /// Maximum atlas width in pixels.
    pub max_width: u32,
    /// Maximum atlas height in pixels.
    pub max_height: u32,
    /// Force final atlas dimensions to be exactly max_width/max_height.
    #[serde(default)]
    pub force_max_dimensions: bool,

    /// Pixels around the entire atlas.
    #[serde(default)]
    pub border_padding: u32,
    /// Pixels between sprites.
    #[serde(default = "default_texture_padding")]
    pub texture_padding: u32,
    /// Extrude edge pixels of each sprite (for bilinear sampling safety).
    #[serde(default)]
    pub texture_extrusion: u32,

    /// Resize the atlas to power-of-two dimensions.
    #[serde(default)]
    pub power_of_two: bool,
    /// Force the atlas to be square (max(width,height)).
    #[serde(default)]
    pub square: bool,

    #[serde(default = "default_family")]
    pub family: PackAlgorithm,
    #[serde(default = "default_mr_heuristic")]
    pub mr_heuristic: MaxRectsHeuristic,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            max_width: 2048,
            max_height: 2048,
            force_max_dimensions: false,
            border_padding: 0,
            texture_padding: default_texture_padding(),
            texture_extrusion: 0,
            power_of_two: false,
            square: false,
            family: default_family(),
            mr_heuristic: default_mr_heuristic(),
            sort_order: default_sort_order(),
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Dimensions are zero
    /// - Border padding would leave no usable space
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SdfPackerError;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(SdfPackerError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }

        let total_border = self.border_padding.saturating_mul(2);
        if total_border >= self.max_width || total_border >= self.max_height {
            return Err(SdfPackerError::InvalidConfig(format!(
                "border_padding ({}) * 2 exceeds atlas dimensions ({}x{})",
                self.border_padding, self.max_width, self.max_height
            )));
        }
        Ok(())
    }

    /// Size of the slot a `w x h` sprite reserves, padding and extrusion included.
    pub fn reserved_size(&self, w: u32, h: u32) -> (u32, u32) {
        let extra = self.texture_padding + self.texture_extrusion * 2;
        (w + extra, h + extra)
    }

    /// Offset from a reserved slot's corner to the sprite content.
    pub fn content_offset(&self) -> u32 {
        self.texture_extrusion + self.texture_padding / 2
    }

    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}

fn default_texture_padding() -> u32 {
    2
}
fn default_family() -> PackAlgorithm {
    PackAlgorithm::MaxRects
}
fn default_mr_heuristic() -> MaxRectsHeuristic {
    MaxRectsHeuristic::BestAreaFit
}
fn default_sort_order() -> SortOrder {
    SortOrder::AreaDesc
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn force_max_dimensions(mut self, v: bool) -> Self {
        self.cfg.force_max_dimensions = v;
        self
    }
    pub fn border_padding(mut self, v: u32) -> Self {
        self.cfg.border_padding = v;
        self
    }
    pub fn texture_padding(mut self, v: u32) -> Self {
        self.cfg.texture_padding = v;
        self
    }
    pub fn texture_extrusion(mut self, v: u32) -> Self {
        self.cfg.texture_extrusion = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn square(mut self, v: bool) -> Self {
        self.cfg.square = v;
        self
    }
    pub fn family(mut self, v: PackAlgorithm) -> Self {
        self.cfg.family = v;
        self
    }
    pub fn mr_heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.mr_heuristic = v;
        self
    }
    pub fn sort_order(mut self, v: SortOrder) -> Self {
        self.cfg.sort_order = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}
