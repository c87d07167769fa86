use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use image::{DynamicImage, ImageReader};
use serde::{Deserialize, Serialize};
use sdf_packer_core::config::{MaxRectsHeuristic, PackAlgorithm, SortOrder};
use sdf_packer_core::{
    AtlasConfig, AtlasLayout, BackendKind, GenerationSettings, Rect, SpriteRect, from_json,
    generate_atlas, gpu_available, to_json,
};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "sdf-packer",
    about = "Convert sprite sheets into signed distance field atlases",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show a progress spinner (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an SDF atlas (PNG + JSON) from a sprite sheet
    Generate(GenerateArgs),
    /// Report whether a GPU device can be created
    Probe,
}

#[derive(Parser, Debug, Clone)]
struct GenerateArgs {
    // Input/Output
    /// Source sprite sheet image
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// JSON file with the sprite rects ([{"name", "rect": {x,y,w,h}, "pivot", "border"}]).
    /// Without it the whole image is one sprite.
    #[arg(long, help_heading = "Input/Output")]
    sprites: Option<PathBuf>,
    /// Output directory
    #[arg(short, long, default_value = "out", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// Atlas base name (files will be name.png/.json)
    #[arg(short, long, default_value = "atlas", help_heading = "Input/Output")]
    name: String,
    /// YAML config file path (`settings:` and `atlas:` sections override the flags)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Distance field
    /// Backend: auto | cpu | gpu
    #[arg(long, value_parser = ["auto", "cpu", "gpu"], default_value = "auto", help_heading = "Distance Field")]
    backend: String,
    /// Padding added around every sprite before generation (source pixels)
    #[arg(long, default_value_t = 4, help_heading = "Distance Field")]
    border_offset: u32,
    /// Down-scaling factor applied to the source, in (0, 1]
    #[arg(long, default_value_t = 1.0, help_heading = "Distance Field")]
    resolution_scale: f32,
    /// Gradient width as a fraction of each sprite's larger side
    #[arg(long, default_value_t = 0.1, help_heading = "Distance Field")]
    gradient_size: f32,

    // Layout
    /// Max width
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    max_width: u32,
    /// Max height
    #[arg(long, default_value_t = 2048, help_heading = "Layout")]
    max_height: u32,
    /// Force output size to max_width/max_height
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    force_max_dimensions: bool,
    /// Resize page dims to power of two
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    pow2: bool,
    /// Force square page
    #[arg(long, default_value_t = false, help_heading = "Layout")]
    square: bool,
    /// Sort order: area_desc|max_side_desc|height_desc|none
    #[arg(long, default_value = "area_desc", help_heading = "Layout")]
    sort_order: String,
    /// Border padding (around entire page)
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    border_padding: u32,
    /// Padding between frames
    #[arg(long, default_value_t = 2, help_heading = "Layout")]
    texture_padding: u32,
    /// Extrude pixels around each frame
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    texture_extrusion: u32,

    // Algorithms/Heuristics
    /// Algorithm: shelf | guillotine | maxrects | auto
    #[arg(long, value_parser = ["shelf", "guillotine", "maxrects", "auto"], default_value = "maxrects", help_heading = "Algorithms")]
    algorithm: String,
    /// MaxRects heuristic: baf|bssf|bl
    #[arg(long, default_value = "baf", help_heading = "Algorithms")]
    heuristic: String,

    // Export
    /// Regenerate even when the existing JSON layout matches these settings, options and sprites
    #[arg(long, default_value_t = false, help_heading = "Export")]
    force: bool,
    /// Export packing stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: generate and report stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

/// Settings and atlas options after CLI flags and YAML have been merged.
#[derive(Debug, Serialize)]
struct MergedConfig {
    settings: GenerationSettings,
    atlas: AtlasConfig,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Generate(args) => run_generate(args, cli.progress && !cli.quiet),
        Commands::Probe => run_probe(),
    }
}

fn run_generate(cli: &GenerateArgs, show_progress: bool) -> anyhow::Result<()> {
    let mut cfg = MergedConfig {
        settings: build_settings(cli)?,
        atlas: build_atlas_config(cli)?,
    };
    if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse config {}", path.display()))?;
        y.apply(&mut cfg)?;
    }
    cfg.settings.validate()?;
    cfg.atlas.validate()?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }
    if !cfg.settings.generate {
        info!("generation disabled in the settings; nothing to do");
        return Ok(());
    }

    let image = load_image(&cli.input)
        .with_context(|| format!("load image {}", cli.input.display()))?;
    let sprites = match &cli.sprites {
        Some(path) => load_sprites(path)?,
        None => vec![whole_image_sprite(&cli.input, &image)],
    };
    info!(
        count = sprites.len(),
        width = image.width(),
        height = image.height(),
        "loaded sprite sheet"
    );

    let json_path = cli.out_dir.join(format!("{}.json", cli.name));
    let png_path = cli.out_dir.join(format!("{}.png", cli.name));
    if !cli.force && !cli.dry_run && png_path.exists() {
        if let Some(existing) = read_layout(&json_path) {
            if existing.is_current(&cfg.settings, &cfg.atlas, &sprites) {
                info!(?json_path, "atlas is up to date; pass --force to regenerate");
                return Ok(());
            }
            debug!(?json_path, "existing atlas is stale");
        }
    }

    let spinner = show_progress.then(|| {
        use indicatif::{ProgressBar, ProgressStyle};
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} [{elapsed_precise}]") {
            pb.set_style(style);
        }
        pb.set_message(format!("generating {} distance fields", sprites.len()));
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });
    let t0 = Instant::now();
    let result = generate_atlas(&image, &sprites, &cfg.settings, cfg.atlas.clone());
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let out = result.context("generate SDF atlas")?;
    let stats = out.stats();
    info!(
        backend = %out.layout.meta.backend,
        width = out.packed_image.width(),
        height = out.packed_image.height(),
        time = %fmt_dur(t0.elapsed()),
        "{}",
        stats.summary()
    );

    if let Some(stats_path) = &cli.export_stats {
        let v = serde_json::json!({
            "sprites": stats.num_sprites,
            "width": out.packed_image.width(),
            "height": out.packed_image.height(),
            "page_area": stats.page_area,
            "used_area": stats.used_area,
            "wasted_area": stats.wasted_area(),
            "occupancy": stats.occupancy,
            "backend": out.layout.meta.backend,
            "elapsed_ms": t0.elapsed().as_millis() as u64,
        });
        if !cli.dry_run {
            fs::write(stats_path, serde_json::to_string_pretty(&v)?)
                .with_context(|| format!("write stats {}", stats_path.display()))?;
        }
    }

    if cli.dry_run {
        info!("dry run: nothing written");
        return Ok(());
    }

    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("create out_dir {}", cli.out_dir.display()))?;
    out.packed_image
        .save(&png_path)
        .with_context(|| format!("write {}", png_path.display()))?;
    let json = serde_json::to_string_pretty(&to_json(&out.layout))?;
    fs::write(&json_path, json).with_context(|| format!("write {}", json_path.display()))?;
    info!(?png_path, ?json_path, "atlas written");
    Ok(())
}

fn run_probe() -> anyhow::Result<()> {
    println!("cpu: available");
    if !gpu_available() {
        println!("gpu: unavailable (no adapter, or built without the `gpu` feature)");
        return Ok(());
    }
    #[cfg(feature = "gpu")]
    match sdf_packer_core::backend::GpuBackend::new() {
        Ok(gpu) => println!("gpu: available ({})", gpu.adapter_name()),
        Err(e) => println!("gpu: adapter found but no device ({e})"),
    }
    Ok(())
}

fn build_settings(cli: &GenerateArgs) -> anyhow::Result<GenerationSettings> {
    Ok(GenerationSettings::builder()
        .backend(parse_backend(&cli.backend)?)
        .border_offset(cli.border_offset)
        .resolution_scale(cli.resolution_scale)
        .gradient_size(cli.gradient_size)
        .build())
}

fn build_atlas_config(cli: &GenerateArgs) -> anyhow::Result<AtlasConfig> {
    Ok(AtlasConfig::builder()
        .with_max_dimensions(cli.max_width, cli.max_height)
        .force_max_dimensions(cli.force_max_dimensions)
        .pow2(cli.pow2)
        .square(cli.square)
        .border_padding(cli.border_padding)
        .texture_padding(cli.texture_padding)
        .texture_extrusion(cli.texture_extrusion)
        .family(parse_algorithm(&cli.algorithm)?)
        .mr_heuristic(parse_heuristic(&cli.heuristic)?)
        .sort_order(parse_sort_order(&cli.sort_order)?)
        .build())
}

fn load_image(p: &Path) -> anyhow::Result<DynamicImage> {
    let img = ImageReader::open(p)?.with_guessed_format()?.decode()?;
    Ok(img)
}

fn load_sprites(p: &Path) -> anyhow::Result<Vec<SpriteRect>> {
    let text = fs::read_to_string(p).with_context(|| format!("read sprites {}", p.display()))?;
    let sprites: Vec<SpriteRect> =
        serde_json::from_str(&text).with_context(|| format!("parse sprites {}", p.display()))?;
    Ok(sprites)
}

fn whole_image_sprite(path: &Path, image: &DynamicImage) -> SpriteRect {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sprite".into());
    SpriteRect::new(name, Rect::new(0, 0, image.width(), image.height()))
}

/// Reads the layout written by an earlier run; unreadable or foreign JSON counts as absent.
fn read_layout(p: &Path) -> Option<AtlasLayout> {
    let text = fs::read_to_string(p).ok()?;
    let parsed = serde_json::from_str::<serde_json::Value>(&text)
        .map_err(anyhow::Error::from)
        .and_then(|v| from_json(&v).map_err(anyhow::Error::from));
    match parsed {
        Ok(layout) => Some(layout),
        Err(e) => {
            warn!(path = ?p, error = %e, "ignoring unreadable atlas JSON");
            None
        }
    }
}

fn fmt_dur(d: Duration) -> String {
    let ms = d.as_secs_f64() * 1000.0;
    if ms < 1000.0 {
        format!("{ms:.1} ms")
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    settings: Option<YamlSettings>,
    atlas: Option<YamlAtlas>,
}

#[derive(Debug, Deserialize, Default)]
struct YamlSettings {
    generate: Option<bool>,
    backend: Option<String>,
    border_offset: Option<u32>,
    resolution_scale: Option<f32>,
    gradient_size: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
struct YamlAtlas {
    max_width: Option<u32>,
    max_height: Option<u32>,
    force_max_dimensions: Option<bool>,
    border_padding: Option<u32>,
    texture_padding: Option<u32>,
    texture_extrusion: Option<u32>,
    power_of_two: Option<bool>,
    square: Option<bool>,
    family: Option<String>,
    heuristic: Option<String>,
    sort_order: Option<String>,
}

impl YamlConfig {
    fn apply(self, cfg: &mut MergedConfig) -> anyhow::Result<()> {
        if let Some(s) = self.settings {
            let out = &mut cfg.settings;
            if let Some(v) = s.generate {
                out.generate = v;
            }
            if let Some(v) = s.backend {
                out.backend = parse_backend(&v)?;
            }
            if let Some(v) = s.border_offset {
                out.border_offset = v;
            }
            if let Some(v) = s.resolution_scale {
                out.resolution_scale = v;
            }
            if let Some(v) = s.gradient_size {
                out.gradient_size = v;
            }
        }
        if let Some(a) = self.atlas {
            let out = &mut cfg.atlas;
            if let Some(v) = a.max_width {
                out.max_width = v;
            }
            if let Some(v) = a.max_height {
                out.max_height = v;
            }
            if let Some(v) = a.force_max_dimensions {
                out.force_max_dimensions = v;
            }
            if let Some(v) = a.border_padding {
                out.border_padding = v;
            }
            if let Some(v) = a.texture_padding {
                out.texture_padding = v;
            }
            if let Some(v) = a.texture_extrusion {
                out.texture_extrusion = v;
            }
            if let Some(v) = a.power_of_two {
                out.power_of_two = v;
            }
            if let Some(v) = a.square {
                out.square = v;
            }
            if let Some(v) = a.family {
                out.family = parse_algorithm(&v)?;
            }
            if let Some(v) = a.heuristic {
                out.mr_heuristic = parse_heuristic(&v)?;
            }
            if let Some(v) = a.sort_order {
                out.sort_order = parse_sort_order(&v)?;
            }
        }
        Ok(())
    }
}

fn parse_backend(s: &str) -> anyhow::Result<BackendKind> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown backend: {}", s))
}

fn parse_algorithm(s: &str) -> anyhow::Result<PackAlgorithm> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown algorithm: {}", s))
}

fn parse_heuristic(s: &str) -> anyhow::Result<MaxRectsHeuristic> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown maxrects heuristic: {}", s))
}

fn parse_sort_order(s: &str) -> anyhow::Result<SortOrder> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("unknown sort order: {}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config(tag: &str, yaml: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "sdf-packer-cli-{tag}-{}.yaml",
            std::process::id()
        ));
        fs::write(&path, yaml).expect("write config");
        path
    }

    fn args(extra: &[&str]) -> GenerateArgs {
        let mut argv = vec!["generate", "missing-sheet.png"];
        argv.extend_from_slice(extra);
        GenerateArgs::try_parse_from(argv).expect("parse args")
    }

    #[test]
    fn disabled_generation_exits_cleanly() {
        let path = temp_config("disabled", "settings:\n  generate: false\n");
        let cli = args(&["--config", path.to_str().expect("utf-8 path")]);
        // the sheet does not exist; reaching the loader would be an error
        let res = run_generate(&cli, false);
        let _ = fs::remove_file(&path);
        assert!(res.is_ok(), "{res:?}");
    }

    #[test]
    fn yaml_sections_override_flags() {
        let cli = args(&["--gradient-size", "0.3", "--max-width", "256", "--backend", "gpu"]);
        let mut cfg = MergedConfig {
            settings: build_settings(&cli).expect("settings"),
            atlas: build_atlas_config(&cli).expect("atlas"),
        };
        let y: YamlConfig = serde_yaml::from_str(
            "settings:\n  gradient_size: 0.2\natlas:\n  max_width: 128\n  family: shelf\n",
        )
        .expect("yaml");
        y.apply(&mut cfg).expect("apply");

        assert_eq!(cfg.settings.gradient_size, 0.2);
        assert_eq!(cfg.atlas.max_width, 128);
        assert_eq!(cfg.atlas.family, PackAlgorithm::Shelf);
        // keys the file leaves out keep the flag values
        assert_eq!(cfg.settings.backend, BackendKind::Gpu);
    }

    #[test]
    fn unknown_yaml_enum_is_an_error() {
        let cli = args(&[]);
        let mut cfg = MergedConfig {
            settings: build_settings(&cli).expect("settings"),
            atlas: build_atlas_config(&cli).expect("atlas"),
        };
        let y: YamlConfig = serde_yaml::from_str("atlas:\n  family: skyline\n").expect("yaml");
        assert!(y.apply(&mut cfg).is_err());
    }
}
