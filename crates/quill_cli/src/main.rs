//! Quill CLI
//!
//! Render SVG documents to PNG, batch-generate thumbnails and inspect
//! parse diagnostics.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::RgbaImage;
use quill_core::parse_color;
use quill_svg::{PixelBuffer, RenderOptions, SvgDocument};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod discover;

use config::QuillConfig;

/// Longest edge taken from a document's own size; larger documents are
/// scaled down to fit
const MAX_INTRINSIC_EDGE: f32 = 8192.0;

#[derive(Parser)]
#[command(name = "quill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Quill SVG renderer", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./quill.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an SVG file to PNG
    Render {
        /// Input SVG file
        input: PathBuf,

        /// Output PNG path (defaults to the input with a .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// Output height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Background color, e.g. white or #202020
        #[arg(long)]
        background: Option<String>,

        /// Disable anti-aliasing
        #[arg(long)]
        no_antialias: bool,
    },

    /// Render a thumbnail for every SVG file in a directory
    Thumbnails {
        /// Directory to scan
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Thumbnail edge length in pixels
        #[arg(short, long)]
        size: Option<u32>,

        /// Scan subdirectories
        #[arg(short, long)]
        recursive: bool,
    },

    /// Parse an SVG file and report its structure and diagnostics
    Check {
        /// Input SVG file
        input: PathBuf,
    },

    /// Show version, supported features and the effective configuration
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = match &cli.config {
        Some(path) => QuillConfig::load(path)?,
        None => QuillConfig::load_from_dir(&std::env::current_dir()?)?,
    };

    match cli.command {
        Commands::Render {
            input,
            output,
            width,
            height,
            background,
            no_antialias,
        } => {
            let mut options = render_options(&config)?;
            if let Some(bg) = background {
                let color = parse_color(&bg)
                    .with_context(|| format!("Invalid background color '{}'", bg))?;
                options = options.with_background(color);
            }
            if no_antialias {
                options = options.with_antialias(false);
            }
            cmd_render(&input, output, (width, height), &config, &options)
        }

        Commands::Thumbnails {
            dir,
            output,
            size,
            recursive,
        } => {
            let options = render_options(&config)?;
            let out_dir = output.unwrap_or_else(|| PathBuf::from(&config.thumbnails.output));
            let size = size.unwrap_or(config.thumbnails.size);
            let recursive = recursive || config.thumbnails.recursive;
            cmd_thumbnails(&dir, &out_dir, size, recursive, &options)
        }

        Commands::Check { input } => cmd_check(&input),

        Commands::Info => cmd_info(&config),
    }
}

fn render_options(config: &QuillConfig) -> Result<RenderOptions> {
    Ok(RenderOptions::default()
        .with_background(config.render.background_color()?)
        .with_antialias(config.render.antialias))
}

fn load_document(path: &Path) -> Result<SvgDocument> {
    let data = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    SvgDocument::from_data(&data).with_context(|| format!("Failed to parse {}", path.display()))
}

fn report_diagnostics(path: &Path, document: &SvgDocument) {
    for diagnostic in document.diagnostics() {
        warn!("{}: {}", path.display(), diagnostic);
    }
}

/// Pick the output size: explicit flags, then the document's own size,
/// then the configured default. A single flag keeps the document's aspect.
/// A document size beyond [`MAX_INTRINSIC_EDGE`] is scaled down to fit.
fn output_size(
    requested: (Option<u32>, Option<u32>),
    document: &SvgDocument,
    config: &QuillConfig,
) -> Result<(u32, u32)> {
    let intrinsic = document
        .size()
        .filter(|s| !s.is_empty() && s.width.is_finite() && s.height.is_finite())
        .map(|s| (s.width, s.height));

    let scaled = |value: u32, num: f32, den: f32| ((value as f32 * num / den).round() as u32).max(1);
    let size = match (requested, intrinsic) {
        ((Some(w), Some(h)), _) => (w, h),
        ((Some(w), None), Some((iw, ih))) => (w, scaled(w, ih, iw)),
        ((None, Some(h)), Some((iw, ih))) => (scaled(h, iw, ih), h),
        ((Some(w), None), None) => (w, config.render.height),
        ((None, Some(h)), None) => (config.render.width, h),
        ((None, None), Some((iw, ih))) => fit_intrinsic(iw, ih),
        ((None, None), None) => (config.render.width, config.render.height),
    };

    if size.0 == 0 || size.1 == 0 {
        anyhow::bail!("Output size must be at least 1x1, got {}x{}", size.0, size.1);
    }
    Ok(size)
}

fn fit_intrinsic(width: f32, height: f32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= MAX_INTRINSIC_EDGE {
        return (width.ceil() as u32, height.ceil() as u32);
    }
    let k = MAX_INTRINSIC_EDGE / longest;
    let fitted = (
        (width * k).round().max(1.0) as u32,
        (height * k).round().max(1.0) as u32,
    );
    warn!(
        "Document size {}x{} is too large, rendering at {}x{}",
        width, height, fitted.0, fitted.1
    );
    fitted
}

fn write_png(buffer: PixelBuffer, path: &Path) -> Result<()> {
    let (width, height) = buffer.dimensions();
    let image = RgbaImage::from_raw(width, height, buffer.into_vec())
        .context("Pixel buffer does not match its dimensions")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn cmd_render(
    input: &Path,
    output: Option<PathBuf>,
    requested: (Option<u32>, Option<u32>),
    config: &QuillConfig,
    options: &RenderOptions,
) -> Result<()> {
    let document = load_document(input)?;
    report_diagnostics(input, &document);

    let (width, height) = output_size(requested, &document, config)?;
    let output = output.unwrap_or_else(|| input.with_extension("png"));

    let buffer = quill_svg::try_render_with_options(&document, width, height, options)?;
    write_png(buffer, &output)?;

    info!("Rendered {} at {}x{} to {}", input.display(), width, height, output.display());
    Ok(())
}

fn cmd_thumbnails(
    dir: &Path,
    out_dir: &Path,
    size: u32,
    recursive: bool,
    options: &RenderOptions,
) -> Result<()> {
    if size == 0 {
        anyhow::bail!("Thumbnail size must be at least 1");
    }

    let files = discover::discover(dir, recursive)?;
    info!("Found {} SVG files in {}", files.len(), dir.display());

    let mut written = 0usize;
    let mut failed = 0usize;
    for file in &files {
        let result = load_document(&file.path).and_then(|document| {
            report_diagnostics(&file.path, &document);
            let buffer = quill_svg::try_render_with_options(&document, size, size, options)?;
            write_png(buffer, &file.thumbnail_path(out_dir))
        });

        match result {
            Ok(()) => {
                debug!("Thumbnail for {}", file.display_name);
                written += 1;
            }
            Err(e) => {
                warn!("Skipping {}: {:#}", file.path.display(), e);
                failed += 1;
            }
        }
    }

    info!(
        "Wrote {} thumbnails to {} ({} failed)",
        written,
        out_dir.display(),
        failed
    );
    Ok(())
}

fn cmd_check(input: &Path) -> Result<()> {
    let document = load_document(input)?;

    println!("{}", input.display());
    match document.size() {
        Some(size) => println!("  Size:        {} x {}", size.width, size.height),
        None => println!("  Size:        unspecified"),
    }
    if let Some(vb) = document.view_box() {
        println!(
            "  viewBox:     {} {} {} {}",
            vb.x(),
            vb.y(),
            vb.width(),
            vb.height()
        );
    }
    println!("  Nodes:       {}", document.node_count());
    println!("  Gradients:   {}", document.gradients().len());
    println!("  Diagnostics: {}", document.diagnostics().len());
    for diagnostic in document.diagnostics() {
        println!("    - {}", diagnostic);
    }

    Ok(())
}

fn cmd_info(config: &QuillConfig) -> Result<()> {
    println!("Quill SVG Renderer");
    println!("==================");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Elements:");
    println!("  - rect, circle, ellipse, line, polyline, polygon, path");
    println!("  - g, nested svg, a, switch");
    println!("  - linearGradient, radialGradient (href inheritance)");
    println!();
    println!("Painting:");
    println!("  - fill and stroke with nonzero/evenodd rules");
    println!("  - caps, joins and miter limits");
    println!("  - opacity, fill-opacity, stroke-opacity");
    println!("  - pad, reflect and repeat spread methods");
    println!();
    println!("Not supported:");
    println!("  - text, images, filters, masks, clipping, patterns, markers");
    println!("  - CSS stylesheets, scripting, animation");
    println!();
    println!("Configuration:");
    print!("{}", config.to_toml()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(src: &str) -> SvgDocument {
        quill_svg::parse(src).unwrap()
    }

    #[test]
    fn test_output_size_prefers_flags_then_document() {
        let config = QuillConfig::default();
        let sized = doc(r#"<svg width="40" height="20"/>"#);
        assert_eq!(output_size((None, None), &sized, &config).unwrap(), (40, 20));
        assert_eq!(output_size((Some(80), None), &sized, &config).unwrap(), (80, 40));
        assert_eq!(output_size((None, Some(10)), &sized, &config).unwrap(), (20, 10));
        assert_eq!(output_size((Some(7), Some(9)), &sized, &config).unwrap(), (7, 9));
    }

    #[test]
    fn test_output_size_falls_back_to_config() {
        let config = QuillConfig::from_toml("[render]\nwidth = 300\nheight = 150").unwrap();
        let unsized_doc = doc("<svg/>");
        assert_eq!(output_size((None, None), &unsized_doc, &config).unwrap(), (300, 150));
        assert_eq!(output_size((Some(10), None), &unsized_doc, &config).unwrap(), (10, 150));
        assert!(output_size((Some(0), Some(5)), &unsized_doc, &config).is_err());
    }

    #[test]
    fn test_output_size_caps_huge_documents() {
        let config = QuillConfig::default();
        let huge = doc(r#"<svg width="100000" height="50000"/>"#);
        assert_eq!(output_size((None, None), &huge, &config).unwrap(), (8192, 4096));

        let sliver = doc(r#"<svg width="1e30" height="1"/>"#);
        assert_eq!(output_size((None, None), &sliver, &config).unwrap(), (8192, 1));
    }

    #[test]
    fn test_oversized_request_is_an_error() {
        let document = doc(r#"<svg width="10" height="10"/>"#);
        let result =
            quill_svg::try_render_with_options(&document, 100_000, 100_000, &RenderOptions::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_write_png_round_trips_pixels() {
        let dir = std::env::temp_dir().join(format!("quill-png-{}", std::process::id()));
        let path = dir.join("nested").join("circle.png");
        let buffer = quill_svg::render_str(
            r#"<svg width="8" height="8"><rect width="8" height="8" fill="lime"/></svg>"#,
            8,
            8,
        )
        .unwrap();
        write_png(buffer, &path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert_eq!(decoded.get_pixel(3, 3).0, [0, 255, 0, 255]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
