//! gtdraw: ground-truth bounding-box overlays for object-detection datasets.
//!
//! gtdraw reads one XML annotation per image (the `object/bndbox` subset of
//! Pascal VOC), draws every box onto its image, and writes the annotated
//! copy to an output directory for visual inspection.
//!
//! # Modules
//!
//! - [`annotation`]: XML annotation reader and [`BoundingBox`](annotation::BoundingBox)
//! - [`render`]: raster backend and box drawing
//! - [`dataset`]: dataset layout, image discovery, and the image manifest
//! - [`pipeline`]: per-image driver and run reports
//! - [`error`]: error types for gtdraw operations

pub mod annotation;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::GtDrawError;

use dataset::DatasetLayout;
use pipeline::{ErrorPolicy, PipelineOptions};
use render::{BoundsPolicy, DEFAULT_JPEG_QUALITY};

/// The gtdraw CLI application.
#[derive(Parser)]
#[command(name = "gtdraw")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Log per-image progress.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Draw ground-truth boxes onto every image of a dataset.
    Draw(DrawArgs),
    /// List the dataset images and write the image.txt manifest.
    List(ListArgs),
    /// Print the boxes parsed from one annotation file.
    Boxes(BoxesArgs),
}

/// Arguments for the draw subcommand.
#[derive(clap::Args)]
struct DrawArgs {
    /// Dataset root containing images/ and annots/.
    root: PathBuf,

    /// Images directory (default: <ROOT>/images).
    #[arg(long, env = "GTDRAW_IMAGES_DIR")]
    images_dir: Option<PathBuf>,

    /// Annotations directory (default: <ROOT>/annots).
    #[arg(long, env = "GTDRAW_ANNOTATIONS_DIR")]
    annotations_dir: Option<PathBuf>,

    /// Output directory (default: <ROOT>/images_gt).
    #[arg(long, env = "GTDRAW_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Record failing images and continue instead of stopping at the first one.
    #[arg(long)]
    keep_going: bool,

    /// Process images in parallel.
    #[arg(long)]
    parallel: bool,

    /// Out-of-bounds box handling ('fail' or 'clip').
    #[arg(long, default_value = "fail")]
    bounds: String,

    /// JPEG quality for annotated output (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, value_parser = clap::value_parser!(u8).range(1..=100))]
    jpeg_quality: u8,

    /// Output format for the run report ('text' or 'json').
    #[arg(long, default_value = "text")]
    report: String,
}

/// Arguments for the list subcommand.
#[derive(clap::Args)]
struct ListArgs {
    /// Directory holding the .jpg images.
    images_dir: PathBuf,
}

/// Arguments for the boxes subcommand.
#[derive(clap::Args)]
struct BoxesArgs {
    /// Directory holding the .xml annotations.
    annotations_dir: PathBuf,

    /// Image stem, e.g. '00001' for 00001.xml.
    stem: String,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the gtdraw CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), GtDrawError> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Some(Commands::Draw(args)) => run_draw(args),
        Some(Commands::List(args)) => run_list(args),
        Some(Commands::Boxes(args)) => run_boxes(args),
        None => {
            println!("gtdraw {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Ground-truth bounding-box overlays for object-detection datasets.");
            println!();
            println!("Run 'gtdraw --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the draw subcommand.
fn run_draw(args: DrawArgs) -> Result<(), GtDrawError> {
    let json = parse_output_format(&args.report)?;
    let bounds = match args.bounds.as_str() {
        "fail" => BoundsPolicy::Fail,
        "clip" => BoundsPolicy::Clip,
        other => {
            return Err(GtDrawError::InvalidArgument(format!(
                "'{}' for --bounds (supported: fail, clip)",
                other
            )));
        }
    };

    let mut layout = DatasetLayout::from_root(&args.root);
    if let Some(dir) = args.images_dir {
        layout = layout.with_images_dir(dir);
    }
    if let Some(dir) = args.annotations_dir {
        layout = layout.with_annotations_dir(dir);
    }
    if let Some(dir) = args.output_dir {
        layout = layout.with_output_dir(dir);
    }

    let options = PipelineOptions {
        error_policy: if args.keep_going {
            ErrorPolicy::KeepGoing
        } else {
            ErrorPolicy::FailFast
        },
        bounds,
        jpeg_quality: args.jpeg_quality,
        parallel: args.parallel,
        ..Default::default()
    };

    let report = pipeline::run_pipeline(&layout, &options)?;

    if json {
        let rendered = serde_json::to_string_pretty(&report).map_err(GtDrawError::ReportJson)?;
        println!("{}", rendered);
    } else {
        print!("{}", report);
    }

    report.into_result().map(|_| ())
}

/// Execute the list subcommand.
fn run_list(args: ListArgs) -> Result<(), GtDrawError> {
    let index = dataset::walk_images(&args.images_dir)?;
    for name in &index.images {
        println!("{}", name);
    }
    Ok(())
}

/// Execute the boxes subcommand.
fn run_boxes(args: BoxesArgs) -> Result<(), GtDrawError> {
    let json = parse_output_format(&args.output)?;
    let parsed = annotation::read_annotation(&args.annotations_dir, &args.stem)?;

    if json {
        let rendered = serde_json::to_string_pretty(&parsed).map_err(GtDrawError::ReportJson)?;
        println!("{}", rendered);
    } else {
        let path = annotation::annotation_path(&args.annotations_dir, &args.stem);
        println!("{}: {} box(es)", path.display(), parsed.len());
        for (idx, bbox) in parsed.iter().enumerate() {
            println!("  {}: {}", idx + 1, bbox);
        }
    }
    Ok(())
}

/// Returns true for JSON output, false for text.
fn parse_output_format(raw: &str) -> Result<bool, GtDrawError> {
    match raw {
        "text" => Ok(false),
        "json" => Ok(true),
        other => Err(GtDrawError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            other
        ))),
    }
}
