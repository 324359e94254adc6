//! The annotation-to-image rendering pipeline.
//!
//! For every image the walker discovers, the pipeline reads the paired
//! annotation, loads the image, draws the boxes, and persists the result.
//! Images are independent of each other, so the batch can run on a rayon
//! pool; each image is still all-or-nothing.

mod report;

pub use report::{ImageReport, ImageStatus, RunReport};

use std::fs;

use rayon::prelude::*;

use crate::annotation::{annotation_path, read_annotation};
use crate::dataset::{image_stem, walk_images, DatasetLayout};
use crate::error::GtDrawError;
use crate::render::{
    copy_unchanged, resolve_bounds, BoundsPolicy, ImageBackend, RasterBackend, StrokeStyle,
    DEFAULT_JPEG_QUALITY,
};

/// How a per-image failure affects the rest of the batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop at the first failing image and return its error.
    #[default]
    FailFast,
    /// Record the failure in the report and carry on.
    KeepGoing,
}

/// Options for a rendering run.
#[derive(Clone, Copy, Debug)]
pub struct PipelineOptions {
    pub error_policy: ErrorPolicy,
    pub bounds: BoundsPolicy,
    pub stroke: StrokeStyle,
    pub jpeg_quality: u8,
    /// Process images on the rayon thread pool.
    pub parallel: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            bounds: BoundsPolicy::default(),
            stroke: StrokeStyle::default(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            parallel: false,
        }
    }
}

/// Render ground-truth boxes for every image in `layout`.
///
/// Walks the images directory (writing its manifest), then draws each
/// image's boxes into the output directory. Under
/// [`ErrorPolicy::FailFast`] the first failure is returned and later images
/// are not processed; outputs already written stay on disk. Under
/// [`ErrorPolicy::KeepGoing`] failures are recorded in the returned report.
pub fn run_pipeline(
    layout: &DatasetLayout,
    options: &PipelineOptions,
) -> Result<RunReport, GtDrawError> {
    let backend = ImageBackend::new(options.jpeg_quality);
    run_pipeline_with(&backend, layout, options)
}

/// [`run_pipeline`] with an explicit raster backend.
pub fn run_pipeline_with<B>(
    backend: &B,
    layout: &DatasetLayout,
    options: &PipelineOptions,
) -> Result<RunReport, GtDrawError>
where
    B: RasterBackend + Sync,
{
    if !layout.annotations_dir.is_dir() {
        return Err(GtDrawError::PathNotFound {
            path: layout.annotations_dir.clone(),
        });
    }

    let index = walk_images(&layout.images_dir)?;

    fs::create_dir_all(&layout.output_dir).map_err(|source| GtDrawError::ImageWrite {
        path: layout.output_dir.clone(),
        message: format!("cannot create output directory: {source}"),
    })?;

    let mut report = RunReport::new(&layout.output_dir);
    let render = |name: &String| render_image(backend, layout, name, options);

    match (options.error_policy, options.parallel) {
        (ErrorPolicy::FailFast, false) => {
            for name in &index.images {
                report.add(render(name)?);
            }
        }
        (ErrorPolicy::FailFast, true) => {
            // Which failure wins is not deterministic when several images fail.
            let images = index
                .images
                .par_iter()
                .map(render)
                .collect::<Result<Vec<_>, _>>()?;
            images.into_iter().for_each(|image| report.add(image));
        }
        (ErrorPolicy::KeepGoing, false) => {
            for name in &index.images {
                report.add(record_failure(name, render(name)));
            }
        }
        (ErrorPolicy::KeepGoing, true) => {
            let outcomes: Vec<_> = index
                .images
                .par_iter()
                .map(|name| record_failure(name, render(name)))
                .collect();
            outcomes.into_iter().for_each(|image| report.add(image));
        }
    }

    log::info!(
        "{} drawn, {} copied, {} failed",
        report.drawn_count(),
        report.copied_count(),
        report.failed_count()
    );
    Ok(report)
}

/// Render one image of `layout`, named relative to its images directory.
///
/// The annotation is read and the image decoded before anything is written,
/// so a failure leaves no output for this image. An annotation without boxes
/// copies the source unchanged.
pub fn render_image<B>(
    backend: &B,
    layout: &DatasetLayout,
    file_name: &str,
    options: &PipelineOptions,
) -> Result<ImageReport, GtDrawError>
where
    B: RasterBackend,
{
    let stem = image_stem(file_name);
    let annotation = read_annotation(&layout.annotations_dir, stem)?;

    let source = layout.images_dir.join(file_name);
    let destination = layout.output_dir.join(file_name);
    let mut buffer = backend.load(&source)?;

    if annotation.is_empty() {
        copy_unchanged(&source, &destination)?;
        log::debug!("{file_name}: no boxes, copied unchanged");
        return Ok(ImageReport::copied(file_name, destination));
    }

    let boxes = resolve_bounds(
        &annotation.boxes,
        backend.dimensions(&buffer),
        options.bounds,
        &annotation_path(&layout.annotations_dir, stem),
    )?;
    if boxes.is_empty() {
        copy_unchanged(&source, &destination)?;
        log::debug!("{file_name}: every box clipped away, copied unchanged");
        return Ok(ImageReport::copied(file_name, destination));
    }
    backend.draw_boxes(&mut buffer, &boxes, &options.stroke);
    backend.save(&buffer, &destination)?;

    log::debug!(
        "{file_name}: drew {} box(es) -> {}",
        boxes.len(),
        destination.display()
    );
    Ok(ImageReport::drawn(file_name, boxes.len(), destination))
}

fn record_failure(name: &str, outcome: Result<ImageReport, GtDrawError>) -> ImageReport {
    outcome.unwrap_or_else(|err| {
        log::error!("{name}: {err}");
        ImageReport::failed(name, &err)
    })
}
