//! Per-image outcome reporting for a rendering run.
//!
//! A report renders as text through `Display` or as JSON through serde.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::GtDrawError;

/// The outcome of one rendering run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    /// Directory the annotated images were written to.
    pub output_dir: PathBuf,
    /// One entry per image, in discovery order.
    pub images: Vec<ImageReport>,
}

impl RunReport {
    /// Creates an empty report for a run writing into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            images: Vec::new(),
        }
    }

    /// Adds an image outcome to the report.
    pub fn add(&mut self, image: ImageReport) {
        self.images.push(image);
    }

    pub fn total(&self) -> usize {
        self.images.len()
    }

    pub fn drawn_count(&self) -> usize {
        self.count(ImageStatus::Drawn)
    }

    pub fn copied_count(&self) -> usize {
        self.count(ImageStatus::Copied)
    }

    pub fn failed_count(&self) -> usize {
        self.count(ImageStatus::Failed)
    }

    /// Total boxes drawn across all images.
    pub fn box_count(&self) -> usize {
        self.images.iter().map(|image| image.boxes).sum()
    }

    /// Returns true if no image failed.
    pub fn is_ok(&self) -> bool {
        self.failed_count() == 0
    }

    /// Turn a report with failures into [`GtDrawError::BatchIncomplete`].
    pub fn into_result(self) -> Result<Self, GtDrawError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(GtDrawError::BatchIncomplete {
                failed: self.failed_count(),
                total: self.total(),
                report: self,
            })
        }
    }

    fn count(&self, status: ImageStatus) -> usize {
        self.images
            .iter()
            .filter(|image| image.status == status)
            .count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Processed {} image(s) into {}:",
            self.total(),
            self.output_dir.display()
        )?;
        writeln!(
            f,
            "  {} drawn ({} box(es)), {} copied unchanged, {} failed",
            self.drawn_count(),
            self.box_count(),
            self.copied_count(),
            self.failed_count()
        )?;

        let failures: Vec<&ImageReport> = self
            .images
            .iter()
            .filter(|image| image.status == ImageStatus::Failed)
            .collect();
        if !failures.is_empty() {
            writeln!(f)?;
            writeln!(f, "Failures ({}):", failures.len())?;
            for image in failures {
                writeln!(f, "  - {}", image)?;
            }
        }

        Ok(())
    }
}

/// What happened to a single image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageReport {
    /// Source file name, relative to the images directory.
    pub image: String,
    pub status: ImageStatus,
    /// Number of boxes drawn.
    pub boxes: usize,
    /// Where the output was written, if anywhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Diagnostic for failed images.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageReport {
    pub fn drawn(image: impl Into<String>, boxes: usize, output: PathBuf) -> Self {
        Self {
            image: image.into(),
            status: ImageStatus::Drawn,
            boxes,
            output: Some(output),
            error: None,
        }
    }

    pub fn copied(image: impl Into<String>, output: PathBuf) -> Self {
        Self {
            image: image.into(),
            status: ImageStatus::Copied,
            boxes: 0,
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(image: impl Into<String>, error: &GtDrawError) -> Self {
        Self {
            image: image.into(),
            status: ImageStatus::Failed,
            boxes: 0,
            output: None,
            error: Some(error.to_string()),
        }
    }
}

impl fmt::Display for ImageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.error) {
            (ImageStatus::Failed, Some(error)) => write!(f, "{}: {}", self.image, error),
            (status, _) => write!(f, "{}: {:?} ({} box(es))", self.image, status, self.boxes),
        }
    }
}

/// Outcome category for one image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    /// Boxes were drawn and the image re-encoded.
    Drawn,
    /// The annotation had no boxes; the source was copied byte-for-byte.
    Copied,
    /// Processing stopped with an error; no output was written.
    Failed,
}
