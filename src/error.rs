use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::RunReport;

/// The main error type for gtdraw operations.
#[derive(Debug, Error)]
pub enum GtDrawError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {path}")]
    PathNotFound { path: PathBuf },

    #[error("Annotation not found: {path}")]
    AnnotationNotFound { path: PathBuf },

    #[error("Malformed annotation {path}: {message}")]
    MalformedAnnotation { path: PathBuf, message: String },

    #[error("Failed to load image {path}: {message}")]
    ImageLoad { path: PathBuf, message: String },

    #[error("Failed to write image {path}: {message}")]
    ImageWrite { path: PathBuf, message: String },

    #[error("No .jpg images found in {path}; add images or point at another directory")]
    NoImagesFound { path: PathBuf },

    #[error("Failed to serialize report as JSON: {0}")]
    ReportJson(#[source] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{failed} of {total} image(s) failed")]
    BatchIncomplete {
        failed: usize,
        total: usize,
        report: RunReport,
    },
}
