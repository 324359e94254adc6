//! Dataset layout and image discovery.
//!
//! A dataset root holds `images/` (`.jpg` files) and `annots/` (one `.xml`
//! per image, same stem). Annotated copies go to `images_gt/`. Every
//! directory can be overridden so nothing here depends on process-wide
//! state.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::GtDrawError;

/// Default images sub-directory of a dataset root.
pub const IMAGES_DIR: &str = "images";
/// Default annotations sub-directory of a dataset root.
pub const ANNOTATIONS_DIR: &str = "annots";
/// Default output sub-directory of a dataset root.
pub const OUTPUT_DIR: &str = "images_gt";
/// Manifest written into the images directory.
pub const MANIFEST_FILE: &str = "image.txt";

const IMAGE_SUFFIX: &str = ".jpg";

/// Where images, annotations, and rendered output live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetLayout {
    pub images_dir: PathBuf,
    pub annotations_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl DatasetLayout {
    /// Layout with the default sub-directory names under `root`.
    pub fn from_root(root: &Path) -> Self {
        Self {
            images_dir: root.join(IMAGES_DIR),
            annotations_dir: root.join(ANNOTATIONS_DIR),
            output_dir: root.join(OUTPUT_DIR),
        }
    }

    pub fn with_images_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.images_dir = dir.into();
        self
    }

    pub fn with_annotations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.annotations_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }
}

/// Image file names discovered in one directory, in discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetIndex {
    pub images: Vec<String>,
}

/// Annotation stem for an image file name (`00001.jpg` -> `00001`).
pub fn image_stem(file_name: &str) -> &str {
    file_name.strip_suffix(IMAGE_SUFFIX).unwrap_or(file_name)
}

/// List the `.jpg` files directly inside `images_dir`, sorted by name.
///
/// The suffix match is case-sensitive. Files in sub-directories are not
/// listed; a warning names how many were skipped.
pub fn list_images(images_dir: &Path) -> Result<Vec<String>, GtDrawError> {
    if !images_dir.is_dir() {
        return Err(GtDrawError::PathNotFound {
            path: images_dir.to_path_buf(),
        });
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(images_dir).map_err(GtDrawError::Io)? {
        let entry = entry.map_err(GtDrawError::Io)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) if is_image_name(&name) => names.push(name),
            Ok(_) => {}
            Err(raw) => log::warn!("skipping non UTF-8 file name {raw:?}"),
        }
    }
    names.sort();

    let mut nested = Vec::new();
    let entries = WalkDir::new(images_dir)
        .follow_links(true)
        .min_depth(2)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("skipping unreadable entry under {}: {err}", images_dir.display());
                None
            }
        });
    for entry in entries {
        if entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .map(is_image_name)
                .unwrap_or(false)
        {
            nested.push(entry.path().to_path_buf());
        }
    }
    if !nested.is_empty() {
        nested.sort();
        log::warn!(
            "images are listed flat (non-recursive); skipping {} nested .jpg file(s), e.g. {}",
            nested.len(),
            nested[0].display()
        );
    }

    Ok(names)
}

/// Write `names` to the manifest file in `images_dir`, one per line.
pub fn write_manifest(images_dir: &Path, names: &[String]) -> Result<PathBuf, GtDrawError> {
    let path = images_dir.join(MANIFEST_FILE);
    let contents: String = names.iter().map(|name| format!("{name}\n")).collect();
    fs::write(&path, contents).map_err(GtDrawError::Io)?;
    Ok(path)
}

/// Discover the images in `images_dir` and record them in the manifest.
///
/// Fails with [`GtDrawError::NoImagesFound`] before writing anything when
/// the directory holds no `.jpg` files.
pub fn walk_images(images_dir: &Path) -> Result<DatasetIndex, GtDrawError> {
    let images = list_images(images_dir)?;
    if images.is_empty() {
        return Err(GtDrawError::NoImagesFound {
            path: images_dir.to_path_buf(),
        });
    }

    let manifest = write_manifest(images_dir, &images)?;
    log::info!(
        "found {} image(s) in {}; manifest written to {}",
        images.len(),
        images_dir.display(),
        manifest.display()
    );

    Ok(DatasetIndex { images })
}

fn is_image_name(name: &str) -> bool {
    name.len() > IMAGE_SUFFIX.len() && name.ends_with(IMAGE_SUFFIX)
}
