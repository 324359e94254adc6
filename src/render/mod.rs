//! Ground-truth box rendering.
//!
//! Boxes are drawn as closed outlines directly onto a decoded RGB buffer,
//! which is then encoded in memory and moved into place in the output
//! directory. The codec and drawing primitives sit behind [`RasterBackend`],
//! which has a single implementation, [`ImageBackend`], built on the `image`
//! and `imageproc` crates.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::annotation::BoundingBox;
use crate::error::GtDrawError;

/// Outline color for ground-truth boxes.
pub const STROKE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Outline width in pixels, measured inward from the box edges.
pub const STROKE_WIDTH: u32 = 2;

/// JPEG quality used when re-encoding annotated images.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Color and width of a box outline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StrokeStyle {
    pub color: Rgb<u8>,
    pub width: u32,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            color: STROKE_COLOR,
            width: STROKE_WIDTH,
        }
    }
}

/// What to do with a box that does not fit inside its image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoundsPolicy {
    /// Reject the annotation as malformed.
    #[default]
    Fail,
    /// Clamp the box to the image, dropping it if nothing is left.
    Clip,
}

/// A raster backend that can load, draw on, and save an image.
pub trait RasterBackend {
    /// The decoded, mutable image representation.
    type Buffer;

    /// Decode the image at `path`.
    fn load(&self, path: &Path) -> Result<Self::Buffer, GtDrawError>;

    /// Width and height of a decoded buffer.
    fn dimensions(&self, buffer: &Self::Buffer) -> (u32, u32);

    /// Draw the outline of every box, in order, onto `buffer`.
    fn draw_boxes(&self, buffer: &mut Self::Buffer, boxes: &[BoundingBox], style: &StrokeStyle);

    /// Encode `buffer` using the format implied by `path` and write it there.
    ///
    /// Either the complete file is written or none of it is.
    fn save(&self, buffer: &Self::Buffer, path: &Path) -> Result<(), GtDrawError>;
}

/// [`RasterBackend`] over `image::RgbImage`.
#[derive(Clone, Copy, Debug)]
pub struct ImageBackend {
    jpeg_quality: u8,
}

impl ImageBackend {
    /// Create a backend that encodes JPEG output at `jpeg_quality` (1-100).
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    fn encode(&self, buffer: &RgbImage, path: &Path) -> Result<Vec<u8>, GtDrawError> {
        let format = ImageFormat::from_path(path).map_err(|source| GtDrawError::ImageWrite {
            path: path.to_path_buf(),
            message: format!("cannot choose an encoder: {source}"),
        })?;

        let mut bytes = Vec::new();
        let encoded = match format {
            ImageFormat::Jpeg => {
                buffer.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, self.jpeg_quality))
            }
            other => buffer.write_to(&mut Cursor::new(&mut bytes), other),
        };

        encoded.map_err(|source| GtDrawError::ImageWrite {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;
        Ok(bytes)
    }
}

impl Default for ImageBackend {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl RasterBackend for ImageBackend {
    type Buffer = RgbImage;

    fn load(&self, path: &Path) -> Result<RgbImage, GtDrawError> {
        if !path.is_file() {
            return Err(GtDrawError::ImageLoad {
                path: path.to_path_buf(),
                message: "no such file".to_string(),
            });
        }

        let load_error = |message: String| GtDrawError::ImageLoad {
            path: path.to_path_buf(),
            message,
        };

        let image = ImageReader::open(path)
            .map_err(|source| load_error(source.to_string()))?
            .with_guessed_format()
            .map_err(|source| load_error(source.to_string()))?
            .decode()
            .map_err(|source| load_error(source.to_string()))?;

        Ok(image.into_rgb8())
    }

    fn dimensions(&self, buffer: &RgbImage) -> (u32, u32) {
        buffer.dimensions()
    }

    fn draw_boxes(&self, buffer: &mut RgbImage, boxes: &[BoundingBox], style: &StrokeStyle) {
        for bbox in boxes {
            draw_box(buffer, bbox, style);
        }
    }

    fn save(&self, buffer: &RgbImage, path: &Path) -> Result<(), GtDrawError> {
        let bytes = self.encode(buffer, path)?;
        write_atomically(path, &bytes)
    }
}

/// Draw one box outline as four filled edge strips of `style.width` pixels.
///
/// The strips sit inside the box, so the stroke covers
/// `[xmin, xmin + width)` on the left edge and `(xmax - width, xmax]` on the
/// right, and likewise vertically. Boxes narrower than two strokes come out
/// filled. Pixels outside the image are ignored.
pub fn draw_box(image: &mut RgbImage, bbox: &BoundingBox, style: &StrokeStyle) {
    let (Ok(box_w), Ok(box_h)) = (u32::try_from(bbox.width()), u32::try_from(bbox.height()))
    else {
        return;
    };
    let stroke = style.width.min(box_w).min(box_h);
    if box_w == 0 || box_h == 0 || stroke == 0 {
        return;
    }
    let inset = i32::try_from(stroke - 1).unwrap_or(i32::MAX);

    let strips = [
        Rect::at(bbox.xmin, bbox.ymin).of_size(box_w, stroke),
        Rect::at(bbox.xmin, bbox.ymax - inset).of_size(box_w, stroke),
        Rect::at(bbox.xmin, bbox.ymin).of_size(stroke, box_h),
        Rect::at(bbox.xmax - inset, bbox.ymin).of_size(stroke, box_h),
    ];
    for strip in strips {
        draw_filled_rect_mut(image, strip, style.color);
    }
}

/// Apply `policy` to boxes that do not fit a `width` x `height` image.
///
/// `annotation_path` labels the error raised under [`BoundsPolicy::Fail`].
pub fn resolve_bounds(
    boxes: &[BoundingBox],
    (width, height): (u32, u32),
    policy: BoundsPolicy,
    annotation_path: &Path,
) -> Result<Vec<BoundingBox>, GtDrawError> {
    let mut resolved = Vec::with_capacity(boxes.len());

    for (index, bbox) in boxes.iter().enumerate() {
        if bbox.fits_within(width, height) {
            resolved.push(*bbox);
            continue;
        }

        match policy {
            BoundsPolicy::Fail => {
                return Err(GtDrawError::MalformedAnnotation {
                    path: annotation_path.to_path_buf(),
                    message: format!(
                        "box {bbox} in <object> #{} lies outside the {width}x{height} image",
                        index + 1
                    ),
                });
            }
            BoundsPolicy::Clip => match bbox.clamp_to(width, height) {
                Some(clipped) => {
                    log::warn!(
                        "{}: clipped box {bbox} to {clipped} for {width}x{height} image",
                        annotation_path.display()
                    );
                    resolved.push(clipped);
                }
                None => {
                    log::warn!(
                        "{}: dropped box {bbox} outside {width}x{height} image",
                        annotation_path.display()
                    );
                }
            },
        }
    }

    Ok(resolved)
}

/// Copy `source` to `destination` byte-for-byte, all or nothing.
pub fn copy_unchanged(source: &Path, destination: &Path) -> Result<(), GtDrawError> {
    let bytes = fs::read(source).map_err(|source_err| GtDrawError::ImageLoad {
        path: source.to_path_buf(),
        message: source_err.to_string(),
    })?;
    write_atomically(destination, &bytes)
}

/// Write `bytes` to a hidden sibling of `path`, then rename it into place.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), GtDrawError> {
    let write_error = |message: String| GtDrawError::ImageWrite {
        path: path.to_path_buf(),
        message,
    };

    let partial = partial_path(path).ok_or_else(|| write_error("path has no file name".into()))?;

    fs::write(&partial, bytes).map_err(|source| write_error(source.to_string()))?;
    fs::rename(&partial, path).map_err(|source| {
        let _ = fs::remove_file(&partial);
        write_error(source.to_string())
    })
}

fn partial_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_string_lossy();
    Some(path.with_file_name(format!(".{name}.partial")))
}
