//! Integer pixel bounding boxes in XYXY format.

use serde::Serialize;

/// An axis-aligned bounding box in pixel coordinates (xmin, ymin, xmax, ymax).
///
/// Both corners are inclusive pixel positions. The constructor does not
/// check ordering; the annotation reader rejects boxes where
/// `xmin >= xmax` or `ymin >= ymax` before they reach the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct BoundingBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BoundingBox {
    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Horizontal extent in pixels, counting both edge columns.
    #[inline]
    pub fn width(&self) -> i64 {
        i64::from(self.xmax) - i64::from(self.xmin) + 1
    }

    /// Vertical extent in pixels, counting both edge rows.
    #[inline]
    pub fn height(&self) -> i64 {
        i64::from(self.ymax) - i64::from(self.ymin) + 1
    }

    /// Returns true if min < max on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin < self.xmax && self.ymin < self.ymax
    }

    /// Returns true if every corner lies on a pixel of a `width` x `height` image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        let (w, h) = (i64::from(width), i64::from(height));
        let in_x = |v: i32| (0..w).contains(&i64::from(v));
        let in_y = |v: i32| (0..h).contains(&i64::from(v));
        in_x(self.xmin) && in_x(self.xmax) && in_y(self.ymin) && in_y(self.ymax)
    }

    /// Clamps the box to a `width` x `height` image.
    ///
    /// Returns `None` when the box lies entirely outside the image.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let max_x = i32::try_from(width - 1).unwrap_or(i32::MAX);
        let max_y = i32::try_from(height - 1).unwrap_or(i32::MAX);

        if self.xmax < 0 || self.ymax < 0 || self.xmin > max_x || self.ymin > max_y {
            return None;
        }

        Some(Self::new(
            self.xmin.clamp(0, max_x),
            self.ymin.clamp(0, max_y),
            self.xmax.clamp(0, max_x),
            self.ymax.clamp(0, max_y),
        ))
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}) -> ({}, {})",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}
