//! Bounding box types for the two geometries this tool deals with.
//!
//! CityPersons stores boxes as corner + size (`x, y, width, height`), while
//! PASCAL VOC expects inclusive corners (`xmin, ymin, xmax, ymax`). Keeping
//! them as distinct types makes the one conversion point explicit.

use serde::{Deserialize, Serialize};

/// An axis-aligned box in corner + size form, in pixel coordinates with a
/// top-left origin.
///
/// Note: the constructor does not reject negative sizes. The filter decides
/// what to do with degenerate geometry, so it must be representable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BBoxXYWH {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBoxXYWH {
    /// Creates a new box from its top-left corner and size.
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns the area of the box.
    ///
    /// May be zero or negative for degenerate boxes.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns true if all fields are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// Converts to VOC's inclusive-corner form.
    ///
    /// A box that starts at pixel `x` and spans `width` pixels ends on pixel
    /// `x + width - 1`.
    #[inline]
    pub fn to_inclusive_xyxy(&self) -> BBoxXYXY {
        BBoxXYXY::from_xyxy(
            self.x,
            self.y,
            self.x + self.width - 1.0,
            self.y + self.height - 1.0,
        )
    }
}

/// An axis-aligned box in inclusive-corner form (xmin, ymin, xmax, ymax).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BBoxXYXY {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BBoxXYXY {
    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Returns true if the box is properly ordered (min <= max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }
}
