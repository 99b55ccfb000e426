//! Core record model for CityPersons annotations.
//!
//! Loaders turn their on-disk rows into these types, the filter consumes
//! them, and the VOC writer renders the converted [`VocObject`]s.

use serde::{Deserialize, Serialize};

use super::bbox::{BBoxXYWH, BBoxXYXY};
use super::ids::ClassId;

/// Number of numeric fields in one CityPersons annotation row.
pub const RECORD_FIELDS: usize = 10;

/// One annotated object instance, unpacked from a 10-field CityPersons row:
/// `class_label, x, y, w, h, instance_id, x_vis, y_vis, w_vis, h_vis`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Class label, resolved through the class map.
    pub class_id: ClassId,

    /// Full extent of the object.
    pub bbox: BBoxXYWH,

    /// Instance id within the image.
    pub instance_id: u64,

    /// Visible (unoccluded) part of the object.
    pub visible: BBoxXYWH,
}

impl AnnotationRecord {
    /// Creates a record from already-typed parts.
    pub fn new(
        class_id: impl Into<ClassId>,
        bbox: BBoxXYWH,
        instance_id: u64,
        visible: BBoxXYWH,
    ) -> Self {
        Self {
            class_id: class_id.into(),
            bbox,
            instance_id,
            visible,
        }
    }

    /// Unpacks a raw numeric row.
    ///
    /// The row must have exactly [`RECORD_FIELDS`] finite values, and the
    /// class label and instance id must be non-negative integers. The error
    /// is a plain message; callers attach the source path.
    pub fn from_row(row: &[f64]) -> Result<Self, String> {
        if row.len() != RECORD_FIELDS {
            return Err(format!(
                "expected {RECORD_FIELDS} fields per record, found {}",
                row.len()
            ));
        }

        if let Some(pos) = row.iter().position(|value| !value.is_finite()) {
            return Err(format!("field {pos} is not a finite number ({})", row[pos]));
        }

        let class_id = integral_field(row[0], "class_label", u32::MAX as f64)? as u32;
        let instance_id = integral_field(row[5], "instance_id", u64::MAX as f64)? as u64;

        Ok(Self {
            class_id: ClassId::new(class_id),
            bbox: BBoxXYWH::new(row[1], row[2], row[3], row[4]),
            instance_id,
            visible: BBoxXYWH::new(row[6], row[7], row[8], row[9]),
        })
    }

    /// Visible area divided by full area.
    ///
    /// Returns `None` unless the full box has positive width and height, so
    /// a degenerate or negative box never produces a ratio. A visible box
    /// with a non-positive side counts as zero area.
    pub fn visibility_ratio(&self) -> Option<f64> {
        if self.bbox.width <= 0.0 || self.bbox.height <= 0.0 {
            return None;
        }
        let visible = if self.visible.width > 0.0 && self.visible.height > 0.0 {
            self.visible.area()
        } else {
            0.0
        };
        let ratio = visible / self.bbox.area();
        ratio.is_finite().then_some(ratio)
    }
}

fn integral_field(value: f64, name: &str, max: f64) -> Result<f64, String> {
    if value < 0.0 || value.fract() != 0.0 || value > max {
        return Err(format!(
            "{name} must be a non-negative integer, found {value}"
        ));
    }
    Ok(value)
}

/// All records for one image, keyed by the image file name
/// (e.g. `aachen_000000_000019_leftImg8bit.png`).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageAnnotations {
    pub image_name: String,
    pub records: Vec<AnnotationRecord>,
}

impl ImageAnnotations {
    /// Creates the annotation set for one image.
    pub fn new(image_name: impl Into<String>, records: Vec<AnnotationRecord>) -> Self {
        Self {
            image_name: image_name.into(),
            records,
        }
    }

    /// City the image was captured in, taken from the file name prefix.
    ///
    /// Cityscapes stores images as `<split>/<city>/<city>_<seq>_<frame>_...`.
    pub fn city(&self) -> &str {
        self.image_name
            .split('_')
            .next()
            .unwrap_or(self.image_name.as_str())
    }

    /// File name up to the first `.`, used for the XML name and manifests.
    pub fn stem(&self) -> &str {
        self.image_name
            .split('.')
            .next()
            .unwrap_or(self.image_name.as_str())
    }
}

/// All images of one split, in source order.
pub type AnnotationSet = Vec<ImageAnnotations>;

/// One of the two independently processed dataset partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Val,
}

impl Split {
    /// Directory and manifest name (`train`, `val`).
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

impl std::fmt::Display for Split {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A converted object ready to be written as a VOC `<object>`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VocObject {
    /// The original class id.
    pub class_id: ClassId,

    /// Name written to `<name>`.
    pub name: String,

    /// Inclusive corner box.
    pub bbox: BBoxXYXY,

    /// True when the object is an ignore region re-appended after filtering.
    pub is_ignore: bool,
}
