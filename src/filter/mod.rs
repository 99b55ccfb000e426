//! Bounding-box filtering and conversion for one image.
//!
//! Per image, in order:
//! 1. ignore regions are set aside (when `handle_ignore` is on),
//! 2. the remaining records go through the filter predicate: class drop,
//!    then the width, height and visibility ranges,
//! 3. an image with no surviving record is skipped,
//! 4. ignore regions are appended after the survivors,
//! 5. boxes are converted to VOC's inclusive corners.
//!
//! Everything here is pure: records are never mutated and each image is
//! processed independently of every other.

mod range;

pub use range::RangeFilter;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::CityPersonsError;
use crate::ir::{AnnotationRecord, ClassMap, ImageAnnotations, Split, VocObject};

/// Filter ranges and switches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Keep boxes with `lo < width <= hi`.
    pub width_range: Option<RangeFilter>,

    /// Keep boxes with `lo < height <= hi`.
    pub height_range: Option<RangeFilter>,

    /// Keep boxes whose visible/full area ratio lies in `(lo, hi]`.
    pub visibility_range: Option<RangeFilter>,

    /// Exempt ignore regions from filtering and always re-append them.
    pub handle_ignore: bool,

    /// Apply the filter predicate to the train split.
    pub enable_train: bool,

    /// Apply the filter predicate to the val split.
    pub enable_val: bool,
}

impl Default for FilterConfig {
    /// Boxes wider than 10 px and at least half visible, train split only.
    fn default() -> Self {
        Self {
            width_range: Some(RangeFilter::above(10.0)),
            height_range: None,
            visibility_range: Some(RangeFilter::above(0.5)),
            handle_ignore: true,
            enable_train: true,
            enable_val: false,
        }
    }
}

impl FilterConfig {
    /// A configuration with no ranges and filtering enabled on both splits.
    pub fn unbounded() -> Self {
        Self {
            width_range: None,
            height_range: None,
            visibility_range: None,
            handle_ignore: true,
            enable_train: true,
            enable_val: true,
        }
    }

    /// Whether the filter predicate runs for `split`.
    pub fn enabled_for(&self, split: Split) -> bool {
        match split {
            Split::Train => self.enable_train,
            Split::Val => self.enable_val,
        }
    }
}

/// Result of the filter predicate over a record sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Indices of kept records, ascending.
    pub kept: Vec<usize>,
    /// Number of records removed.
    pub dropped: usize,
}

impl FilterOutcome {
    fn all_dropped(len: usize) -> Self {
        Self {
            kept: Vec::new(),
            dropped: len,
        }
    }
}

/// Applies class drop and the configured ranges to `records`.
///
/// Each stage yields the set of indices it keeps, and the result is their
/// intersection. As soon as one stage keeps nothing, every record is
/// reported as dropped and the later stages are not evaluated.
pub fn filter_records(
    records: &[AnnotationRecord],
    class_map: &ClassMap,
    config: &FilterConfig,
) -> FilterOutcome {
    let class_kept: BTreeSet<usize> = keep_indices(records, |record| {
        !class_map.is_drop(record.class_id)
    });
    if class_kept.is_empty() {
        return FilterOutcome::all_dropped(records.len());
    }

    let mut stages = vec![class_kept];

    let ranged: [(Option<RangeFilter>, fn(&AnnotationRecord) -> Option<f64>); 3] = [
        (config.width_range, |record| Some(record.bbox.width)),
        (config.height_range, |record| Some(record.bbox.height)),
        (config.visibility_range, AnnotationRecord::visibility_ratio),
    ];

    for (range, measure) in ranged {
        let Some(range) = range else {
            continue;
        };
        let stage = keep_indices(records, |record| {
            measure(record).is_some_and(|value| range.contains(value))
        });
        if stage.is_empty() {
            return FilterOutcome::all_dropped(records.len());
        }
        stages.push(stage);
    }

    let mut stages = stages.into_iter();
    let mut kept = stages.next().unwrap_or_default();
    for stage in stages {
        kept = kept.intersection(&stage).copied().collect();
    }

    FilterOutcome {
        dropped: records.len() - kept.len(),
        kept: kept.into_iter().collect(),
    }
}

fn keep_indices(
    records: &[AnnotationRecord],
    pred: impl Fn(&AnnotationRecord) -> bool,
) -> BTreeSet<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| pred(record))
        .map(|(idx, _)| idx)
        .collect()
}

/// What happened to one image.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageOutcome {
    /// The image gets an annotation file with these objects.
    Written(ConvertedImage),
    /// No record survived filtering; the image is left out entirely.
    Skipped { dropped: usize },
}

/// Converted objects for an image that will be written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConvertedImage {
    /// Filtered objects first, then ignore regions.
    pub objects: Vec<VocObject>,
    /// Records removed by class drop or the ranges.
    pub dropped: usize,
    /// Ignore regions appended after filtering.
    pub ignored: usize,
}

/// Filters and converts the records of one image.
///
/// `filter_enabled` selects whether the ranges apply for this split. When
/// it is off only dropped classes are removed and the image is always
/// written. When it is on, an image whose non-ignore records are all
/// filtered out is skipped, even if it has ignore regions.
pub fn process_image(
    image: &ImageAnnotations,
    class_map: &ClassMap,
    config: &FilterConfig,
    filter_enabled: bool,
) -> Result<ImageOutcome, CityPersonsError> {
    if let Some(record) = image
        .records
        .iter()
        .find(|record| class_map.get(record.class_id).is_none())
    {
        return Err(CityPersonsError::UnmappedClass {
            image: image.image_name.clone(),
            class_id: record.class_id,
        });
    }

    let separate_ignore = config.handle_ignore && !class_map.ignore_ids().is_empty();
    let (ignore_records, working): (Vec<&AnnotationRecord>, Vec<&AnnotationRecord>) =
        if separate_ignore {
            image
                .records
                .iter()
                .partition(|record| class_map.is_ignore(record.class_id))
        } else {
            (Vec::new(), image.records.iter().collect())
        };
    let working: Vec<AnnotationRecord> = working.into_iter().copied().collect();

    let outcome = if filter_enabled {
        let outcome = filter_records(&working, class_map, config);
        if outcome.kept.is_empty() {
            return Ok(ImageOutcome::Skipped {
                dropped: outcome.dropped,
            });
        }
        outcome
    } else {
        let kept: Vec<usize> = keep_indices(&working, |record| !class_map.is_drop(record.class_id))
            .into_iter()
            .collect();
        FilterOutcome {
            dropped: working.len() - kept.len(),
            kept,
        }
    };

    let mut objects = Vec::with_capacity(outcome.kept.len() + ignore_records.len());
    for idx in outcome.kept {
        objects.push(to_voc_object(&working[idx], class_map, image, false)?);
    }
    for record in &ignore_records {
        objects.push(to_voc_object(record, class_map, image, true)?);
    }

    Ok(ImageOutcome::Written(ConvertedImage {
        objects,
        dropped: outcome.dropped,
        ignored: ignore_records.len(),
    }))
}

fn to_voc_object(
    record: &AnnotationRecord,
    class_map: &ClassMap,
    image: &ImageAnnotations,
    is_ignore: bool,
) -> Result<VocObject, CityPersonsError> {
    let name = class_map
        .get(record.class_id)
        .and_then(|action| action.voc_name())
        .ok_or_else(|| CityPersonsError::UnmappedClass {
            image: image.image_name.clone(),
            class_id: record.class_id,
        })?;

    Ok(VocObject {
        class_id: record.class_id,
        name: name.to_string(),
        bbox: record.bbox.to_inclusive_xyxy(),
        is_ignore,
    })
}
