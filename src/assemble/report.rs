//! Run report: what the conversion did, per split.
//!
//! Rendered as text into `report.txt` at the end of a run, and available as
//! JSON from the CLI.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::config::ConvertConfig;
use crate::filter::{ImageOutcome, RangeFilter};
use crate::ir::{ClassMap, Split};

/// Counters for one split.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SplitReport {
    pub split: Split,
    /// Whether the filter predicate ran for this split.
    pub filter_enabled: bool,
    /// Images in the annotation source.
    pub source_images: usize,
    /// Images that received an annotation file.
    pub written_images: usize,
    /// Images left out because nothing survived filtering.
    pub skipped_images: usize,
    /// Boxes written, ignore regions included.
    pub kept_boxes: usize,
    /// Ignore regions among `kept_boxes`.
    pub ignore_boxes: usize,
    /// Boxes removed by class drop or the ranges.
    pub dropped_boxes: usize,
    /// `kept_boxes / written_images`, 0 when nothing was written.
    pub boxes_per_image: f64,
    /// Where the val ordering came from, when it was not the natural order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_override: Option<PathBuf>,
}

impl SplitReport {
    pub fn new(split: Split, filter_enabled: bool) -> Self {
        Self {
            split,
            filter_enabled,
            source_images: 0,
            written_images: 0,
            skipped_images: 0,
            kept_boxes: 0,
            ignore_boxes: 0,
            dropped_boxes: 0,
            boxes_per_image: 0.0,
            manifest_override: None,
        }
    }

    /// Adds one image's outcome to the counters.
    pub fn record(&mut self, outcome: &ImageOutcome) {
        self.source_images += 1;
        match outcome {
            ImageOutcome::Written(converted) => {
                self.written_images += 1;
                self.kept_boxes += converted.objects.len();
                self.ignore_boxes += converted.ignored;
                self.dropped_boxes += converted.dropped;
            }
            ImageOutcome::Skipped { dropped } => {
                self.skipped_images += 1;
                self.dropped_boxes += dropped;
            }
        }
        self.boxes_per_image = if self.written_images == 0 {
            0.0
        } else {
            self.kept_boxes as f64 / self.written_images as f64
        };
    }
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filter = if self.filter_enabled {
            "filter enabled"
        } else {
            "filter disabled"
        };
        writeln!(f, "{} ({}):", self.split, filter)?;
        writeln!(f, "  source images:   {}", self.source_images)?;
        writeln!(f, "  written images:  {}", self.written_images)?;
        writeln!(f, "  skipped images:  {}", self.skipped_images)?;
        writeln!(
            f,
            "  kept boxes:      {} ({} ignore)",
            self.kept_boxes, self.ignore_boxes
        )?;
        writeln!(f, "  dropped boxes:   {}", self.dropped_boxes)?;
        writeln!(f, "  boxes per image: {:.2}", self.boxes_per_image)?;
        if let Some(path) = &self.manifest_override {
            writeln!(f, "  manifest order:  copied from {}", path.display())?;
        }
        Ok(())
    }
}

/// The complete report for one run, including the settings used.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub width_range: Option<RangeFilter>,
    pub height_range: Option<RangeFilter>,
    pub visibility_range: Option<RangeFilter>,
    pub handle_ignore: bool,
    pub class_map: ClassMap,
    pub copy_images: bool,
    pub splits: Vec<SplitReport>,
}

impl RunReport {
    /// Starts an empty report for `config`.
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            output_dir: config.output_dir.clone(),
            width_range: config.filter.width_range,
            height_range: config.filter.height_range,
            visibility_range: config.filter.visibility_range,
            handle_ignore: config.filter.handle_ignore,
            class_map: config.class_map.clone(),
            copy_images: config.copy_images,
            splits: Vec::new(),
        }
    }

    /// Report for `split`, if it has been processed.
    pub fn split(&self, split: Split) -> Option<&SplitReport> {
        self.splits.iter().find(|report| report.split == split)
    }
}

fn fmt_range(range: Option<RangeFilter>) -> String {
    range
        .map(|range| range.to_string())
        .unwrap_or_else(|| "none".to_string())
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CityPersons to VOC conversion")?;
        writeln!(f, "output: {}", self.output_dir.display())?;
        writeln!(f)?;
        writeln!(f, "filter:")?;
        writeln!(f, "  width range:      {}", fmt_range(self.width_range))?;
        writeln!(f, "  height range:     {}", fmt_range(self.height_range))?;
        writeln!(f, "  visibility range: {}", fmt_range(self.visibility_range))?;
        writeln!(f, "  handle ignore:    {}", self.handle_ignore)?;
        writeln!(f, "class map: {}", self.class_map)?;
        writeln!(f, "copy images: {}", self.copy_images)?;

        for split in &self.splits {
            writeln!(f)?;
            write!(f, "{split}")?;
        }

        if !self.copy_images {
            writeln!(f)?;
            writeln!(
                f,
                "Note: JPEGImages/ is empty because images were not copied."
            )?;
        }

        Ok(())
    }
}
