//! Dataset assembly: turns both splits into a VOC devkit.
//!
//! The run is sequential. Inputs are checked and loaded before the
//! destination is touched, so a bad configuration or a missing image
//! directory never costs an existing output tree.

mod images;
pub mod report;

pub use images::{copy_image, read_image_dimensions, source_image_path};
pub use report::{RunReport, SplitReport};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};

use crate::config::{ConvertConfig, DestinationPolicy, SourceFormat};
use crate::error::CityPersonsError;
use crate::filter::{process_image, ImageOutcome};
use crate::ir::io_source_csv::read_source_csv;
use crate::ir::io_source_json::read_source_json;
use crate::ir::io_voc_xml::{write_voc_annotation, VocLayout};
use crate::ir::{AnnotationSet, Split};

const REPORT_FILE: &str = "report.txt";
const CONFIG_FILE: &str = "config.yaml";

/// Runs a full conversion and returns its report.
///
/// Order of work:
/// 1. validate the configuration,
/// 2. check that `<image_root>/train` and `<image_root>/val` exist,
/// 3. load both annotation sources and the val order file, if any,
/// 4. apply the destination policy and create the devkit tree,
/// 5. process train, then val,
/// 6. write manifests, `report.txt` and `config.yaml`.
pub fn convert(config: &ConvertConfig) -> Result<RunReport, CityPersonsError> {
    config.validate()?;
    check_image_root(&config.image_root)?;

    let train = load_source(config, Split::Train)?;
    let val = load_source(config, Split::Val)?;
    let val_order = config
        .val_order_file
        .as_deref()
        .map(read_val_order)
        .transpose()?;

    prepare_destination(&config.output_dir, config.on_existing)?;
    let layout = VocLayout::new(&config.output_dir);
    layout.create(config.copy_images)?;

    let mut report = RunReport::new(config);

    for (split, images) in [(Split::Train, &train), (Split::Val, &val)] {
        let (names, mut split_report) = process_split(config, &layout, split, images)?;

        let manifest = layout.manifest_path(split.name());
        match (split, &val_order) {
            (Split::Val, Some(order)) => {
                install_val_order(order, &manifest, &names)?;
                split_report.manifest_override = Some(order.path.clone());
            }
            _ => write_manifest(&manifest, &names)?,
        }

        info!(
            "{}: {} of {} images written, {} boxes ({:.2} per image)",
            split,
            split_report.written_images,
            split_report.source_images,
            split_report.kept_boxes,
            split_report.boxes_per_image
        );
        report.splits.push(split_report);
    }

    fs::write(config.output_dir.join(REPORT_FILE), report.to_string())
        .map_err(CityPersonsError::Io)?;
    fs::write(config.output_dir.join(CONFIG_FILE), config.to_yaml_string()?)
        .map_err(CityPersonsError::Io)?;

    if !config.copy_images {
        warn!(
            "JPEGImages/ is empty because images were not copied; use --copy-images to fill it"
        );
    }

    Ok(report)
}

/// Applies the destination policy to `root` and leaves an empty directory.
pub fn prepare_destination(root: &Path, policy: DestinationPolicy) -> Result<(), CityPersonsError> {
    if root.exists() {
        match policy {
            DestinationPolicy::Abort => {
                return Err(CityPersonsError::DestinationExists {
                    path: root.to_path_buf(),
                });
            }
            DestinationPolicy::Recreate => {
                warn!("removing existing output at {}", root.display());
                if root.is_dir() {
                    fs::remove_dir_all(root).map_err(CityPersonsError::Io)?;
                } else {
                    fs::remove_file(root).map_err(CityPersonsError::Io)?;
                }
            }
        }
    }

    fs::create_dir_all(root).map_err(CityPersonsError::Io)
}

/// Fails unless both split directories exist under `image_root`.
pub fn check_image_root(image_root: &Path) -> Result<(), CityPersonsError> {
    for split in [Split::Train, Split::Val] {
        let dir = image_root.join(split.name());
        if !dir.is_dir() {
            return Err(CityPersonsError::MissingImageSplitDir { path: dir });
        }
    }
    Ok(())
}

/// Loads the annotation source of one split in the configured format.
pub fn load_source(config: &ConvertConfig, split: Split) -> Result<AnnotationSet, CityPersonsError> {
    let path = config.annotations.for_split(split);
    info!("loading {} annotations from {}", split, path.display());
    match config.annotations.format {
        SourceFormat::Json => read_source_json(path),
        SourceFormat::Csv => read_source_csv(path),
    }
}

/// Processes one split in source order.
///
/// Returns the stems of written images, in order, and the split counters.
fn process_split(
    config: &ConvertConfig,
    layout: &VocLayout,
    split: Split,
    images: &AnnotationSet,
) -> Result<(Vec<String>, SplitReport), CityPersonsError> {
    let filter_enabled = config.filter.enabled_for(split);
    let mut split_report = SplitReport::new(split, filter_enabled);
    let mut names = Vec::with_capacity(images.len());

    info!(
        "processing {} ({} images, filter {})",
        split,
        images.len(),
        if filter_enabled { "on" } else { "off" }
    );
    let pb = create_progress_bar(images.len() as u64, split.name());

    for image in images {
        let source_path = source_image_path(&config.image_root, split, image);
        let (width, height) = read_image_dimensions(&source_path)?;

        let outcome = process_image(image, &config.class_map, &config.filter, filter_enabled)?;
        split_report.record(&outcome);

        match outcome {
            ImageOutcome::Skipped { dropped } => {
                debug!(
                    "skipping {}: no instance left after filtering ({} dropped)",
                    image.image_name, dropped
                );
            }
            ImageOutcome::Written(converted) => {
                let stem = image.stem();
                write_voc_annotation(
                    &layout.annotation_path(stem),
                    &image.image_name,
                    width,
                    height,
                    &converted.objects,
                )?;

                if config.copy_images {
                    copy_image(
                        &source_path,
                        &layout.images_dir,
                        stem,
                        &config.image_extension,
                    )?;
                }

                names.push(stem.to_string());
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();
    Ok((names, split_report))
}

fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::with_template(&format!(
        "{{spinner:.green}} [{label}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})"
    ))
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Writes one name per line, no trailing newline.
fn write_manifest(path: &Path, names: &[String]) -> Result<(), CityPersonsError> {
    fs::write(path, names.join("\n")).map_err(CityPersonsError::Io)
}

/// A precomputed val ordering, read before the destination is touched.
#[derive(Debug)]
struct ValOrder {
    path: PathBuf,
    contents: Vec<u8>,
}

fn read_val_order(path: &Path) -> Result<ValOrder, CityPersonsError> {
    let contents = fs::read(path).map_err(|source| CityPersonsError::ValOrderRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ValOrder {
        path: path.to_path_buf(),
        contents,
    })
}

/// Installs the precomputed val ordering in place of the natural one.
///
/// Evaluation tooling expects the val images in a fixed, ID-sorted order,
/// so the file is copied verbatim. Differences against what was actually
/// written are only reported.
fn install_val_order(
    order: &ValOrder,
    manifest: &Path,
    written: &[String],
) -> Result<(), CityPersonsError> {
    fs::write(manifest, &order.contents).map_err(CityPersonsError::Io)?;

    let listed_raw = String::from_utf8_lossy(&order.contents);
    let listed: HashSet<&str> = listed_raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let written_set: HashSet<&str> = written.iter().map(String::as_str).collect();

    let not_written = listed.difference(&written_set).count();
    let not_listed = written_set.difference(&listed).count();
    if not_written > 0 || not_listed > 0 {
        warn!(
            "val order file {} lists {} image(s) without annotations and omits {} written image(s)",
            order.path.display(),
            not_written,
            not_listed
        );
    } else {
        info!("val manifest copied from {}", order.path.display());
    }

    Ok(())
}
