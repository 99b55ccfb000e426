//! Run configuration.
//!
//! A run is described by a YAML file (see `citypersons2voc print-config`)
//! whose fields can be overridden from the command line. Everything is
//! validated before the destination directory is touched.

use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CityPersonsError;
use crate::filter::FilterConfig;
use crate::ir::{ClassMap, Split};

/// On-disk format of the annotation source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// JSON array of `{image, boxes}` objects.
    #[default]
    Json,
    /// One CSV row per record.
    Csv,
}

/// What to do when the output directory already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DestinationPolicy {
    /// Fail without touching anything.
    #[default]
    Abort,
    /// Delete the directory and start from scratch.
    Recreate,
}

/// Where the per-split annotation sources live.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnotationPaths {
    pub train: PathBuf,
    pub val: PathBuf,
    pub format: SourceFormat,
}

impl Default for AnnotationPaths {
    fn default() -> Self {
        Self {
            train: PathBuf::from("data/annotations/anno_train.json"),
            val: PathBuf::from("data/annotations/anno_val.json"),
            format: SourceFormat::Json,
        }
    }
}

impl AnnotationPaths {
    pub fn for_split(&self, split: Split) -> &Path {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
        }
    }
}

/// Everything a conversion run needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertConfig {
    /// Annotation sources per split.
    pub annotations: AnnotationPaths,

    /// Cityscapes `leftImg8bit` directory with `train/` and `val/` inside.
    pub image_root: PathBuf,

    /// Devkit output directory.
    pub output_dir: PathBuf,

    /// Class id to name/ignore/drop.
    pub class_map: ClassMap,

    /// Filter ranges and switches.
    pub filter: FilterConfig,

    /// Copy processed images into `JPEGImages/`.
    pub copy_images: bool,

    /// Extension given to copied images. The bytes are not re-encoded.
    pub image_extension: String,

    /// Policy for an existing output directory.
    pub on_existing: DestinationPolicy,

    /// Precomputed val ordering copied verbatim to `val.txt`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub val_order_file: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            annotations: AnnotationPaths::default(),
            image_root: PathBuf::from("data/leftImg8bit"),
            output_dir: PathBuf::from("cps_devkit"),
            class_map: ClassMap::citypersons_default(),
            filter: FilterConfig::default(),
            copy_images: false,
            image_extension: "jpg".to_string(),
            on_existing: DestinationPolicy::Abort,
            val_order_file: None,
        }
    }
}

impl ConvertConfig {
    /// Loads a configuration file. Missing fields take their defaults.
    pub fn from_yaml_path(path: &Path) -> Result<Self, CityPersonsError> {
        let raw = fs::read_to_string(path).map_err(CityPersonsError::Io)?;
        serde_yaml::from_str(&raw).map_err(|source| CityPersonsError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a configuration from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CityPersonsError> {
        serde_yaml::from_str(yaml).map_err(|source| CityPersonsError::ConfigParse {
            path: PathBuf::from("<memory>"),
            source,
        })
    }

    /// Serializes the configuration back to YAML.
    pub fn to_yaml_string(&self) -> Result<String, CityPersonsError> {
        serde_yaml::to_string(self).map_err(CityPersonsError::ConfigWrite)
    }

    /// Checks the settings that serde cannot check on its own.
    pub fn validate(&self) -> Result<(), CityPersonsError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(CityPersonsError::InvalidConfig(
                "output_dir must not be empty".to_string(),
            ));
        }

        if self.class_map.is_empty() {
            return Err(CityPersonsError::InvalidConfig(
                "class_map must contain at least one class".to_string(),
            ));
        }

        let ext = self.image_extension.trim();
        if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
            return Err(CityPersonsError::InvalidConfig(format!(
                "image_extension must be a bare extension like 'jpg', got '{}'",
                self.image_extension
            )));
        }

        // Recreate deletes the output tree, so it must not contain the inputs.
        if self.on_existing == DestinationPolicy::Recreate {
            let output = resolve_path(&self.output_dir)?;
            let inputs = [
                Some(self.image_root.as_path()),
                Some(self.annotations.train.as_path()),
                Some(self.annotations.val.as_path()),
                self.val_order_file.as_deref(),
            ];
            for input in inputs.into_iter().flatten() {
                if resolve_path(input)?.starts_with(&output) {
                    return Err(CityPersonsError::InvalidConfig(format!(
                        "output_dir {} contains input {}; refusing to recreate it",
                        self.output_dir.display(),
                        input.display()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Absolute, `.`/`..`-free form of `path`, with its longest existing prefix
/// canonicalized so that differently spelled paths compare equal.
fn resolve_path(path: &Path) -> Result<PathBuf, CityPersonsError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(CityPersonsError::Io)?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }

    let mut existing = normalized.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(normalized),
        }
    }

    let mut resolved = existing.canonicalize().map_err(CityPersonsError::Io)?;
    for name in missing.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}
