use std::path::PathBuf;
use thiserror::Error;

use crate::ir::ClassId;

/// The main error type for citypersons2voc operations.
#[derive(Debug, Error)]
pub enum CityPersonsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigWrite(#[source] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Image directory not found: {path}")]
    MissingImageSplitDir { path: PathBuf },

    #[error("Failed to read val order file {path}: {source}")]
    ValOrderRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Output directory already exists: {path} (use --on-existing recreate to replace it)")]
    DestinationExists { path: PathBuf },

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    SourceJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse annotation CSV from {path}: {source}")]
    SourceCsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid annotation record in {path}: {message}")]
    SourceRecordInvalid { path: PathBuf, message: String },

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageDimensionRead {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Invalid image dimensions in {path}: {message}")]
    ImageDimensionInvalid { path: PathBuf, message: String },

    #[error("Image {image} uses class id {class_id}, which is not in the class map")]
    UnmappedClass { image: String, class_id: ClassId },

    #[error("Failed to parse VOC XML {path}: {message}")]
    VocXmlParse { path: PathBuf, message: String },

    #[error("Failed to serialize report: {0}")]
    ReportWrite(#[source] serde_json::Error),
}
