//! JSON export of the CityPersons annotation source.
//!
//! CityPersons ships its annotations as MATLAB structs (`anno_train.mat`,
//! `anno_val.mat`). This reader consumes a JSON export of the same content:
//!
//! ```json
//! [
//!   { "image": "aachen_000000_000019_leftImg8bit.png",
//!     "boxes": [[1, 946, 405, 35, 86, 1, 946, 405, 35, 86]] }
//! ]
//! ```
//!
//! Each box is the raw 10-field row. Images may have an empty `boxes` array,
//! and image order is preserved.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::model::{AnnotationRecord, AnnotationSet, ImageAnnotations};
use crate::error::CityPersonsError;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceImage {
    image: String,
    #[serde(default)]
    boxes: Vec<Vec<f64>>,
}

/// Reads an annotation source from a JSON file.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use citypersons2voc::ir::io_source_json::read_source_json;
///
/// let images = read_source_json(Path::new("anno_train.json"))?;
/// # Ok::<(), citypersons2voc::CityPersonsError>(())
/// ```
pub fn read_source_json(path: &Path) -> Result<AnnotationSet, CityPersonsError> {
    let file = File::open(path).map_err(CityPersonsError::Io)?;
    let reader = BufReader::new(file);
    let entries: Vec<SourceImage> =
        serde_json::from_reader(reader).map_err(|source| CityPersonsError::SourceJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    source_to_ir(entries, path)
}

/// Parses an annotation source from a JSON string.
pub fn from_source_json_str(json: &str) -> Result<AnnotationSet, CityPersonsError> {
    let path = Path::new("<memory>");
    let entries: Vec<SourceImage> =
        serde_json::from_str(json).map_err(|source| CityPersonsError::SourceJsonParse {
            path: path.to_path_buf(),
            source,
        })?;
    source_to_ir(entries, path)
}

/// Parses an annotation source from JSON bytes.
pub fn from_source_json_slice(bytes: &[u8]) -> Result<AnnotationSet, CityPersonsError> {
    let entries: Vec<SourceImage> =
        serde_json::from_slice(bytes).map_err(|source| CityPersonsError::SourceJsonParse {
            path: PathBuf::from("<memory>"),
            source,
        })?;
    source_to_ir(entries, Path::new("<memory>"))
}

fn source_to_ir(entries: Vec<SourceImage>, path: &Path) -> Result<AnnotationSet, CityPersonsError> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut images = Vec::with_capacity(entries.len());

    for entry in entries {
        if entry.image.trim().is_empty() {
            return Err(CityPersonsError::SourceRecordInvalid {
                path: path.to_path_buf(),
                message: "image name must not be empty".to_string(),
            });
        }

        if !seen.insert(entry.image.clone()) {
            return Err(CityPersonsError::SourceRecordInvalid {
                path: path.to_path_buf(),
                message: format!("duplicate image '{}'", entry.image),
            });
        }

        let records = entry
            .boxes
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                AnnotationRecord::from_row(row).map_err(|message| {
                    CityPersonsError::SourceRecordInvalid {
                        path: path.to_path_buf(),
                        message: format!("image '{}', box {}: {}", entry.image, idx, message),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        images.push(ImageAnnotations::new(entry.image, records));
    }

    Ok(images)
}
