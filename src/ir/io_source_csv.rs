//! CSV export of the CityPersons annotation source.
//!
//! One row per annotation record, with the image name in front of the ten
//! CityPersons fields:
//!
//! ```text
//! image,class_label,x,y,width,height,instance_id,x_vis,y_vis,width_vis,height_vis
//! ```
//!
//! Images are grouped in order of first appearance. Images without any
//! record cannot be expressed in this format.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use super::model::{AnnotationRecord, AnnotationSet, ImageAnnotations};
use crate::error::CityPersonsError;

/// A single row in the source CSV.
#[derive(Debug, Deserialize)]
struct SourceRow {
    image: String,
    class_label: f64,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    instance_id: f64,
    x_vis: f64,
    y_vis: f64,
    width_vis: f64,
    height_vis: f64,
}

impl SourceRow {
    fn fields(&self) -> [f64; 10] {
        [
            self.class_label,
            self.x,
            self.y,
            self.width,
            self.height,
            self.instance_id,
            self.x_vis,
            self.y_vis,
            self.width_vis,
            self.height_vis,
        ]
    }
}

/// Reads an annotation source from a CSV file.
pub fn read_source_csv(path: &Path) -> Result<AnnotationSet, CityPersonsError> {
    let file = File::open(path).map_err(CityPersonsError::Io)?;
    read_from(BufReader::new(file), path)
}

/// Parses an annotation source from a CSV string.
pub fn from_source_csv_str(csv: &str) -> Result<AnnotationSet, CityPersonsError> {
    from_source_csv_slice(csv.as_bytes())
}

/// Parses an annotation source from CSV bytes.
pub fn from_source_csv_slice(bytes: &[u8]) -> Result<AnnotationSet, CityPersonsError> {
    read_from(bytes, Path::new("<memory>"))
}

fn read_from<R: Read>(reader: R, path: &Path) -> Result<AnnotationSet, CityPersonsError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut images: AnnotationSet = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for (row_idx, result) in csv_reader.deserialize().enumerate() {
        let row: SourceRow = result.map_err(|source| CityPersonsError::SourceCsvParse {
            path: path.to_path_buf(),
            source,
        })?;

        if row.image.is_empty() {
            return Err(CityPersonsError::SourceRecordInvalid {
                path: path.to_path_buf(),
                message: format!("row {}: image name must not be empty", row_idx + 1),
            });
        }

        let record = AnnotationRecord::from_row(&row.fields()).map_err(|message| {
            CityPersonsError::SourceRecordInvalid {
                path: path.to_path_buf(),
                message: format!("row {} ('{}'): {}", row_idx + 1, row.image, message),
            }
        })?;

        let idx = *index_by_name.entry(row.image.clone()).or_insert_with(|| {
            images.push(ImageAnnotations::new(row.image.clone(), Vec::new()));
            images.len() - 1
        });
        images[idx].records.push(record);
    }

    Ok(images)
}
