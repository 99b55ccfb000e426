//! Record types and I/O for CityPersons annotations.
//!
//! Rows from the annotation source are unpacked into immutable
//! [`AnnotationRecord`]s with named fields. The filter turns them into
//! [`VocObject`]s, which the VOC writer renders.
//!
//! # Example
//!
//! ```
//! use citypersons2voc::ir::{AnnotationRecord, BBoxXYWH, BBoxXYXY};
//!
//! let record = AnnotationRecord::from_row(&[
//!     1.0, 10.0, 20.0, 30.0, 60.0, 1.0, 10.0, 20.0, 30.0, 60.0,
//! ])
//! .unwrap();
//! assert_eq!(record.bbox, BBoxXYWH::new(10.0, 20.0, 30.0, 60.0));
//! assert_eq!(
//!     record.bbox.to_inclusive_xyxy(),
//!     BBoxXYXY::from_xyxy(10.0, 20.0, 39.0, 79.0)
//! );
//! ```

mod bbox;
mod class_map;
mod ids;
pub mod io_source_csv;
pub mod io_source_json;
pub mod io_voc_xml;
mod model;

// Re-export core types for convenient access
pub use bbox::{BBoxXYWH, BBoxXYXY};
pub use class_map::{ClassAction, ClassMap, IGNORE_NAME};
pub use ids::ClassId;
pub use model::{
    AnnotationRecord, AnnotationSet, ImageAnnotations, Split, VocObject, RECORD_FIELDS,
};
