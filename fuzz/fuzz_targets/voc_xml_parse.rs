//! Fuzz target for reading back VOC annotation XML.
//!
//! Anything that parses must render and parse again to the same values.

#![no_main]

use libfuzzer_sys::fuzz_target;
use citypersons2voc::ir::io_voc_xml::{read_voc_annotation_slice, read_voc_annotation_str, render_voc_xml};
use citypersons2voc::ir::{ClassId, VocObject};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(annotation) = read_voc_annotation_slice(data) else {
        return;
    };

    // Re-rendering rounds coordinates to three decimals, so only names and
    // sizes are compared.
    let objects: Vec<VocObject> = annotation
        .objects
        .iter()
        .map(|(name, bbox)| VocObject {
            class_id: ClassId(0),
            name: name.clone(),
            bbox: *bbox,
            is_ignore: false,
        })
        .collect();
    let xml = render_voc_xml(&annotation.filename, annotation.width, annotation.height, &objects);
    let again = read_voc_annotation_str(&xml).expect("rendered XML parses");

    assert_eq!(again.filename, annotation.filename);
    assert_eq!((again.width, again.height), (annotation.width, annotation.height));
    let names: Vec<&String> = again.objects.iter().map(|(name, _)| name).collect();
    let expected: Vec<&String> = annotation.objects.iter().map(|(name, _)| name).collect();
    assert_eq!(names, expected);
});
