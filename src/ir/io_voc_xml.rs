//! Pascal VOC devkit writer.
//!
//! Produces the VOC2007-style tree downstream detectors expect:
//!
//! ```text
//! <output>/data/Annotations/<stem>.xml
//! <output>/data/ImageSets/Main/{train,val}.txt
//! <output>/data/JPEGImages/<stem>.jpg
//! ```
//!
//! A small reader is included so written files can be checked back.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::Node;

use super::model::VocObject;
use super::BBoxXYXY;
use crate::error::CityPersonsError;

const VOC_XML_EXTENSION: &str = "xml";
const JPEG_IMAGES_README: &str = "This directory is a placeholder. Images were not copied during conversion.\nPlace the Cityscapes images here (renamed to <stem>.jpg) to complete the VOC layout.\n";

/// Directory layout of a VOC devkit rooted at an output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VocLayout {
    pub root: PathBuf,
    pub annotations_dir: PathBuf,
    pub image_sets_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl VocLayout {
    /// Computes the layout under `root` without touching the filesystem.
    pub fn new(root: &Path) -> Self {
        let data_dir = root.join("data");
        Self {
            root: root.to_path_buf(),
            annotations_dir: data_dir.join("Annotations"),
            image_sets_dir: data_dir.join("ImageSets").join("Main"),
            images_dir: data_dir.join("JPEGImages"),
        }
    }

    /// Creates the devkit directories.
    ///
    /// When images are not copied, `JPEGImages/` only receives a README.
    pub fn create(&self, copy_images: bool) -> Result<(), CityPersonsError> {
        fs::create_dir_all(&self.annotations_dir).map_err(CityPersonsError::Io)?;
        fs::create_dir_all(&self.image_sets_dir).map_err(CityPersonsError::Io)?;
        fs::create_dir_all(&self.images_dir).map_err(CityPersonsError::Io)?;
        if !copy_images {
            fs::write(self.images_dir.join("README.txt"), JPEG_IMAGES_README)
                .map_err(CityPersonsError::Io)?;
        }
        Ok(())
    }

    /// Path of the annotation file for an image stem.
    pub fn annotation_path(&self, stem: &str) -> PathBuf {
        self.annotations_dir
            .join(stem)
            .with_extension(VOC_XML_EXTENSION)
    }

    /// Path of a split manifest (`train.txt`, `val.txt`).
    pub fn manifest_path(&self, split: &str) -> PathBuf {
        self.image_sets_dir.join(format!("{split}.txt"))
    }
}

/// Writes one VOC annotation file.
pub fn write_voc_annotation(
    xml_path: &Path,
    file_name: &str,
    width: u32,
    height: u32,
    objects: &[VocObject],
) -> Result<(), CityPersonsError> {
    let xml = render_voc_xml(file_name, width, height, objects);
    fs::write(xml_path, xml).map_err(CityPersonsError::Io)
}

/// Renders one VOC annotation document.
///
/// Coordinates are written with three decimals.
pub fn render_voc_xml(file_name: &str, width: u32, height: u32, objects: &[VocObject]) -> String {
    let mut xml = String::new();

    writeln!(xml, "<annotation>").expect("write to string");
    writeln!(xml, "  <folder>VOC2007</folder>").expect("write to string");
    writeln!(xml, "  <filename>{}</filename>", xml_escape(file_name)).expect("write to string");
    writeln!(xml, "  <source>").expect("write to string");
    writeln!(xml, "    <database>My Database</database>").expect("write to string");
    writeln!(xml, "    <annotation>CityPersons</annotation>").expect("write to string");
    writeln!(xml, "    <image>flickr</image>").expect("write to string");
    writeln!(xml, "    <flickrid>NULL</flickrid>").expect("write to string");
    writeln!(xml, "  </source>").expect("write to string");
    writeln!(xml, "  <owner>").expect("write to string");
    writeln!(xml, "    <flickrid>NULL</flickrid>").expect("write to string");
    writeln!(xml, "    <name>facevise</name>").expect("write to string");
    writeln!(xml, "  </owner>").expect("write to string");
    writeln!(xml, "  <size>").expect("write to string");
    writeln!(xml, "    <width>{}</width>", width).expect("write to string");
    writeln!(xml, "    <height>{}</height>", height).expect("write to string");
    writeln!(xml, "    <depth>3</depth>").expect("write to string");
    writeln!(xml, "  </size>").expect("write to string");
    writeln!(xml, "  <segmented>0</segmented>").expect("write to string");

    for object in objects {
        writeln!(xml, "  <object>").expect("write to string");
        writeln!(xml, "    <name>{}</name>", xml_escape(&object.name)).expect("write to string");
        writeln!(xml, "    <pose>Unspecified</pose>").expect("write to string");
        writeln!(xml, "    <truncated>0</truncated>").expect("write to string");
        writeln!(xml, "    <difficult>0</difficult>").expect("write to string");
        writeln!(xml, "    <bndbox>").expect("write to string");
        writeln!(xml, "      <xmin>{:.3}</xmin>", object.bbox.xmin).expect("write to string");
        writeln!(xml, "      <ymin>{:.3}</ymin>", object.bbox.ymin).expect("write to string");
        writeln!(xml, "      <xmax>{:.3}</xmax>", object.bbox.xmax).expect("write to string");
        writeln!(xml, "      <ymax>{:.3}</ymax>", object.bbox.ymax).expect("write to string");
        writeln!(xml, "    </bndbox>").expect("write to string");
        writeln!(xml, "  </object>").expect("write to string");
    }

    writeln!(xml, "</annotation>").expect("write to string");
    xml
}

/// A VOC annotation file read back from disk.
#[derive(Clone, Debug, PartialEq)]
pub struct VocAnnotation {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub objects: Vec<(String, BBoxXYXY)>,
}

/// Reads one VOC annotation file.
pub fn read_voc_annotation(path: &Path) -> Result<VocAnnotation, CityPersonsError> {
    let xml = fs::read_to_string(path).map_err(CityPersonsError::Io)?;
    parse_voc_xml_str(&xml, path)
}

/// Parses VOC XML from a UTF-8 string.
pub fn read_voc_annotation_str(xml: &str) -> Result<VocAnnotation, CityPersonsError> {
    parse_voc_xml_str(xml, Path::new("<memory>"))
}

/// Parses VOC XML from bytes.
///
/// The input must be valid UTF-8.
pub fn read_voc_annotation_slice(bytes: &[u8]) -> Result<VocAnnotation, CityPersonsError> {
    let xml = std::str::from_utf8(bytes).map_err(|source| CityPersonsError::VocXmlParse {
        path: PathBuf::from("<memory>"),
        message: format!("input is not valid UTF-8: {source}"),
    })?;
    read_voc_annotation_str(xml)
}

fn parse_voc_xml_str(xml: &str, path: &Path) -> Result<VocAnnotation, CityPersonsError> {
    let document =
        roxmltree::Document::parse(xml).map_err(|source| CityPersonsError::VocXmlParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let annotation = document.root_element();
    if annotation.tag_name().name() != "annotation" {
        return Err(CityPersonsError::VocXmlParse {
            path: path.to_path_buf(),
            message: "missing <annotation> root element".to_string(),
        });
    }

    let filename = required_child_text(annotation, "filename", path, "<annotation>")?;
    let size = required_child_element(annotation, "size", path, "<annotation>")?;
    let width = parse_required::<u32>(size, "width", path, "<size>")?;
    let height = parse_required::<u32>(size, "height", path, "<size>")?;

    let mut objects = Vec::new();
    for object in annotation
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "object")
    {
        let name = required_child_text(object, "name", path, "<object>")?;
        let bndbox = required_child_element(object, "bndbox", path, "<object>")?;
        let bbox = BBoxXYXY::from_xyxy(
            parse_required::<f64>(bndbox, "xmin", path, "<bndbox>")?,
            parse_required::<f64>(bndbox, "ymin", path, "<bndbox>")?,
            parse_required::<f64>(bndbox, "xmax", path, "<bndbox>")?,
            parse_required::<f64>(bndbox, "ymax", path, "<bndbox>")?,
        );
        objects.push((name, bbox));
    }

    Ok(VocAnnotation {
        filename,
        width,
        height,
        objects,
    })
}

fn required_child_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<Node<'a, 'input>, CityPersonsError> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == tag)
        .ok_or_else(|| CityPersonsError::VocXmlParse {
            path: path.to_path_buf(),
            message: format!("missing <{tag}> in {context}"),
        })
}

fn required_child_text(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<String, CityPersonsError> {
    required_child_element(node, tag, path, context)?
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(ToOwned::to_owned)
        .ok_or_else(|| CityPersonsError::VocXmlParse {
            path: path.to_path_buf(),
            message: format!("empty <{tag}> in {context}"),
        })
}

fn parse_required<T: std::str::FromStr>(
    node: Node<'_, '_>,
    tag: &str,
    path: &Path,
    context: &str,
) -> Result<T, CityPersonsError> {
    let raw = required_child_text(node, tag, path, context)?;
    raw.parse::<T>().map_err(|_| CityPersonsError::VocXmlParse {
        path: path.to_path_buf(),
        message: format!("invalid <{tag}> value '{raw}' in {context}"),
    })
}

fn xml_escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // Parsers normalize raw whitespace control characters.
            '\t' => escaped.push_str("&#9;"),
            '\n' => escaped.push_str("&#10;"),
            '\r' => escaped.push_str("&#13;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ClassId;

    fn ped(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> VocObject {
        VocObject {
            class_id: ClassId(1),
            name: "ped".to_string(),
            bbox: BBoxXYXY::from_xyxy(xmin, ymin, xmax, ymax),
            is_ignore: false,
        }
    }

    #[test]
    fn render_uses_three_decimal_coordinates() {
        let xml = render_voc_xml("img.png", 2048, 1024, &[ped(10.0, 20.5, 19.125, 39.0)]);
        assert!(xml.contains("<filename>img.png</filename>"));
        assert!(xml.contains("<width>2048</width>"));
        assert!(xml.contains("<depth>3</depth>"));
        assert!(xml.contains("<xmin>10.000</xmin>"));
        assert!(xml.contains("<ymin>20.500</ymin>"));
        assert!(xml.contains("<xmax>19.125</xmax>"));
        assert!(xml.contains("<ymax>39.000</ymax>"));
        assert!(xml.contains("<difficult>0</difficult>"));
    }

    #[test]
    fn render_then_parse_keeps_objects_in_order() {
        let mut ignore = ped(0.0, 0.0, 4.0, 4.0);
        ignore.name = "ignore".to_string();
        let xml = render_voc_xml("a&b.png", 100, 50, &[ped(1.0, 2.0, 3.0, 4.0), ignore]);

        let parsed = read_voc_annotation_str(&xml).expect("parse rendered xml");
        assert_eq!(parsed.filename, "a&b.png");
        assert_eq!(parsed.width, 100);
        assert_eq!(parsed.height, 50);
        assert_eq!(parsed.objects.len(), 2);
        assert_eq!(parsed.objects[0].0, "ped");
        assert_eq!(parsed.objects[1].0, "ignore");
        assert_eq!(parsed.objects[0].1, BBoxXYXY::from_xyxy(1.0, 2.0, 3.0, 4.0));
    }

    #[test]
    fn render_includes_source_and_owner_blocks() {
        let xml = render_voc_xml("img.png", 10, 10, &[]);
        assert!(xml.contains("<annotation>CityPersons</annotation>"));
        assert!(xml.contains("<owner>\n    <flickrid>NULL</flickrid>\n    <name>facevise</name>\n  </owner>"));
        read_voc_annotation_str(&xml).expect("parse rendered xml");
    }

    #[test]
    fn control_characters_survive_render_and_parse() {
        let parsed = read_voc_annotation_str(
            "<annotation><filename>a.png</filename>\
             <size><width>1</width><height>1</height></size>\
             <object><name>p&#13;e&#9;d</name>\
             <bndbox><xmin>0</xmin><ymin>0</ymin><xmax>1</xmax><ymax>1</ymax></bndbox>\
             </object></annotation>",
        )
        .expect("parse source xml");
        assert_eq!(parsed.objects[0].0, "p\re\td");

        let mut object = ped(0.0, 0.0, 1.0, 1.0);
        object.name = parsed.objects[0].0.clone();
        let xml = render_voc_xml("line\nbreak.png", 1, 1, &[object]);
        assert!(xml.contains("<name>p&#13;e&#9;d</name>"));

        let again = read_voc_annotation_str(&xml).expect("parse rendered xml");
        assert_eq!(again.filename, "line\nbreak.png");
        assert_eq!(again.objects[0].0, "p\re\td");
    }

    #[test]
    fn parse_rejects_missing_size() {
        let err = read_voc_annotation_str("<annotation><filename>a</filename></annotation>")
            .unwrap_err();
        assert!(err.to_string().contains("missing <size>"));
    }

    #[test]
    fn layout_creates_placeholder_when_not_copying() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = VocLayout::new(temp.path());
        layout.create(false).expect("create layout");

        assert!(layout.annotations_dir.is_dir());
        assert!(layout.image_sets_dir.is_dir());
        assert!(layout.images_dir.join("README.txt").is_file());
        assert_eq!(
            layout.annotation_path("x_leftImg8bit"),
            temp.path().join("data/Annotations/x_leftImg8bit.xml")
        );
        assert_eq!(
            layout.manifest_path("val"),
            temp.path().join("data/ImageSets/Main/val.txt")
        );
    }
}
