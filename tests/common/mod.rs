#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Image size used for every fixture image.
pub const IMAGE_W: u32 = 64;
pub const IMAGE_H: u32 = 32;

pub const TRAIN_KEPT: &str = "aachen_000000_000019_leftImg8bit.png";
pub const TRAIN_IGNORE_ONLY: &str = "aachen_000001_000019_leftImg8bit.png";
pub const TRAIN_EMPTY: &str = "bochum_000000_000313_leftImg8bit.png";
pub const TRAIN_SECOND: &str = "bochum_000000_000600_leftImg8bit.png";
pub const VAL_SMALL: &str = "frankfurt_000000_000294_leftImg8bit.png";
pub const VAL_EMPTY: &str = "frankfurt_000000_000576_leftImg8bit.png";

/// Paths of a fixture dataset laid out like Cityscapes + CityPersons.
pub struct Fixture {
    pub root: PathBuf,
    pub image_root: PathBuf,
    pub train_json: PathBuf,
    pub val_json: PathBuf,
    pub output: PathBuf,
}

/// Train annotations exercising each filter stage.
///
/// With the default settings (width > 10, visibility > 0.5, train filtered):
/// - `TRAIN_KEPT` keeps one pedestrian plus one ignore region; one box is
///   too narrow and one is too occluded;
/// - `TRAIN_IGNORE_ONLY` only has an ignore region once the narrow box is
///   gone, so it is skipped;
/// - `TRAIN_EMPTY` has no boxes and is skipped;
/// - `TRAIN_SECOND` keeps a single pedestrian.
pub const TRAIN_JSON: &str = r#"[
  {"image": "aachen_000000_000019_leftImg8bit.png", "boxes": [
    [1, 100, 200, 40, 100, 24000, 100, 200, 40, 100],
    [1, 10, 20, 5, 12, 24001, 10, 20, 5, 12],
    [0, 300, 300, 50, 50, 0, 300, 300, 50, 50],
    [2, 500, 100, 30, 80, 24002, 500, 100, 10, 80]
  ]},
  {"image": "aachen_000001_000019_leftImg8bit.png", "boxes": [
    [0, 10, 10, 20, 20, 0, 10, 10, 20, 20],
    [1, 0, 0, 4, 4, 24003, 0, 0, 4, 4]
  ]},
  {"image": "bochum_000000_000313_leftImg8bit.png", "boxes": []},
  {"image": "bochum_000000_000600_leftImg8bit.png", "boxes": [
    [1, 5.5, 6.5, 20, 50, 24004, 5.5, 6.5, 20, 40]
  ]}
]"#;

/// Val annotations; the val split is unfiltered by default.
pub const VAL_JSON: &str = r#"[
  {"image": "frankfurt_000000_000294_leftImg8bit.png", "boxes": [
    [3, 0, 0, 30, 30, 0, 0, 0, 30, 30],
    [1, 50, 60, 8, 20, 24005, 50, 60, 2, 20]
  ]},
  {"image": "frankfurt_000000_000576_leftImg8bit.png", "boxes": []}
]"#;

/// Writes the fixture dataset under `root`. `output` is not created.
pub fn write_fixture(root: &Path) -> Fixture {
    let image_root = root.join("leftImg8bit");
    for name in [TRAIN_KEPT, TRAIN_IGNORE_ONLY, TRAIN_EMPTY, TRAIN_SECOND] {
        write_bmp(&cityscapes_path(&image_root, "train", name), IMAGE_W, IMAGE_H);
    }
    for name in [VAL_SMALL, VAL_EMPTY] {
        write_bmp(&cityscapes_path(&image_root, "val", name), IMAGE_W, IMAGE_H);
    }

    let annotations = root.join("annotations");
    fs::create_dir_all(&annotations).expect("create annotations dir");
    let train_json = annotations.join("anno_train.json");
    let val_json = annotations.join("anno_val.json");
    fs::write(&train_json, TRAIN_JSON).expect("write train json");
    fs::write(&val_json, VAL_JSON).expect("write val json");

    Fixture {
        root: root.to_path_buf(),
        image_root,
        train_json,
        val_json,
        output: root.join("cps_devkit"),
    }
}

/// `<image_root>/<split>/<city>/<name>`.
pub fn cityscapes_path(image_root: &Path, split: &str, name: &str) -> PathBuf {
    let city = name.split('_').next().expect("city prefix");
    image_root.join(split).join(city).join(name)
}

pub fn stem(name: &str) -> &str {
    name.split('.').next().expect("image stem")
}
