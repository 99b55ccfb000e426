//! Source image lookup, dimension probing and copying.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CityPersonsError;
use crate::ir::{ImageAnnotations, Split};

/// Cityscapes location of an image: `<root>/<split>/<city>/<name>`.
pub fn source_image_path(image_root: &Path, split: Split, image: &ImageAnnotations) -> PathBuf {
    image_root
        .join(split.name())
        .join(image.city())
        .join(&image.image_name)
}

/// Reads `(width, height)` from the image header.
pub fn read_image_dimensions(path: &Path) -> Result<(u32, u32), CityPersonsError> {
    let size = imagesize::size(path).map_err(|source| CityPersonsError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size
        .width
        .try_into()
        .map_err(|_| CityPersonsError::ImageDimensionInvalid {
            path: path.to_path_buf(),
            message: format!("image width {} does not fit in u32", size.width),
        })?;

    let height: u32 = size
        .height
        .try_into()
        .map_err(|_| CityPersonsError::ImageDimensionInvalid {
            path: path.to_path_buf(),
            message: format!("image height {} does not fit in u32", size.height),
        })?;

    Ok((width, height))
}

/// Copies an image byte for byte to `<images_dir>/<stem>.<extension>`.
pub fn copy_image(
    source: &Path,
    images_dir: &Path,
    stem: &str,
    extension: &str,
) -> Result<PathBuf, CityPersonsError> {
    let dest = images_dir.join(format!("{stem}.{extension}"));
    fs::copy(source, &dest).map_err(CityPersonsError::Io)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal 24-bit BMP header; imagesize only reads the header.
    fn bmp_header(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"BM");
        bytes.extend_from_slice(&54u32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        bytes.extend_from_slice(&54u32.to_le_bytes());
        bytes.extend_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&(width as i32).to_le_bytes());
        bytes.extend_from_slice(&(height as i32).to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&24u16.to_le_bytes());
        bytes.resize(54, 0);
        bytes
    }

    #[test]
    fn source_path_uses_city_prefix() {
        let image = ImageAnnotations::new("bochum_000000_000313_leftImg8bit.png", vec![]);
        assert_eq!(
            source_image_path(Path::new("root"), Split::Val, &image),
            Path::new("root/val/bochum/bochum_000000_000313_leftImg8bit.png")
        );
    }

    #[test]
    fn reads_dimensions_and_copies_bytes() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("a_leftImg8bit.png");
        fs::write(&src, bmp_header(64, 32)).expect("write image");

        assert_eq!(read_image_dimensions(&src).expect("probe"), (64, 32));

        let dest = copy_image(&src, temp.path(), "a_leftImg8bit", "jpg").expect("copy");
        assert_eq!(dest, temp.path().join("a_leftImg8bit.jpg"));
        assert_eq!(fs::read(&dest).unwrap(), fs::read(&src).unwrap());
    }

    #[test]
    fn missing_image_is_an_error() {
        let err = read_image_dimensions(Path::new("does/not/exist.png")).unwrap_err();
        assert!(matches!(err, CityPersonsError::ImageDimensionRead { .. }));
    }
}
