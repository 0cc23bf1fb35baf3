use std::fs;
use std::path::PathBuf;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use tracing::debug;
use uuid::Uuid;

use super::write_atomic;
use crate::error::ImageError;

/// JPEG quality for photos kept in the image directory.
pub const STORED_JPEG_QUALITY: u8 = 50;
/// JPEG quality for photos inlined into exchange files.
pub const EXPORT_JPEG_QUALITY: u8 = 100;

/// The private directory holding one JPEG per beer photo. Beers only keep the
/// generated file name; this type turns it back into bytes.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Decode arbitrary image bytes, re-encode them as a reduced-quality JPEG
    /// and write them under a fresh `<uuid>.jpg` name. Returns that name.
    pub fn store(&self, bytes: &[u8]) -> Result<String, ImageError> {
        let image = image::load_from_memory(bytes)?;
        let encoded = encode_jpeg(&image, STORED_JPEG_QUALITY)?;

        let file_name = format!("{}.jpg", Uuid::new_v4());
        let path = self.path_for(&file_name);
        write_atomic(&path, &encoded).map_err(|source| ImageError::Io { path, source })?;
        debug!(file_name = %file_name, "stored beer photo");
        Ok(file_name)
    }

    pub fn load(&self, file_name: &str) -> Result<DynamicImage, ImageError> {
        let path = self.path_for(file_name);
        let bytes = fs::read(&path).map_err(|source| ImageError::Io { path, source })?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

/// Encode `image` as JPEG. Alpha is dropped since JPEG cannot carry it.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut encoded = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut encoded, quality);
    image.to_rgb8().write_with_encoder(encoder)?;
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};

    use super::*;

    fn png_bytes() -> Vec<u8> {
        let image = RgbImage::from_pixel(8, 8, Rgb([200, 140, 30]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn stores_photo_as_jpeg() {
        let temp = tempfile::tempdir().unwrap();
        let images = ImageStore::new(temp.path());

        let file_name = images.store(&png_bytes()).unwrap();
        assert!(file_name.ends_with(".jpg"));

        let stored = fs::read(images.path_for(&file_name)).unwrap();
        assert_eq!(image::guess_format(&stored).unwrap(), ImageFormat::Jpeg);

        let loaded = images.load(&file_name).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (8, 8));
    }

    #[test]
    fn every_photo_gets_its_own_name() {
        let temp = tempfile::tempdir().unwrap();
        let images = ImageStore::new(temp.path());

        let first = images.store(&png_bytes()).unwrap();
        let second = images.store(&png_bytes()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        let temp = tempfile::tempdir().unwrap();
        let images = ImageStore::new(temp.path());

        let err = images.store(b"definitely not a jpeg").unwrap_err();
        assert!(matches!(err, ImageError::Codec(_)));
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let images = ImageStore::new(temp.path());

        assert!(matches!(
            images.load("nope.jpg"),
            Err(ImageError::Io { .. })
        ));
    }

    #[test]
    fn export_quality_produces_larger_files() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(32, 32, |x, y| {
            Rgb([(x * 8) as u8, (y * 8) as u8, ((x ^ y) * 8) as u8])
        }));

        let stored = encode_jpeg(&image, STORED_JPEG_QUALITY).unwrap();
        let exported = encode_jpeg(&image, EXPORT_JPEG_QUALITY).unwrap();
        assert!(exported.len() > stored.len());
    }
}
