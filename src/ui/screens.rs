use crate::models::Beer;
use crate::store::ImageStore;

/// What the detail view knows about a beer's photo. Decoding happens once when
/// the screen opens instead of on every frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PhotoStatus {
    None,
    Missing,
    Available { width: u32, height: u32 },
}

impl PhotoStatus {
    pub(crate) fn inspect(beer: &Beer, images: &ImageStore) -> Self {
        if beer.image_path.is_none() {
            return PhotoStatus::None;
        }
        match beer.load_image(images) {
            Some(image) => PhotoStatus::Available {
                width: image.width(),
                height: image.height(),
            },
            None => PhotoStatus::Missing,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            PhotoStatus::None => "none (press 'e' to attach one)".to_string(),
            PhotoStatus::Missing => "missing from the image folder".to_string(),
            PhotoStatus::Available { width, height } => {
                format!("{width}x{height} (press 'o' to open)")
            }
        }
    }
}

/// Detail view for one beer, addressed by its index in the store.
pub(crate) struct DetailScreen {
    pub(crate) index: usize,
    pub(crate) photo: PhotoStatus,
}

impl DetailScreen {
    pub(crate) fn open(index: usize, beer: &Beer, images: &ImageStore) -> Self {
        Self {
            index,
            photo: PhotoStatus::inspect(beer, images),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    use super::*;

    #[test]
    fn photo_status_reflects_image_directory() {
        let temp = tempfile::tempdir().unwrap();
        let images = ImageStore::new(temp.path());

        let mut beer = Beer::new("Dubbel", None, None, 4);
        assert_eq!(PhotoStatus::inspect(&beer, &images), PhotoStatus::None);

        beer.image_path = Some("missing.jpg".to_string());
        assert_eq!(PhotoStatus::inspect(&beer, &images), PhotoStatus::Missing);

        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])))
            .write_to(&mut png, ImageFormat::Png)
            .unwrap();
        beer.save_image(&images, png.get_ref()).unwrap();
        assert_eq!(
            PhotoStatus::inspect(&beer, &images),
            PhotoStatus::Available {
                width: 3,
                height: 2
            }
        );
    }
}
