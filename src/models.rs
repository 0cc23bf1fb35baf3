//! The beer record passed between the store, the exchange files and the TUI.
//! It stays a plain data holder: the image bytes live in the
//! [`ImageStore`](crate::store::ImageStore) and the record only remembers the
//! generated file name.

use std::fmt;
use std::path::PathBuf;

use image::DynamicImage;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::{DecodeError, EncodeError, ImageError};
use crate::store::ImageStore;

/// Lowest and highest rating the UI lets you pick.
pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// Field names shared by the archive and the exchange file.
pub(crate) mod keys {
    pub const NAME: &str = "name";
    pub const RATING: &str = "rating";
    pub const IMAGE: &str = "image";
    pub const NOTE: &str = "note";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One tracked beer.
pub struct Beer {
    /// Display name. Only the form and CLI insist that it is non-empty.
    pub name: String,
    /// Star rating, normally 1 through 5. The model itself does not enforce it.
    pub rating: i64,
    /// File name of the photo inside the image directory.
    #[serde(rename = "image", default, deserialize_with = "lenient_string")]
    pub image_path: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub note: Option<String>,
}

/// Optional text fields read as `None` when they hold anything but a string.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Field {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Field::deserialize(deserializer)? {
        Field::Text(text) => Some(text),
        Field::Other(_) => None,
    })
}

impl Default for Beer {
    fn default() -> Self {
        Self {
            name: String::new(),
            rating: MIN_RATING,
            image_path: None,
            note: None,
        }
    }
}

impl fmt::Display for Beer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Beer {
    pub fn new(
        name: impl Into<String>,
        image_path: Option<String>,
        note: Option<String>,
        rating: i64,
    ) -> Self {
        Self {
            name: name.into(),
            rating,
            image_path,
            note,
        }
    }

    /// Five star slots, filled up to the rating.
    pub fn stars(&self) -> String {
        let filled = self.rating.clamp(0, MAX_RATING) as usize;
        let mut stars = "★".repeat(filled);
        stars.push_str(&"☆".repeat(MAX_RATING as usize - filled));
        stars
    }

    /// Store `bytes` as this beer's photo. `image_path` only changes once the
    /// new file is safely on disk; on error the previous value is kept.
    pub fn save_image(&mut self, images: &ImageStore, bytes: &[u8]) -> Result<(), ImageError> {
        let file_name = images.store(bytes)?;
        self.image_path = Some(file_name);
        Ok(())
    }

    /// Load the photo, or `None` when there is no photo or it cannot be read.
    pub fn load_image(&self, images: &ImageStore) -> Option<DynamicImage> {
        let file_name = self.image_path.as_deref()?;
        match images.load(file_name) {
            Ok(image) => Some(image),
            Err(err) => {
                debug!(beer = %self.name, file_name, error = %err, "beer photo unavailable");
                None
            }
        }
    }

    /// Absolute path of the photo when the referenced file still exists.
    pub fn image_file(&self, images: &ImageStore) -> Option<PathBuf> {
        let path = images.path_for(self.image_path.as_deref()?);
        path.is_file().then_some(path)
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// `name` and `rating` must be present with the right types. `image` and
    /// `note` may be missing, null or of another type; all of those read as `None`.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Pull a user-entered rating into the supported range.
pub fn clamp_rating(rating: i64) -> i64 {
    rating.clamp(MIN_RATING, MAX_RATING)
}
