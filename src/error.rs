//! Typed errors for the persistence layer. The UI and CLI wrap these in
//! `anyhow` the same way they wrap everything else, but library callers get
//! something they can match on when they need to tell a corrupt archive apart
//! from a missing directory.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Serializing a beer (or the whole archive) failed.
#[derive(Debug, Error)]
#[error("failed to encode beer data")]
pub struct EncodeError(#[from] serde_json::Error);

/// Stored or shared beer data could not be turned back into a [`crate::Beer`].
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed beer data")]
    Malformed(#[from] serde_json::Error),
    #[error("unreadable exchange file")]
    Plist(#[from] plist::Error),
    #[error("exchange file does not contain a dictionary")]
    NotADictionary,
    #[error("missing or invalid `{0}` field")]
    MissingField(&'static str),
}

/// Reading, decoding, or writing a beer photo failed.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("failed to access image file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to process image data")]
    Codec(#[from] image::ImageError),
}

/// Failures while loading or saving the collection archive.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("data directory unavailable: {0}")]
    DirectoryUnavailable(String),
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("archive {} is corrupt", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Failures while exporting or importing a single beer.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("directory {} is unavailable", path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write exchange file")]
    Encode(#[source] plist::Error),
    #[error("{} is not a valid beer file", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}
