//! Single-beer exchange files. Sharing a beer writes a small XML property
//! list (`.btkr`) carrying the name, rating, note and an inlined copy of the
//! photo; importing one appends the beer to the collection and removes the
//! file.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use plist::{Dictionary, Value};
use tracing::{info, warn};

use super::images::{encode_jpeg, ImageStore, EXPORT_JPEG_QUALITY};
use super::{write_atomic, CollectionStore, DataDirs};
use crate::error::{DecodeError, ExchangeError};
use crate::models::{keys, Beer};

/// Extension used for exported and importable beer files.
pub const EXCHANGE_EXTENSION: &str = "btkr";

/// File stem used when a beer's name cannot be used as one.
const FALLBACK_STEM: &str = "beer";

/// Tolerates missing padding; stray characters are stripped before decoding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

impl Beer {
    /// Write this beer to `<exports>/<name>.btkr` and return the path. The
    /// photo is re-encoded at full quality rather than copied from the
    /// reduced-quality stored file.
    pub fn export_to_file(
        &self,
        dirs: &DataDirs,
        images: &ImageStore,
    ) -> Result<PathBuf, ExchangeError> {
        let mut contents = Dictionary::new();
        contents.insert(keys::NAME.to_string(), Value::String(self.name.clone()));
        contents.insert(keys::RATING.to_string(), Value::Integer(self.rating.into()));

        if let Some(image) = self.load_image(images) {
            match encode_jpeg(&image, EXPORT_JPEG_QUALITY) {
                Ok(data) => {
                    contents.insert(keys::IMAGE.to_string(), Value::String(STANDARD.encode(data)));
                }
                Err(err) => warn!(beer = %self.name, error = %err, "exporting without photo"),
            }
        }

        if let Some(note) = &self.note {
            contents.insert(keys::NOTE.to_string(), Value::String(note.clone()));
        }

        let exports = dirs.exports_dir();
        fs::create_dir_all(&exports).map_err(|source| ExchangeError::DirectoryUnavailable {
            path: exports.clone(),
            source,
        })?;

        let mut buffer = Vec::new();
        Value::Dictionary(contents)
            .to_writer_xml(&mut buffer)
            .map_err(ExchangeError::Encode)?;

        let path = exports.join(format!("{}.{EXCHANGE_EXTENSION}", export_file_stem(&self.name)));
        write_atomic(&path, &buffer).map_err(|source| ExchangeError::Io {
            path: path.clone(),
            source,
        })?;
        info!(beer = %self.name, path = %path.display(), "exported beer");
        Ok(path)
    }
}

/// Import one exchange file: append the beer, save the store, then delete the
/// file. Returns the index of the new beer.
///
/// A file without a usable `name` or `rating` is rejected before anything
/// changes. An undecodable photo is skipped and the beer is imported without
/// it. If the store cannot be saved the beer and its stored photo are taken
/// back out and the file is left in place for another attempt.
pub fn import_from(
    path: &Path,
    store: &mut CollectionStore,
    images: &ImageStore,
) -> Result<usize, ExchangeError> {
    let bytes = fs::read(path).map_err(|source| ExchangeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let fields = parse_exchange(&bytes).map_err(|source| ExchangeError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let mut beer = Beer::new(fields.name, None, fields.note, fields.rating);

    if let Some(encoded) = fields.image {
        match decode_base64(&encoded) {
            Some(data) => {
                if let Err(err) = beer.save_image(images, &data) {
                    warn!(beer = %beer.name, error = %err, "imported photo could not be stored");
                }
            }
            None => warn!(beer = %beer.name, "imported photo is not valid base64"),
        }
    }

    let name = beer.name.clone();
    let index = store.append(beer);
    if let Err(err) = store.save() {
        let stored_photo = store.remove(index).and_then(|beer| beer.image_path);
        if let Some(file_name) = stored_photo {
            let photo = images.path_for(&file_name);
            if let Err(err) = fs::remove_file(&photo) {
                warn!(path = %photo.display(), error = %err, "failed to remove orphaned photo");
            }
        }
        return Err(err.into());
    }
    info!(beer = %name, source = %path.display(), "imported beer");

    if let Err(err) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %err, "failed to remove item from inbox");
    }

    Ok(index)
}

/// Outcome of sweeping the inbox directory.
#[derive(Debug, Default)]
pub struct InboxReport {
    /// Names of the beers that were added, in import order.
    pub imported: Vec<String>,
    pub failed: Vec<(PathBuf, ExchangeError)>,
}

impl InboxReport {
    pub fn is_empty(&self) -> bool {
        self.imported.is_empty() && self.failed.is_empty()
    }
}

/// Import every `.btkr` file waiting in the inbox, in file-name order. A bad
/// file is recorded in the report and does not stop the rest.
pub fn import_inbox(
    dirs: &DataDirs,
    store: &mut CollectionStore,
    images: &ImageStore,
) -> Result<InboxReport, ExchangeError> {
    let inbox = dirs.inbox_dir();
    let entries = match fs::read_dir(&inbox) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(InboxReport::default())
        }
        Err(source) => {
            return Err(ExchangeError::DirectoryUnavailable {
                path: inbox,
                source,
            })
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_exchange_file(path))
        .collect();
    files.sort();

    let mut report = InboxReport::default();
    for path in files {
        match import_from(&path, store, images) {
            Ok(index) => {
                if let Some(beer) = store.get(index) {
                    report.imported.push(beer.name.clone());
                }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping inbox file");
                report.failed.push((path, err));
            }
        }
    }
    Ok(report)
}

pub fn is_exchange_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(EXCHANGE_EXTENSION))
}

/// Beer names are free text; keep them from escaping the exports directory.
fn export_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();

    if stem.is_empty() || stem == "." || stem == ".." {
        FALLBACK_STEM.to_string()
    } else {
        stem
    }
}

struct ExchangeFields {
    name: String,
    rating: i64,
    note: Option<String>,
    image: Option<String>,
}

fn parse_exchange(bytes: &[u8]) -> Result<ExchangeFields, DecodeError> {
    let value = Value::from_reader(Cursor::new(bytes))?;
    let dict = value.into_dictionary().ok_or(DecodeError::NotADictionary)?;

    let name = dict
        .get(keys::NAME)
        .and_then(Value::as_string)
        .ok_or(DecodeError::MissingField(keys::NAME))?
        .to_string();
    let rating = dict
        .get(keys::RATING)
        .and_then(rating_value)
        .ok_or(DecodeError::MissingField(keys::RATING))?;
    let note = dict
        .get(keys::NOTE)
        .and_then(Value::as_string)
        .map(str::to_string);
    let image = dict
        .get(keys::IMAGE)
        .and_then(Value::as_string)
        .map(str::to_string);

    Ok(ExchangeFields {
        name,
        rating,
        note,
        image,
    })
}

/// Ratings are integers, but a real number is accepted and truncated.
fn rating_value(value: &Value) -> Option<i64> {
    value
        .as_signed_integer()
        .or_else(|| value.as_real().map(|real| real as i64))
}

fn decode_base64(encoded: &str) -> Option<Vec<u8>> {
    let cleaned: String = encoded
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '/' | '='))
        .collect();
    LENIENT_BASE64.decode(cleaned.trim_end_matches('=')).ok()
}
