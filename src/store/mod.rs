//! Persistence split across logical submodules: the collection archive, the
//! private image directory, single-beer exchange files, and the directory
//! layout tying them together.

mod archive;
pub mod exchange;
mod images;
mod paths;

use std::fs;
use std::io;
use std::path::Path;

pub use archive::{decode_archive, encode_archive, CollectionStore};
pub use exchange::{import_from, import_inbox, InboxReport, EXCHANGE_EXTENSION};
pub use images::{encode_jpeg, ImageStore, EXPORT_JPEG_QUALITY, STORED_JPEG_QUALITY};
pub use paths::{DataDirs, HOME_ENV_VAR};

/// Write `bytes` next to `path` first and rename over it, so readers never see
/// a half-written file.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}
