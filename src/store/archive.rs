use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::write_atomic;
use crate::error::{DecodeError, EncodeError, StoreError};
use crate::models::Beer;

#[derive(Serialize)]
struct ArchiveRef<'a> {
    beers: &'a [Beer],
}

#[derive(Deserialize)]
struct ArchiveFile {
    beers: Vec<Beer>,
}

/// Encode the whole collection into the archive format.
pub fn encode_archive(beers: &[Beer]) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec_pretty(&ArchiveRef { beers })?)
}

/// Decode an archive. A single bad entry fails the whole archive.
pub fn decode_archive(bytes: &[u8]) -> Result<Vec<Beer>, DecodeError> {
    let file: ArchiveFile = serde_json::from_slice(bytes)?;
    Ok(file.beers)
}

/// Ordered collection of beers backed by one archive file. Mutations only
/// touch memory; call [`CollectionStore::save`] to persist them.
#[derive(Debug)]
pub struct CollectionStore {
    beers: Vec<Beer>,
    archive_path: PathBuf,
}

impl CollectionStore {
    pub fn empty(archive_path: impl Into<PathBuf>) -> Self {
        Self {
            beers: Vec::new(),
            archive_path: archive_path.into(),
        }
    }

    /// Load the archive, starting empty when it is missing or unreadable.
    pub fn load(archive_path: impl Into<PathBuf>) -> Self {
        let archive_path = archive_path.into();
        match Self::try_load(&archive_path) {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "starting with an empty beer list");
                Self::empty(archive_path)
            }
        }
    }

    /// Like [`CollectionStore::load`] but reports why the archive was rejected.
    /// A missing archive is not an error.
    pub fn try_load(archive_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let archive_path = archive_path.into();
        let bytes = match fs::read(&archive_path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %archive_path.display(), "no archive yet");
                return Ok(Self::empty(archive_path));
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: archive_path,
                    source,
                })
            }
        };

        let beers = match decode_archive(&bytes) {
            Ok(beers) => beers,
            Err(source) => {
                return Err(StoreError::Decode {
                    path: archive_path,
                    source,
                })
            }
        };
        info!(count = beers.len(), path = %archive_path.display(), "loaded beers");
        Ok(Self {
            beers,
            archive_path,
        })
    }

    /// Rewrite the whole archive.
    pub fn save(&self) -> Result<(), StoreError> {
        let bytes = encode_archive(&self.beers)?;
        write_atomic(&self.archive_path, &bytes).map_err(|source| StoreError::Io {
            path: self.archive_path.clone(),
            source,
        })?;
        info!(count = self.beers.len(), "saved beers");
        Ok(())
    }

    pub fn beers(&self) -> &[Beer] {
        &self.beers
    }

    pub fn get(&self, index: usize) -> Option<&Beer> {
        self.beers.get(index)
    }

    pub fn len(&self) -> usize {
        self.beers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beers.is_empty()
    }

    /// Add a beer at the end and return its index.
    pub fn append(&mut self, beer: Beer) -> usize {
        self.beers.push(beer);
        self.beers.len() - 1
    }

    /// Drop the beer at `index`. Its photo file is left on disk.
    pub fn remove(&mut self, index: usize) -> Option<Beer> {
        (index < self.beers.len()).then(|| self.beers.remove(index))
    }

    /// Swap in an edited beer, returning the previous value.
    pub fn replace(&mut self, index: usize, beer: Beer) -> Option<Beer> {
        self.beers
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, beer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> Beer {
        Beer::new(name, None, None, 3)
    }

    fn names(store: &CollectionStore) -> Vec<&str> {
        store.beers().iter().map(|beer| beer.name.as_str()).collect()
    }

    #[test]
    fn missing_archive_loads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let store = CollectionStore::try_load(temp.path().join("beers.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn remove_save_reload_keeps_remaining_order() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("beers.json");

        let mut store = CollectionStore::empty(&path);
        for name in ["A", "B", "C"] {
            store.append(named(name));
        }
        store.save().unwrap();

        assert_eq!(store.remove(1).map(|beer| beer.name), Some("B".to_string()));
        store.save().unwrap();

        let reloaded = CollectionStore::load(&path);
        assert_eq!(names(&reloaded), ["A", "C"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("beers.json");

        let mut store = CollectionStore::empty(&path);
        store.append(named("Same"));
        store.append(named("Same"));
        store.save().unwrap();

        assert_eq!(CollectionStore::load(&path).len(), 2);
    }

    #[test]
    fn entry_without_rating_empties_the_store() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("beers.json");
        fs::write(
            &path,
            br#"{"beers":[{"name":"Good","rating":4},{"name":"Bad"}]}"#,
        )
        .unwrap();

        assert!(CollectionStore::load(&path).is_empty());
        assert!(matches!(
            CollectionStore::try_load(&path),
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn mistyped_note_keeps_the_archive() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("beers.json");
        fs::write(
            &path,
            br#"{"beers":[{"name":"Good","rating":4,"note":5},{"name":"Fine","rating":2,"image":{}}]}"#,
        )
        .unwrap();

        let store = CollectionStore::try_load(&path).unwrap();
        assert_eq!(names(&store), ["Good", "Fine"]);
        assert_eq!(store.get(0).unwrap().note, None);
        assert_eq!(store.get(1).unwrap().image_path, None);
    }

    #[test]
    fn garbage_archive_loads_empty() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("beers.json");
        fs::write(&path, b"\x00\x01 not json").unwrap();

        assert!(CollectionStore::load(&path).is_empty());
    }

    #[test]
    fn out_of_range_edits_are_ignored() {
        let mut store = CollectionStore::empty("unused.json");
        store.append(named("Only"));

        assert!(store.remove(4).is_none());
        assert!(store.replace(4, named("Other")).is_none());
        assert_eq!(names(&store), ["Only"]);

        let previous = store.replace(0, named("Edited")).unwrap();
        assert_eq!(previous.name, "Only");
        assert_eq!(names(&store), ["Edited"]);
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let temp = tempfile::tempdir().unwrap();
        let store = CollectionStore::empty(temp.path().join("missing").join("beers.json"));
        assert!(matches!(store.save(), Err(StoreError::Io { .. })));
    }
}
