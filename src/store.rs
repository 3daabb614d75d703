//! Cache document storage.
//!
//! The cache directory is flat. It holds one JSON document per non-empty
//! album, one flat index of every photo path, and the thumbnails:
//!
//! ```text
//! cache/
//! ├── root.json                  # album document for the source root
//! ├── 2020.json
//! ├── 2020-june.json
//! ├── all_photos.json            # ["2020/June/a.jpg", ...]
//! ├── 2020-june-a.jpg_75s.jpg
//! └── 2020-june-a.jpg_1024.jpg
//! ```
//!
//! Every write goes to a temp file in the cache directory first and is then
//! renamed over the target, so a crash or interrupt never leaves a truncated
//! document behind.
//!
//! ## Loading
//!
//! A missing document and a broken one are different outcomes
//! ([`AlbumLookup`]): a broken document is logged and the album is rebuilt from
//! scratch, exactly as if it had never been cached. A document that parses but
//! describes a different path (two paths folding to the same key) counts as
//! broken.

use crate::keys::{self, FLAT_INDEX_NAME};
use crate::model::{Album, AlbumDocument, file_mtime};
use chrono::NaiveDateTime;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of looking up an album's cached document.
#[derive(Debug)]
pub enum AlbumLookup {
    /// No document on disk.
    Missing,
    /// A document exists but cannot be used; the reason is for diagnostics.
    Corrupt(String),
    /// The cached album (photos only) and the document's modification time.
    Loaded {
        album: Album,
        modified: NaiveDateTime,
    },
}

/// Reads and writes documents in one cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache path of the album document for `relative`.
    pub fn document_path(&self, relative: &str) -> PathBuf {
        self.cache_dir.join(keys::album_document_name(relative))
    }

    /// Cache path of an arbitrary artifact name.
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(name)
    }

    /// Load the cached album for the directory at `relative`.
    pub fn load_album(&self, relative: &str) -> AlbumLookup {
        let path = self.document_path(relative);
        let modified = match file_mtime(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return AlbumLookup::Missing,
            Err(e) => return AlbumLookup::Corrupt(e.to_string()),
        };
        let bytes = match std::fs::read(&path) {
            Ok(b) => b,
            Err(e) => return AlbumLookup::Corrupt(e.to_string()),
        };
        let document: AlbumDocument = match serde_json::from_slice(&bytes) {
            Ok(d) => d,
            Err(e) => return AlbumLookup::Corrupt(e.to_string()),
        };
        if document.path != relative {
            return AlbumLookup::Corrupt(format!(
                "document describes {:?}, expected {:?}",
                document.path, relative
            ));
        }
        match Album::from_document(document) {
            Ok(album) => AlbumLookup::Loaded { album, modified },
            Err(e) => AlbumLookup::Corrupt(e.to_string()),
        }
    }

    /// Persist an album's document, replacing any previous one.
    pub fn save_album(&self, album: &Album) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&album.to_document())?;
        self.write_atomic(&album.document_name(), &bytes)
    }

    /// Remove the album's document so the next walk recomputes the directory.
    /// A document that is already gone is not an error.
    pub fn discard_album(&self, relative: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.document_path(relative)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// Persist the flat index of every photo path.
    pub fn save_flat_index(&self, paths: &[String]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(paths)?;
        self.write_atomic(FLAT_INDEX_NAME, &bytes)
    }

    /// Read the flat index back, if present and well-formed.
    pub fn load_flat_index(&self) -> Option<Vec<String>> {
        let bytes = std::fs::read(self.artifact_path(FLAT_INDEX_NAME)).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.cache_dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(self.artifact_path(name))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Photo, PhotoAttributes};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn album(path: &str, names: &[&str]) -> Album {
        let when = NaiveDate::from_ymd_opt(2021, 4, 5)
            .unwrap()
            .and_hms_opt(6, 7, 8)
            .unwrap();
        let mut album = Album::new(path);
        for name in names {
            let rel = keys::join_relative(path, name);
            album.add_photo(Photo::new(rel, PhotoAttributes::with_file_time(when)));
        }
        album
    }

    #[test]
    fn missing_document() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        assert!(matches!(store.load_album("trip"), AlbumLookup::Missing));
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        let original = album("Trip 2020", &["b.jpg", "a.jpg"]);
        store.save_album(&original).unwrap();

        assert!(tmp.path().join("trip_2020.json").exists());
        match store.load_album("Trip 2020") {
            AlbumLookup::Loaded { album, .. } => assert_eq!(album, original),
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn discard_removes_document_and_tolerates_absence() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        store.save_album(&album("trip", &["a.jpg"])).unwrap();

        store.discard_album("trip").unwrap();
        assert!(matches!(store.load_album("trip"), AlbumLookup::Missing));
        store.discard_album("trip").unwrap();
    }

    #[test]
    fn root_album_uses_root_key() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        store.save_album(&album("", &["a.jpg"])).unwrap();
        assert!(tmp.path().join("root.json").exists());
        assert!(matches!(store.load_album(""), AlbumLookup::Loaded { .. }));
    }

    #[test]
    fn load_reports_document_mtime() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        store.save_album(&album("trip", &["a.jpg"])).unwrap();

        let expected = file_mtime(&store.document_path("trip")).unwrap();
        match store.load_album("trip") {
            AlbumLookup::Loaded { modified, .. } => assert_eq!(modified, expected),
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        std::fs::write(store.document_path("trip"), "{not json").unwrap();
        assert!(matches!(store.load_album("trip"), AlbumLookup::Corrupt(_)));
    }

    #[test]
    fn wrong_shape_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        std::fs::write(store.document_path("trip"), r#"{"path":"trip"}"#).unwrap();
        assert!(matches!(store.load_album("trip"), AlbumLookup::Corrupt(_)));
    }

    #[test]
    fn document_for_other_path_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        // "Trip (2020)" and "Trip 2020" fold to the same key.
        store.save_album(&album("Trip (2020)", &["a.jpg"])).unwrap();
        assert!(matches!(
            store.load_album("Trip 2020"),
            AlbumLookup::Corrupt(_)
        ));
    }

    #[test]
    fn save_replaces_without_leftovers() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        store.save_album(&album("trip", &["a.jpg"])).unwrap();
        store.save_album(&album("trip", &["a.jpg", "b.jpg"])).unwrap();

        let names: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("trip.json")]);
        match store.load_album("trip") {
            AlbumLookup::Loaded { album, .. } => assert_eq!(album.photos().len(), 2),
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path().join("gone"));
        assert!(store.save_album(&album("trip", &["a.jpg"])).is_err());
    }

    #[test]
    fn flat_index_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = CacheStore::new(tmp.path());
        assert_eq!(store.load_flat_index(), None);

        let paths = vec!["a/b.jpg".to_string(), "c.jpg".to_string()];
        store.save_flat_index(&paths).unwrap();
        assert_eq!(store.load_flat_index(), Some(paths));
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(FLAT_INDEX_NAME)).unwrap(),
            r#"["a/b.jpg","c.jpg"]"#
        );
    }
}
