//! Stale artifact reclamation.
//!
//! After a complete walk, every file in the cache directory that the final
//! album tree does not account for is deleted: documents of albums that were
//! removed or became empty, thumbnails of deleted photos, thumbnails of sizes
//! no longer configured, leftover temp files from an interrupted write.
//!
//! Only regular files and symlinks directly in the cache directory are
//! considered; sub-directories are never touched. Reclamation must only run
//! after an uninterrupted walk, or live artifacts of unvisited albums would be
//! deleted.

use crate::config::ThumbnailSpec;
use crate::keys::FLAT_INDEX_NAME;
use crate::model::Album;
use crate::output::{EventKind, EventSink};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

/// Every cache file name the tree rooted at `root` accounts for.
///
/// The flat index is always expected, even for an empty tree.
pub fn expected_names(root: Option<&Album>, specs: &[ThumbnailSpec]) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    names.insert(FLAT_INDEX_NAME.to_string());
    if let Some(root) = root {
        for album in root.all_albums() {
            names.insert(album.document_name());
            for photo in album.photos() {
                names.extend(photo.thumbnail_names(specs));
            }
        }
    }
    names
}

/// Delete every plain file in `cache_dir` not named in `expected`.
///
/// Returns the names that were deleted. A file that cannot be deleted is
/// logged and left in place; only an unlistable cache directory is an error.
pub fn reclaim(
    cache_dir: &Path,
    expected: &BTreeSet<String>,
    events: &EventSink,
) -> io::Result<Vec<String>> {
    events.emit(0, EventKind::Cleanup, "searching for stale cache entries");
    let mut stale = Vec::new();
    for entry in fs::read_dir(cache_dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let is_expected = name.to_str().is_some_and(|n| expected.contains(n));
        if !is_expected {
            stale.push((name.to_string_lossy().into_owned(), entry.path()));
        }
    }
    stale.sort();

    let mut deleted = Vec::with_capacity(stale.len());
    for (name, path) in stale {
        events.emit(1, EventKind::Cleanup, &name);
        match fs::remove_file(&path) {
            Ok(()) => deleted.push(name),
            Err(e) => log::warn!("{}: cannot delete stale artifact: {e}", path.display()),
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Photo, PhotoAttributes, epoch};
    use crate::test_helpers::cache_names;
    use tempfile::TempDir;

    const SPECS: &[ThumbnailSpec] = &[ThumbnailSpec::new(75, true), ThumbnailSpec::new(640, false)];

    fn tree() -> Album {
        let mut sub = Album::new("trip");
        sub.add_photo(Photo::new(
            "trip/a.jpg",
            PhotoAttributes::with_file_time(epoch()),
        ));
        let mut root = Album::new("");
        root.add_album(sub);
        root
    }

    #[test]
    fn expected_set_covers_documents_thumbnails_and_index() {
        let names = expected_names(Some(&tree()), SPECS);
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "all_photos.json",
                "root.json",
                "trip-a.jpg_640.jpg",
                "trip-a.jpg_75s.jpg",
                "trip.json"
            ]
        );
    }

    #[test]
    fn empty_tree_expects_only_the_index() {
        let names = expected_names(None, SPECS);
        assert_eq!(names.len(), 1);
        assert!(names.contains(FLAT_INDEX_NAME));
    }

    #[test]
    fn deletes_only_unexpected_files() {
        let tmp = TempDir::new().unwrap();
        for name in ["root.json", "trip.json", "old.json", "gone.jpg_75s.jpg", ".tmpXYZ"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }
        let expected = expected_names(Some(&tree()), SPECS);

        let mut deleted = reclaim(tmp.path(), &expected, &EventSink::none()).unwrap();
        deleted.sort();

        assert_eq!(deleted, vec![".tmpXYZ", "gone.jpg_75s.jpg", "old.json"]);
        assert_eq!(cache_names(tmp.path()), vec!["root.json", "trip.json"]);
    }

    #[test]
    fn subdirectories_are_left_alone() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("keep")).unwrap();
        fs::write(tmp.path().join("keep/file.jpg"), b"x").unwrap();

        let deleted = reclaim(tmp.path(), &BTreeSet::new(), &EventSink::none()).unwrap();

        assert!(deleted.is_empty());
        assert!(tmp.path().join("keep/file.jpg").exists());
    }

    #[test]
    fn missing_cache_dir_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let result = reclaim(&tmp.path().join("nope"), &BTreeSet::new(), &EventSink::none());
        assert!(result.is_err());
    }
}
