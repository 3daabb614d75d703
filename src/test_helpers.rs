//! Shared test utilities for building source trees and inspecting caches.
//!
//! Source files get pinned mtimes so cache freshness is deterministic: the
//! walker compares whole-second local timestamps, and a file written "now"
//! would race with a document written in the same second.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! write_photo(&source, "2020/beach.jpg", 1_600_000_000);
//! settle_dirs(&source, 1_600_000_000);
//! let before = read_cache(&cache);
//! ```

use filetime::FileTime;
use std::collections::BTreeMap;
use std::path::Path;

// =========================================================================
// Source tree setup
// =========================================================================

/// Set a path's mtime to `secs` since the Unix epoch.
pub fn set_mtime(path: &Path, secs: i64) {
    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

/// Seconds since the Unix epoch, now.
pub fn now_secs() -> i64 {
    FileTime::now().unix_seconds()
}

/// Write a file at `root/relative` (creating parents) with a pinned mtime.
pub fn write_file(root: &Path, relative: &str, content: &[u8], mtime: i64) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    set_mtime(&path, mtime);
}

/// Write a file the mock codec decodes successfully.
pub fn write_photo(root: &Path, relative: &str, mtime: i64) {
    write_file(root, relative, b"pixels", mtime);
}

/// Pin the mtime of `root` and every directory below it.
///
/// Call after the tree is built, so the first scan's documents are newer than
/// every directory and the second scan sees a full cache.
pub fn settle_dirs(root: &Path, mtime: i64) {
    for entry in std::fs::read_dir(root).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            settle_dirs(&path, mtime);
        }
    }
    set_mtime(root, mtime);
}

// =========================================================================
// Cache inspection
// =========================================================================

/// Every file in the cache directory, by name, with its content.
pub fn read_cache(cache: &Path) -> BTreeMap<String, Vec<u8>> {
    std::fs::read_dir(cache)
        .unwrap()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().unwrap().is_file())
        .map(|e| {
            (
                e.file_name().to_string_lossy().into_owned(),
                std::fs::read(e.path()).unwrap(),
            )
        })
        .collect()
}

/// Names of every file in the cache directory.
pub fn cache_names(cache: &Path) -> Vec<String> {
    read_cache(cache).into_keys().collect()
}
