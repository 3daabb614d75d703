//! Cache key derivation.
//!
//! Every cache artifact is named after the source path it was derived from.
//! Paths are first made relative to the source root (so the cache is portable
//! between machines), then folded into a filesystem-safe identifier:
//!
//! ```text
//! Trip (2020)             →  trip_2020.json                  (album document)
//! Trip (2020)/Day #1.jpg  →  trip_2020-day_1.jpg_75s.jpg     (square thumbnail)
//!                            trip_2020-day_1.jpg_1024.jpg    (plain thumbnail)
//! ```
//!
//! The folding is lossy. Two different source paths can end up with the same
//! key; the walker reports such collisions but does not prevent them.

use std::path::{Component, Path, PathBuf};

/// Key used for the source root itself, and for any path that folds to nothing.
pub const ROOT_KEY: &str = "root";

/// Name of the flat photo index document.
pub const FLAT_INDEX_NAME: &str = "all_photos.json";

/// Characters dropped outright during key derivation.
const DROPPED: &[char] = &['(', ')', '&', ',', '#', '[', ']', '"', '\''];

/// Fold a relative path into a cache key.
///
/// - `/` becomes `-`, spaces become `_`
/// - a fixed set of punctuation is removed
/// - `_-_` (a spaced-out separator) becomes `-`
/// - everything is lowercased, then non-ASCII characters are dropped
/// - runs of `--` and `__` collapse to a single character
/// - an empty result becomes [`ROOT_KEY`]
///
/// Deterministic, but not idempotent: a key can contain `_-_` that a second
/// pass would fold again.
pub fn derive_key(relative: &str) -> String {
    let replaced: String = relative
        .chars()
        .filter(|c| !DROPPED.contains(c))
        .map(|c| match c {
            '/' => '-',
            ' ' => '_',
            other => other,
        })
        .collect();

    let folded: String = replaced
        .replace("_-_", "-")
        .to_lowercase()
        .chars()
        .filter(char::is_ascii)
        .collect();

    let mut key = String::with_capacity(folded.len());
    for c in folded.chars() {
        if (c == '-' || c == '_') && key.ends_with(c) {
            continue;
        }
        key.push(c);
    }

    if key.is_empty() {
        ROOT_KEY.to_string()
    } else {
        key
    }
}

/// Filename of the JSON document for the album at `relative`.
pub fn album_document_name(relative: &str) -> String {
    format!("{}.json", derive_key(relative))
}

/// Filename of a thumbnail artifact: `<key>_<size>.jpg`, or `<key>_<size>s.jpg`
/// for the square variant.
pub fn thumbnail_name(relative: &str, size: u32, square: bool) -> String {
    let suffix = if square { "s" } else { "" };
    format!("{}_{}{}.jpg", derive_key(relative), size, suffix)
}

/// Maps absolute source paths to the relative, `/`-separated form keys are
/// derived from.
#[derive(Debug, Clone)]
pub struct CacheKeys {
    source_root: PathBuf,
}

impl CacheKeys {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
        }
    }

    /// Path of `path` relative to the source root, `/`-separated.
    ///
    /// Returns `None` for paths outside the root or with non-UTF-8 components.
    /// The root itself maps to the empty string.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let rest = path.strip_prefix(&self.source_root).ok()?;
        let mut parts = Vec::new();
        for component in rest.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(parts.join("/"))
    }
}

/// Join a parent relative path and an entry name.
pub fn join_relative(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Path of `child` relative to `parent` (both relative to the source root).
///
/// Used for the shallow sub-album references stored in album documents.
pub fn relative_to(child: &str, parent: &str) -> String {
    let rest = child.strip_prefix(parent).unwrap_or(child);
    rest.trim_start_matches('/').to_string()
}
