//! One complete scan: walk, index, reclaim.
//!
//! ```text
//! source root ──walk──▶ Album tree ──▶ album documents (written per album)
//!                                   ├─▶ all_photos.json
//!                                   └─▶ expected set ──▶ delete everything else
//! ```
//!
//! The phases run strictly in that order. An interrupt during the walk aborts
//! the scan before the flat index is rewritten and before anything is
//! reclaimed: the documents and thumbnails written so far stay valid and the
//! next scan picks up where this one stopped.

use crate::config::{ConfigError, ScanConfig};
use crate::imaging::{ImageCodec, RustCodec};
use crate::keys::CacheKeys;
use crate::model::Album;
use crate::output::{EventKind, EventSink};
use crate::reclaim;
use crate::signal::ShutdownHandler;
use crate::store::CacheStore;
use crate::walker::{TreeWalker, WalkStats};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("scan interrupted")]
    Interrupted,
    #[error("cannot read source directory {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot use cache directory {path}: {source}")]
    CacheUnusable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// What a completed scan produced.
#[derive(Debug)]
pub struct ScanReport {
    /// The indexed tree; `None` when the source holds no photos.
    pub root: Option<Album>,
    pub stats: WalkStats,
    /// Cache file names deleted as stale.
    pub reclaimed: Vec<String>,
}

impl ScanReport {
    pub fn album_count(&self) -> usize {
        self.root.as_ref().map_or(0, |r| r.all_albums().len())
    }

    pub fn photo_count(&self) -> usize {
        self.root.as_ref().map_or(0, |r| r.all_photos().len())
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Indexed {} photos in {} albums; {}; {} stale artifacts removed",
            self.photo_count(),
            self.album_count(),
            self.stats,
            self.reclaimed.len()
        )
    }
}

/// Scan `source_root` into `cache_root` with the production codec.
pub fn scan(
    source_root: &Path,
    cache_root: &Path,
    config: &ScanConfig,
    shutdown: &ShutdownHandler,
    events: EventSink,
) -> Result<ScanReport, ScanError> {
    scan_with_codec(
        &RustCodec::new(),
        source_root,
        cache_root,
        config,
        shutdown,
        events,
    )
}

/// Scan with an explicit codec.
///
/// The cache directory is created if missing. Both roots are canonicalized so
/// relative paths, keys and the cache-inside-source check are stable.
pub fn scan_with_codec(
    codec: &impl ImageCodec,
    source_root: &Path,
    cache_root: &Path,
    config: &ScanConfig,
    shutdown: &ShutdownHandler,
    events: EventSink,
) -> Result<ScanReport, ScanError> {
    config.validate()?;

    let source_root = source_root
        .canonicalize()
        .and_then(|root| std::fs::read_dir(&root).map(|_| root))
        .map_err(|source| ScanError::SourceUnreadable {
            path: source_root.to_path_buf(),
            source,
        })?;
    let cache_unusable = |source| ScanError::CacheUnusable {
        path: cache_root.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(cache_root).map_err(cache_unusable)?;
    let cache_root = cache_root.canonicalize().map_err(cache_unusable)?;

    log::debug!(
        "scanning {} into {}",
        source_root.display(),
        cache_root.display()
    );
    let keys = CacheKeys::new(&source_root);
    let store = CacheStore::new(&cache_root);

    let mut walker = TreeWalker::new(codec, &keys, &store, config, shutdown, events.clone());
    let root = walker.walk(&source_root, 0)?;
    let stats = walker.into_stats();

    let paths = root.as_ref().map(Album::photo_paths).unwrap_or_default();
    events.emit(0, EventKind::Caching, "all photos path list");
    if let Err(e) = store.save_flat_index(&paths) {
        events.emit(0, EventKind::SaveFailure, crate::keys::FLAT_INDEX_NAME);
        log::warn!("cannot write flat index: {e}");
    }

    if shutdown.is_shutdown_requested() {
        return Err(ScanError::Interrupted);
    }

    events.emit(0, EventKind::Cleanup, "building stale list");
    let expected = reclaim::expected_names(root.as_ref(), &config.thumbnails);
    let reclaimed = match reclaim::reclaim(&cache_root, &expected, &events) {
        Ok(deleted) => deleted,
        Err(e) => {
            log::warn!("cannot list cache directory for cleanup: {e}");
            Vec::new()
        }
    };

    events.emit(0, EventKind::Complete, "");
    Ok(ScanReport {
        root,
        stats,
        reclaimed,
    })
}
