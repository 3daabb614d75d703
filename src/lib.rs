//! # Photoscan
//!
//! An incremental indexer for a photo tree. Directories become albums, image
//! files become photos, and everything a viewer needs lands in one flat cache
//! directory: a JSON document per album, a flat `all_photos.json`, and JPEG
//! thumbnails at the configured sizes.
//!
//! # Architecture: Walk, Index, Reclaim
//!
//! ```text
//! 1. Walk     source/  →  Album tree      (documents + thumbnails written per album)
//! 2. Index    tree     →  all_photos.json
//! 3. Reclaim  tree     →  cache minus everything the tree does not account for
//! ```
//!
//! The cache is the only state. A second run over an unchanged tree decodes no
//! image and rewrites nothing but identical bytes; a run after an edit touches
//! only what the edit made stale. Staleness is decided by modification times:
//!
//! - a directory whose mtime is not newer than its document is taken from cache
//!   wholesale (**full cache**);
//! - a photo whose recorded `dateTimeFile` is not older than the file is reused
//!   from the document (**partial cache**);
//! - a thumbnail not older than its source is left alone.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`keys`] | Source path → flat cache key, document and thumbnail names |
//! | [`model`] | `Photo`, `Album`, dates, and the JSON document shapes |
//! | [`metadata`] | Raw EXIF tags → human-readable photo attributes |
//! | [`imaging`] | The `ImageCodec` seam and its `image`/`kamadak-exif` implementation |
//! | [`photo`] | One file → `Photo` plus fresh thumbnails |
//! | [`store`] | Atomic reads and writes of cache documents |
//! | [`walker`] | The recursive incremental directory walk |
//! | [`reclaim`] | Expected artifact set and stale file deletion |
//! | [`scan`] | One complete run: walk, index, reclaim |
//! | [`config`] | `.photoscan.toml` loading and validation |
//! | [`signal`] | Ctrl+C handling and the interrupted exit status |
//! | [`output`] | Progress events and their console format |
//! | [`logging`] | `env_logger` setup for diagnostics |
//!
//! # Design Decisions
//!
//! ## One Flat Cache Directory
//!
//! Every artifact is named by a key derived from its source-relative path, so
//! the cache needs no directory structure of its own and stale detection is a
//! set difference over one listing.
//!
//! ## Interrupts Never Lose Work
//!
//! Documents and thumbnails are written atomically as the walk goes. An
//! interrupt stops the walk and skips reclamation, so a partial run leaves a
//! valid cache that the next run completes.

pub mod config;
pub mod imaging;
pub mod keys;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod output;
pub mod photo;
pub mod reclaim;
pub mod scan;
pub mod signal;
pub mod store;
pub mod walker;

#[cfg(test)]
pub(crate) mod test_helpers;
