//! Incremental directory walk.
//!
//! [`TreeWalker::walk`] turns one source directory into an [`Album`], reusing
//! cache documents wherever the source has not moved on:
//!
//! 1. **Listing.** Hidden entries and non-UTF-8 names are skipped. An
//!    unlistable directory is reported and treated as absent.
//! 2. **Full cache.** When the directory's mtime is not newer than its album
//!    document, the cached photo list is taken as is and no file in the
//!    directory is looked at.
//! 3. **Partial cache.** Otherwise every file is resolved, in parallel: a
//!    cached photo is reused when its recorded `dateTimeFile` is not older than
//!    the file's mtime, and everything else is extracted anew.
//! 4. **Sub-directories** are always walked, since a directory's mtime does not
//!    change when something deep inside it does.
//! 5. **Persist.** A non-empty album's document is rewritten; an empty one is
//!    dropped and its parent never mentions it. If any thumbnail of the
//!    directory failed to write, the document is removed instead, so the next
//!    walk retries the missing thumbnails.
//!
//! The walk checks the shutdown flag before every directory and every file and
//! returns [`ScanError::Interrupted`] as soon as it is set.

use crate::config::ScanConfig;
use crate::imaging::ImageCodec;
use crate::keys::{self, CacheKeys};
use crate::model::{Album, Photo, file_mtime};
use crate::output::{EventKind, EventSink};
use crate::photo::{self, ThumbnailOutcome, ThumbnailTarget};
use crate::scan::ScanError;
use crate::signal::ShutdownHandler;
use crate::store::{AlbumLookup, CacheStore};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Counters accumulated over one walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub albums: u32,
    pub full_cache: u32,
    pub partial_cache: u32,
    pub photos_reused: u32,
    pub photos_extracted: u32,
    pub thumbnails_written: u32,
    pub unreadable: u32,
    pub skipped_dirs: u32,
    pub write_failures: u32,
    pub collisions: u32,
}

impl fmt::Display for WalkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} albums ({} fully cached, {} partially), {} photos reused, {} extracted, {} thumbnails written",
            self.albums,
            self.full_cache,
            self.partial_cache,
            self.photos_reused,
            self.photos_extracted,
            self.thumbnails_written
        )?;
        if self.unreadable > 0 {
            write!(f, ", {} unreadable", self.unreadable)?;
        }
        if self.skipped_dirs > 0 {
            write!(f, ", {} directories skipped", self.skipped_dirs)?;
        }
        if self.write_failures > 0 {
            write!(f, ", {} write failures", self.write_failures)?;
        }
        if self.collisions > 0 {
            write!(f, ", {} key collisions", self.collisions)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Entry {
    name: String,
    path: PathBuf,
    is_dir: bool,
}

/// Result of resolving one file.
enum Resolved {
    Reused(Photo),
    Extracted {
        photo: Photo,
        written: u32,
        failed: u32,
    },
    Unreadable,
}

/// Walks a source tree against one cache directory.
pub struct TreeWalker<'a, C: ImageCodec> {
    codec: &'a C,
    keys: &'a CacheKeys,
    store: &'a CacheStore,
    config: &'a ScanConfig,
    shutdown: &'a ShutdownHandler,
    events: EventSink,
    stats: WalkStats,
    /// Cache key → source path that claimed it first.
    claimed: HashMap<String, String>,
}

impl<'a, C: ImageCodec> TreeWalker<'a, C> {
    pub fn new(
        codec: &'a C,
        keys: &'a CacheKeys,
        store: &'a CacheStore,
        config: &'a ScanConfig,
        shutdown: &'a ShutdownHandler,
        events: EventSink,
    ) -> Self {
        Self {
            codec,
            keys,
            store,
            config,
            shutdown,
            events,
            stats: WalkStats::default(),
            claimed: HashMap::from([(
                keys::FLAT_INDEX_NAME.to_string(),
                keys::FLAT_INDEX_NAME.to_string(),
            )]),
        }
    }

    pub fn into_stats(self) -> WalkStats {
        self.stats
    }

    /// Walk `dir` (at nesting `depth`) and return its album, or `None` when
    /// the directory is unreadable or holds no photos anywhere below it.
    pub fn walk(&mut self, dir: &Path, depth: usize) -> Result<Option<Album>, ScanError> {
        self.check_interrupt()?;
        let label = display_name(dir);

        let Some(relative) = self.keys.relative(dir) else {
            log::warn!("{}: not under the source root, skipping", dir.display());
            self.stats.skipped_dirs += 1;
            return Ok(None);
        };

        let entries = match self.list_entries(dir, depth) {
            Ok(entries) => entries,
            Err(e) => {
                self.events.emit(depth, EventKind::AccessDenied, &label);
                log::warn!("{}: cannot list directory: {e}", dir.display());
                self.stats.skipped_dirs += 1;
                return Ok(None);
            }
        };
        self.events.emit(depth, EventKind::Walking, &label);

        let dir_mtime = file_mtime(dir).ok();
        let (mut album, cached, full_cache) = match self.store.load_album(&relative) {
            AlbumLookup::Missing => (Album::new(relative.as_str()), None, false),
            AlbumLookup::Corrupt(reason) => {
                self.events.emit(depth, EventKind::CorruptCache, &label);
                log::warn!("{}: ignoring cached album: {reason}", dir.display());
                (Album::new(relative.as_str()), None, false)
            }
            AlbumLookup::Loaded { album, modified } => {
                if dir_mtime.is_some_and(|m| m <= modified) {
                    self.events.emit(depth, EventKind::FullCache, &label);
                    (album, None, true)
                } else {
                    self.events.emit(depth, EventKind::PartialCache, &label);
                    self.stats.partial_cache += 1;
                    (Album::new(relative.as_str()), Some(album), false)
                }
            }
        };

        let (dirs, files): (Vec<Entry>, Vec<Entry>) =
            entries.into_iter().partition(|e| e.is_dir);

        let mut thumbnail_failures = 0;
        if full_cache {
            self.stats.full_cache += 1;
            self.stats.photos_reused += album.photos().len() as u32;
        } else {
            let (photos, failed) =
                self.resolve_files(&relative, &files, cached.as_ref(), depth + 1)?;
            thumbnail_failures = failed;
            for photo in photos {
                album.add_photo(photo);
            }
        }

        for sub in &dirs {
            if let Some(child) = self.walk(&sub.path, depth + 1)? {
                album.add_album(child);
            }
        }

        if album.is_empty() {
            self.events.emit(depth, EventKind::Empty, &label);
            return Ok(None);
        }

        self.claim_keys(&album, depth);
        if thumbnail_failures > 0 {
            // A saved document would make the next walk take the missing
            // thumbnails for fresh ones.
            log::warn!(
                "{}: {thumbnail_failures} thumbnails failed, leaving the album uncached",
                dir.display()
            );
            if let Err(e) = self.store.discard_album(&relative) {
                log::warn!("{}: cannot remove album document: {e}", dir.display());
                self.stats.write_failures += 1;
            }
        } else {
            self.events.emit(depth, EventKind::Caching, &label);
            if let Err(e) = self.store.save_album(&album) {
                self.events.emit(depth, EventKind::SaveFailure, album.document_name());
                log::warn!("{}: cannot write album document: {e}", dir.display());
                self.stats.write_failures += 1;
            }
        }
        self.stats.albums += 1;
        Ok(Some(album))
    }

    fn check_interrupt(&self) -> Result<(), ScanError> {
        if self.shutdown.is_shutdown_requested() {
            Err(ScanError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Visible, UTF-8 named directories and regular files, sorted by name.
    ///
    /// Symlinks are followed. The cache directory is never listed, even when it
    /// sits inside the source tree.
    fn list_entries(&mut self, dir: &Path, depth: usize) -> std::io::Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    log::warn!("{}: skipping unreadable entry: {e}", dir.display());
                    continue;
                }
            };
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                self.events.emit(
                    depth + 1,
                    EventKind::UnicodeError,
                    file_name.to_string_lossy(),
                );
                log::warn!(
                    "{}: skipping non-UTF-8 name {:?}",
                    dir.display(),
                    file_name
                );
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path == self.store.cache_dir() {
                continue;
            }
            let is_dir = match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => true,
                Ok(meta) if meta.is_file() => false,
                Ok(_) => continue,
                Err(e) => {
                    log::debug!("{}: cannot stat: {e}", path.display());
                    continue;
                }
            };
            entries.push(Entry {
                name: name.to_string(),
                path,
                is_dir,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    /// Resolve every file of one directory to a photo, in parallel.
    ///
    /// Also returns how many thumbnail writes failed.
    fn resolve_files(
        &mut self,
        album_path: &str,
        files: &[Entry],
        cached: Option<&Album>,
        depth: usize,
    ) -> Result<(Vec<Photo>, u32), ScanError> {
        let codec = self.codec;
        let shutdown = self.shutdown;
        let events = &self.events;
        let target = ThumbnailTarget {
            cache_dir: self.store.cache_dir(),
            specs: &self.config.thumbnails,
            quality: self.config.jpeg_quality(),
        };

        let resolved: Vec<Resolved> = files
            .par_iter()
            .map(|file| {
                if shutdown.is_shutdown_requested() {
                    return Err(ScanError::Interrupted);
                }
                Ok(resolve_one(
                    codec, file, album_path, cached, target, events, depth,
                ))
            })
            .collect::<Result<_, _>>()?;
        self.check_interrupt()?;

        let mut photos = Vec::with_capacity(resolved.len());
        let mut thumbnail_failures = 0;
        for r in resolved {
            match r {
                Resolved::Reused(photo) => {
                    self.stats.photos_reused += 1;
                    photos.push(photo);
                }
                Resolved::Extracted {
                    photo,
                    written,
                    failed,
                } => {
                    self.stats.photos_extracted += 1;
                    self.stats.thumbnails_written += written;
                    self.stats.write_failures += failed;
                    thumbnail_failures += failed;
                    photos.push(photo);
                }
                Resolved::Unreadable => self.stats.unreadable += 1,
            }
        }
        Ok((photos, thumbnail_failures))
    }

    /// Record the cache keys an album and its photos claim, reporting any key
    /// already claimed by a different source path.
    fn claim_keys(&mut self, album: &Album, depth: usize) {
        let mut claims = vec![(album.document_name(), album.path().to_string())];
        for photo in album.photos() {
            claims.push((keys::derive_key(photo.path()), photo.path().to_string()));
        }
        for (key, path) in claims {
            match self.claimed.get(&key) {
                Some(owner) if *owner != path => {
                    self.events.emit(
                        depth,
                        EventKind::Collision,
                        format!("{path} and {owner} share {key}"),
                    );
                    log::warn!("cache key {key} is shared by {owner:?} and {path:?}; last write wins");
                    self.stats.collisions += 1;
                    self.claimed.insert(key, path);
                }
                Some(_) => {}
                None => {
                    self.claimed.insert(key, path);
                }
            }
        }
    }
}

fn resolve_one<C: ImageCodec>(
    codec: &C,
    file: &Entry,
    album_path: &str,
    cached: Option<&Album>,
    target: ThumbnailTarget<'_>,
    events: &EventSink,
    depth: usize,
) -> Resolved {
    let live = match file_mtime(&file.path) {
        Ok(t) => t,
        Err(e) => {
            events.emit(depth, EventKind::Unreadable, &file.name);
            log::warn!("{}: cannot stat: {e}", file.path.display());
            return Resolved::Unreadable;
        }
    };

    if let Some(photo) = cached
        .and_then(|album| album.photo(&file.name))
        .filter(|photo| photo.is_fresh_for(live))
    {
        events.emit(depth, EventKind::CacheHit, &file.name);
        return Resolved::Reused(photo.clone());
    }

    events.emit(depth, EventKind::Metainfo, &file.name);
    let relative = keys::join_relative(album_path, &file.name);
    match photo::extract_photo(codec, &file.path, &relative, target) {
        Ok(extraction) => {
            let mut written = 0;
            let mut failed = 0;
            for thumb in &extraction.thumbnails {
                match &thumb.outcome {
                    ThumbnailOutcome::Fresh => {}
                    ThumbnailOutcome::Written => {
                        let square = if thumb.spec.square { ", square" } else { "" };
                        events.emit(
                            depth,
                            EventKind::Thumbing,
                            format!("{} -> {}px{square}", file.name, thumb.spec.size),
                        );
                        written += 1;
                    }
                    ThumbnailOutcome::Failed(reason) => {
                        events.emit(depth, EventKind::SaveFailure, &thumb.name);
                        log::warn!("{}: cannot write thumbnail: {reason}", thumb.name);
                        failed += 1;
                    }
                }
            }
            Resolved::Extracted {
                photo: extraction.photo,
                written,
                failed,
            }
        }
        Err(e) => {
            events.emit(depth, EventKind::Unreadable, &file.name);
            log::debug!("{}: {e}", file.path.display());
            Resolved::Unreadable
        }
    }
}

fn display_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.display().to_string())
}
