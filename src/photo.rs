//! Per-photo extraction.
//!
//! Turns one source file into a [`Photo`] and brings its thumbnails up to
//! date. The file is decoded once; if every thumbnail is already fresh the
//! decoded image is never oriented or resized.
//!
//! A thumbnail is fresh when it exists and its mtime is at least the source's
//! mtime. Thumbnail failures are reported per variant and do not invalidate the
//! photo: its metadata is still indexed.

use crate::config::ThumbnailSpec;
use crate::imaging::{CodecError, ImageCodec, Quality, ThumbnailParams};
use crate::metadata;
use crate::model::{Photo, file_mtime};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("cannot stat {path}: {source}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// What happened to one thumbnail variant.
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbnailOutcome {
    Fresh,
    Written,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailReport {
    pub spec: ThumbnailSpec,
    pub name: String,
    pub outcome: ThumbnailOutcome,
}

/// A freshly extracted photo and the state of each of its thumbnails.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub photo: Photo,
    pub thumbnails: Vec<ThumbnailReport>,
}

/// Where extracted artifacts go and how they are encoded.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailTarget<'a> {
    pub cache_dir: &'a Path,
    pub specs: &'a [ThumbnailSpec],
    pub quality: Quality,
}

/// Whether the artifact at `path` is a regular file at least as new as the
/// source.
pub fn artifact_is_fresh(path: &Path, source_mtime: NaiveDateTime) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file())
        && file_mtime(path).is_ok_and(|t| t >= source_mtime)
}

/// Extract metadata for the file at `source` (source-relative path
/// `relative`) and refresh its thumbnails.
///
/// Fails when the file cannot be stat'ed or decoded; such files are not photos.
pub fn extract_photo<C: ImageCodec>(
    codec: &C,
    source: &Path,
    relative: &str,
    target: ThumbnailTarget<'_>,
) -> Result<Extraction, PhotoError> {
    let mtime = file_mtime(source).map_err(|e| PhotoError::Stat {
        path: source.to_path_buf(),
        source: e,
    })?;
    let image = codec.decode(source)?;
    let tags = codec.read_exif(source);
    let attributes = metadata::extract_attributes(codec.dimensions(&image), &tags, mtime);
    let photo = Photo::new(relative, attributes);

    let orientation = metadata::orientation_code(&tags);
    let mut pending = Some(image);
    let mut oriented: Option<C::Image> = None;
    let mut thumbnails = Vec::with_capacity(target.specs.len());

    for spec in target.specs {
        let name = spec.artifact_name(relative);
        let output = target.cache_dir.join(&name);
        let outcome = if artifact_is_fresh(&output, mtime) {
            ThumbnailOutcome::Fresh
        } else {
            if let Some(image) = pending.take() {
                oriented = Some(codec.orient(image, orientation));
            }
            match &oriented {
                Some(image) => {
                    let params = ThumbnailParams {
                        output,
                        size: spec.size,
                        square: spec.square,
                        quality: target.quality,
                    };
                    match codec.thumbnail(image, &params) {
                        Ok(()) => ThumbnailOutcome::Written,
                        Err(e) => ThumbnailOutcome::Failed(e.to_string()),
                    }
                }
                None => ThumbnailOutcome::Failed("image unavailable".into()),
            }
        };
        thumbnails.push(ThumbnailReport {
            spec: *spec,
            name,
            outcome,
        });
    }

    Ok(Extraction { photo, thumbnails })
}
