//! Album/photo tree and its cache document form.
//!
//! The in-memory tree is what the walker builds; the `*Document` types are what
//! the [`store`](crate::store) persists. They differ on purpose: an album
//! document lists its photos in full but refers to sub-albums only by
//! `(path, date)`, so rewriting one leaf album never rewrites its ancestors'
//! contents.
//!
//! ```json
//! {"path":"2020/June","date":"Mon Jun 01 10:00:00 2020",
//!  "albums":[{"path":"Beach","date":"Sun May 31 09:00:00 2020"}],
//!  "photos":[{"name":"a.jpg","date":"Mon Jun 01 10:00:00 2020","dateTimeFile":"..."}]}
//! ```

use crate::config::ThumbnailSpec;
use crate::keys;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Reverse;
use std::path::Path;
use thiserror::Error;

/// Textual timestamp format used in every cache document.
pub const DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("photo entry has an invalid name: {0:?}")]
    InvalidPhotoName(String),
}

// ============================================================================
// Dates
// ============================================================================

/// Date reported by albums with no photos and no sub-albums.
pub fn epoch() -> NaiveDateTime {
    let day = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or_default();
    NaiveDateTime::new(day, NaiveTime::MIN)
}

/// Modification time of `path`, in local time, truncated to whole seconds.
pub fn file_mtime(path: &Path) -> std::io::Result<NaiveDateTime> {
    let modified = std::fs::metadata(path)?.modified()?;
    let local: DateTime<Local> = modified.into();
    Ok(local.naive_local().trunc_subsecs(0))
}

/// A timestamp as stored in a document.
///
/// Values that do not parse with [`DATE_FORMAT`] are kept verbatim instead of
/// failing the whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocDate {
    Parsed(NaiveDateTime),
    Raw(String),
}

impl DocDate {
    pub fn parsed(&self) -> Option<NaiveDateTime> {
        match self {
            DocDate::Parsed(date) => Some(*date),
            DocDate::Raw(_) => None,
        }
    }
}

impl From<NaiveDateTime> for DocDate {
    fn from(date: NaiveDateTime) -> Self {
        DocDate::Parsed(date)
    }
}

impl Serialize for DocDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DocDate::Parsed(date) => {
                serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
            }
            DocDate::Raw(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for DocDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(match NaiveDateTime::parse_from_str(&text, DATE_FORMAT) {
            Ok(date) => DocDate::Parsed(date),
            Err(_) => DocDate::Raw(text),
        })
    }
}

// ============================================================================
// Photo
// ============================================================================

/// Flat attribute map attached to every photo.
///
/// `date_time_file` is the source modification time recorded at extraction;
/// it is the only field the staleness rule looks at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoAttributes {
    pub date_time_file: DocDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<(u32, u32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub make: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spectral_sensitivity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metering_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensing_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_capture_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_distance_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_compensation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time_original: Option<DocDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DocDate>,
}

impl PhotoAttributes {
    /// Attributes carrying nothing but the source modification time.
    pub fn with_file_time(date_time_file: NaiveDateTime) -> Self {
        Self {
            date_time_file: date_time_file.into(),
            size: None,
            orientation: None,
            artist: None,
            copyright: None,
            make: None,
            model: None,
            aperture: None,
            focal_length: None,
            iso: None,
            exposure_time: None,
            flash: None,
            light_source: None,
            exposure_program: None,
            spectral_sensitivity: None,
            metering_mode: None,
            sensing_method: None,
            scene_capture_type: None,
            subject_distance_range: None,
            exposure_compensation: None,
            date_time_original: None,
            date_time: None,
        }
    }
}

/// A valid, indexed image file.
///
/// Files that fail to decode never become a `Photo`; see
/// [`photo::extract_photo`](crate::photo::extract_photo).
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    path: String,
    attributes: PhotoAttributes,
}

impl Photo {
    pub fn new(path: impl Into<String>, attributes: PhotoAttributes) -> Self {
        Self {
            path: path.into(),
            attributes,
        }
    }

    /// Path relative to the source root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name, the last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn attributes(&self) -> &PhotoAttributes {
        &self.attributes
    }

    /// Display date: capture time, then generic EXIF time, then file time.
    pub fn date(&self) -> NaiveDateTime {
        let attrs = &self.attributes;
        attrs
            .date_time_original
            .as_ref()
            .and_then(DocDate::parsed)
            .or_else(|| attrs.date_time.as_ref().and_then(DocDate::parsed))
            .or_else(|| attrs.date_time_file.parsed())
            .unwrap_or_else(epoch)
    }

    /// Whether the recorded source time still covers a file modified at `live`.
    pub fn is_fresh_for(&self, live: NaiveDateTime) -> bool {
        self.attributes
            .date_time_file
            .parsed()
            .is_some_and(|recorded| recorded >= live)
    }

    /// Names of every thumbnail artifact this photo owns.
    pub fn thumbnail_names(&self, specs: &[ThumbnailSpec]) -> Vec<String> {
        specs
            .iter()
            .map(|spec| spec.artifact_name(&self.path))
            .collect()
    }

    fn to_document(&self) -> PhotoDocument {
        PhotoDocument {
            name: self.name().to_string(),
            date: self.date().into(),
            attributes: self.attributes.clone(),
        }
    }
}

// ============================================================================
// Album
// ============================================================================

/// A directory node: photos sorted by name, sub-albums newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct Album {
    path: String,
    photos: Vec<Photo>,
    albums: Vec<Album>,
    date: NaiveDateTime,
}

impl Album {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            photos: Vec::new(),
            albums: Vec::new(),
            date: epoch(),
        }
    }

    /// Path relative to the source root; empty for the root album.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn albums(&self) -> &[Album] {
        &self.albums
    }

    /// Most recent date among direct photos and sub-albums, or [`epoch`].
    pub fn date(&self) -> NaiveDateTime {
        self.date
    }

    /// True when there are no photos anywhere in this subtree.
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty() && self.albums.iter().all(Album::is_empty)
    }

    pub fn document_name(&self) -> String {
        keys::album_document_name(&self.path)
    }

    /// Direct photo with the given file name.
    pub fn photo(&self, name: &str) -> Option<&Photo> {
        self.photos
            .binary_search_by(|p| p.name().cmp(name))
            .ok()
            .map(|i| &self.photos[i])
    }

    /// Insert a photo in name order, replacing one with the same name.
    pub fn add_photo(&mut self, photo: Photo) {
        match self.photos.binary_search_by(|p| p.name().cmp(photo.name())) {
            Ok(i) => self.photos[i] = photo,
            Err(i) => self.photos.insert(i, photo),
        }
        self.refresh_date();
    }

    /// Insert a sub-album, keeping newest-first order (ties by path).
    pub fn add_album(&mut self, album: Album) {
        let key = (Reverse(album.date), album.path.clone());
        let pos = self
            .albums
            .partition_point(|a| (Reverse(a.date), a.path.clone()) < key);
        self.albums.insert(pos, album);
        self.refresh_date();
    }

    fn refresh_date(&mut self) {
        self.date = self
            .photos
            .iter()
            .map(Photo::date)
            .chain(self.albums.iter().map(|a| a.date))
            .max()
            .unwrap_or_else(epoch);
    }

    /// Every album in this subtree, this one included, depth first.
    pub fn all_albums(&self) -> Vec<&Album> {
        let mut out = vec![self];
        for album in &self.albums {
            out.extend(album.all_albums());
        }
        out
    }

    /// Every photo in this subtree.
    pub fn all_photos(&self) -> Vec<&Photo> {
        let mut out: Vec<&Photo> = self.photos.iter().collect();
        for album in &self.albums {
            out.extend(album.all_photos());
        }
        out
    }

    /// Sorted paths of every photo in this subtree: the flat index.
    pub fn photo_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .all_photos()
            .into_iter()
            .map(|p| p.path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Shallow document: full photo list, `(path, date)` per non-empty sub-album.
    pub fn to_document(&self) -> AlbumDocument {
        AlbumDocument {
            path: self.path.clone(),
            date: self.date.into(),
            albums: self
                .albums
                .iter()
                .filter(|a| !a.is_empty())
                .map(|a| AlbumReference {
                    path: keys::relative_to(&a.path, &self.path),
                    date: a.date.into(),
                })
                .collect(),
            photos: self.photos.iter().map(Photo::to_document).collect(),
        }
    }

    /// Rebuild an album from its document.
    ///
    /// Only photos are restored; sub-albums are always rediscovered by walking.
    pub fn from_document(document: AlbumDocument) -> Result<Self, ModelError> {
        let mut album = Album::new(document.path);
        for photo in document.photos {
            if photo.name.is_empty() || photo.name.contains('/') {
                return Err(ModelError::InvalidPhotoName(photo.name));
            }
            let path = keys::join_relative(&album.path, &photo.name);
            album.add_photo(Photo::new(path, photo.attributes));
        }
        Ok(album)
    }
}

// ============================================================================
// Documents
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumDocument {
    pub path: String,
    pub date: DocDate,
    pub albums: Vec<AlbumReference>,
    pub photos: Vec<PhotoDocument>,
}

/// Shallow reference to a sub-album, relative to its parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumReference {
    pub path: String,
    pub date: DocDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoDocument {
    pub name: String,
    pub date: DocDate,
    #[serde(flatten)]
    pub attributes: PhotoAttributes,
}
