//! Image codec trait and shared types.
//!
//! The [`ImageCodec`] trait is the walker's only window onto pixels and EXIF:
//! decode, read_exif, orient, and thumbnail. A photo is decoded exactly once
//! per extraction and the decoded value is handed back for every thumbnail.
//!
//! The production implementation is
//! [`RustCodec`](super::rust_backend::RustCodec). Tests use the recording
//! `MockCodec` in this module.

use super::params::ThumbnailParams;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("cannot encode {path}: {reason}")]
    Encode { path: String, reason: String },
}

/// Pixel dimensions of a decoded image, before orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// One raw EXIF value, reduced to the shapes the metadata tables understand.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl TagValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TagValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            TagValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric value; integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            TagValue::Float(f) => Some(*f),
            TagValue::Int(n) => Some(*n as f64),
            TagValue::Text(_) => None,
        }
    }
}

/// Raw EXIF tags keyed by tag name (`"DateTimeOriginal"`, `"FNumber"`, ...).
pub type ExifTags = BTreeMap<String, TagValue>;

/// Decoding, EXIF and thumbnail collaborator.
///
/// Implementations must be `Sync`: the walker resolves sibling photos on
/// rayon's pool and shares one codec across them.
pub trait ImageCodec: Sync {
    type Image;

    /// Decode the file. Failure means the file is not a usable photo.
    fn decode(&self, path: &Path) -> Result<Self::Image, CodecError>;

    /// Dimensions of a decoded image.
    fn dimensions(&self, image: &Self::Image) -> Dimensions;

    /// Raw EXIF tags of the primary image. Empty when the file has none.
    fn read_exif(&self, path: &Path) -> ExifTags;

    /// Apply an EXIF orientation code (1-8). Other codes leave the image as is.
    fn orient(&self, image: Self::Image, orientation: u16) -> Self::Image;

    /// Write one thumbnail of `image` to `params.output`.
    fn thumbnail(&self, image: &Self::Image, params: &ThumbnailParams) -> Result<(), CodecError>;
}
