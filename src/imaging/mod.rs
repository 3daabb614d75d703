//! Image decoding, EXIF reading and thumbnail writing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` |
//! | **EXIF** | `kamadak-exif` |
//! | **Orient** | `DynamicImage` rotate/flip |
//! | **Thumbnail** | Lanczos3 fit + optional square padding → JPEG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for thumbnail geometry (unit testable)
//! - **Parameters**: Data structures describing one thumbnail write
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]

pub mod backend;
mod calculations;
mod exif_reader;
mod params;
pub mod rust_backend;

pub use backend::{CodecError, Dimensions, ExifTags, ImageCodec, TagValue};
pub use calculations::{fit_within, square_padding};
pub use params::{Quality, ThumbnailParams};
pub use rust_backend::RustCodec;
