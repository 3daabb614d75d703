//! Parameter types for codec operations.
//!
//! These structs describe *what* to produce, not *how*. The walker decides which
//! thumbnails are stale; the [`backend`](super::backend) does the pixel work.
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 88). Clamped on construction.
//! - [`ThumbnailParams`]: one thumbnail to write: output path, bounding size,
//!   square padding, quality.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(88)
    }
}

/// Parameters for one thumbnail write.
///
/// The decoded image is scaled to fit within `size`×`size` (never upscaled).
/// With `square`, the scaled image is centred on a square black canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub output: PathBuf,
    pub size: u32,
    pub square: bool,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_88() {
        assert_eq!(Quality::default().value(), 88);
    }
}
