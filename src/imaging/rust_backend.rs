//! Pure Rust codec built on the `image` crate ecosystem.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with format sniffing |
//! | EXIF | `kamadak-exif` via [`read_exif_tags`](super::exif_reader::read_exif_tags) |
//! | Orientation | `DynamicImage::{rotate90, rotate180, rotate270, fliph, flipv}` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Square padding | `image::imageops::overlay` onto a black `RgbImage` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Atomic write | `tempfile::NamedTempFile` in the output dir + `persist` |

use super::backend::{CodecError, Dimensions, ExifTags, ImageCodec};
use super::calculations::{fit_within, square_padding};
use super::exif_reader::read_exif_tags;
use super::params::ThumbnailParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, RgbImage};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Production codec. See the [module docs](self) for the crate-to-operation mapping.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, reason: impl ToString) -> CodecError {
    CodecError::Decode {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn encode_error(path: &Path, reason: impl ToString) -> CodecError {
    CodecError::Encode {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Encode as JPEG into a temp file beside `path`, then rename over it.
///
/// Readers of the cache never observe a half-written thumbnail.
fn save_jpeg(img: &RgbImage, path: &Path, quality: u32) -> Result<(), CodecError> {
    let dir = path
        .parent()
        .ok_or_else(|| encode_error(path, "output has no parent directory"))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100) as u8)
            .write_image(
                img.as_raw(),
                img.width(),
                img.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| encode_error(path, e))?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| CodecError::Io(e.error))?;
    Ok(())
}

impl ImageCodec for RustCodec {
    type Image = DynamicImage;

    fn decode(&self, path: &Path) -> Result<DynamicImage, CodecError> {
        ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(|e| decode_error(path, e))
    }

    fn dimensions(&self, image: &DynamicImage) -> Dimensions {
        Dimensions {
            width: image.width(),
            height: image.height(),
        }
    }

    fn read_exif(&self, path: &Path) -> ExifTags {
        read_exif_tags(path)
    }

    fn orient(&self, image: DynamicImage, orientation: u16) -> DynamicImage {
        match orientation {
            2 => image.fliph(),
            3 => image.rotate180(),
            4 => image.flipv(),
            5 => image.fliph().rotate270(),
            6 => image.rotate90(),
            7 => image.fliph().rotate90(),
            8 => image.rotate270(),
            _ => image,
        }
    }

    fn thumbnail(&self, image: &DynamicImage, params: &ThumbnailParams) -> Result<(), CodecError> {
        let (w, h) = fit_within((image.width(), image.height()), params.size);
        let fitted = if (w, h) == (image.width(), image.height()) {
            image.to_rgb8()
        } else {
            image.resize_exact(w, h, FilterType::Lanczos3).to_rgb8()
        };

        let output = if params.square {
            let (side, x, y) = square_padding((w, h));
            let mut canvas = RgbImage::new(side, side);
            image::imageops::overlay(&mut canvas, &fitted, i64::from(x), i64::from(y));
            canvas
        } else {
            fitted
        };

        save_jpeg(&output, &params.output, params.quality.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use image::GenericImageView;

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn params(output: &Path, size: u32, square: bool) -> ThumbnailParams {
        ThumbnailParams {
            output: output.to_path_buf(),
            size,
            square,
            quality: Quality::new(88),
        }
    }

    #[test]
    fn decode_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let codec = RustCodec::new();
        let image = codec.decode(&path).unwrap();
        assert_eq!(
            codec.dimensions(&image),
            Dimensions {
                width: 200,
                height: 150
            }
        );
    }

    #[test]
    fn decode_sniffs_format_regardless_of_extension() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("mislabeled.png");
        create_test_jpeg(&path, 40, 30);
        assert!(RustCodec::new().decode(&path).is_ok());
    }

    #[test]
    fn decode_non_image_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "shopping list").unwrap();
        assert!(matches!(
            RustCodec::new().decode(&path),
            Err(CodecError::Decode { .. })
        ));
    }

    #[test]
    fn decode_nonexistent_file_errors() {
        assert!(RustCodec::new().decode(Path::new("/nonexistent/image.jpg")).is_err());
    }

    #[test]
    fn read_exif_synthetic_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 100, 100);
        assert!(RustCodec::new().read_exif(&path).is_empty());
    }

    #[test]
    fn orient_quarter_turns_swap_dimensions() {
        let codec = RustCodec::new();
        for code in 5..=8 {
            let img = DynamicImage::ImageRgb8(RgbImage::new(40, 30));
            assert_eq!(codec.orient(img, code).dimensions(), (30, 40), "code {code}");
        }
        for code in [0, 1, 2, 3, 4, 9] {
            let img = DynamicImage::ImageRgb8(RgbImage::new(40, 30));
            assert_eq!(codec.orient(img, code).dimensions(), (40, 30), "code {code}");
        }
    }

    #[test]
    fn orient_rotate_cw_moves_top_left_to_top_right() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgb([255, 0, 0]));
        let rotated = RustCodec::new().orient(DynamicImage::ImageRgb8(img), 6).to_rgb8();
        // 2x1 → 1x2; the red pixel ends up on top.
        assert_eq!(rotated.get_pixel(0, 0), &image::Rgb([255, 0, 0]));
    }

    #[test]
    fn thumbnail_fits_within_bound() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 800, 600);
        let output = tmp.path().join("thumb_640.jpg");

        let codec = RustCodec::new();
        let image = codec.decode(&source).unwrap();
        codec.thumbnail(&image, &params(&output, 640, false)).unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (640, 480));
    }

    #[test]
    fn thumbnail_square_pads_to_square() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 800, 600);
        let output = tmp.path().join("thumb_75s.jpg");

        let codec = RustCodec::new();
        let image = codec.decode(&source).unwrap();
        codec.thumbnail(&image, &params(&output, 75, true)).unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (75, 75));
    }

    #[test]
    fn thumbnail_never_upscales() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("small.jpg");
        create_test_jpeg(&source, 50, 40);
        let output = tmp.path().join("thumb_1024.jpg");

        let codec = RustCodec::new();
        let image = codec.decode(&source).unwrap();
        codec.thumbnail(&image, &params(&output, 1024, false)).unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (50, 40));
    }

    #[test]
    fn thumbnail_replaces_existing_file_without_leftovers() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 200, 100);
        let output = tmp.path().join("thumb_150.jpg");
        std::fs::write(&output, b"stale").unwrap();

        let codec = RustCodec::new();
        let image = codec.decode(&source).unwrap();
        codec.thumbnail(&image, &params(&output, 150, false)).unwrap();

        assert_eq!(image::image_dimensions(&output).unwrap(), (150, 75));
        let entries = std::fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(entries, 2, "temp file should have been renamed away");
    }

    #[test]
    fn thumbnail_into_missing_dir_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 20, 20);
        let output = tmp.path().join("missing").join("thumb.jpg");

        let codec = RustCodec::new();
        let image = codec.decode(&source).unwrap();
        assert!(codec.thumbnail(&image, &params(&output, 10, false)).is_err());
    }
}
