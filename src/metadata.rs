//! EXIF tags → photo attributes.
//!
//! The codec hands over raw tags ([`ExifTags`]); this module decides which of
//! them become attributes and how enumerated codes are labelled. Nothing here
//! touches the filesystem.
//!
//! ## Field rules
//!
//! - **size**: decoded dimensions, swapped for orientations 5–8 (quarter turns)
//! - **aperture**: `ApertureValue`, else `FNumber`
//! - **iso**: the last present of `ISOSpeedRatings`, `ISO`, `ISOSpeed`,
//!   `PhotographicSensitivity`
//! - **exposureCompensation**: `ExposureBiasValue` overrides `ExposureCompensation`
//! - **artist**, **copyright**: HTML-escaped, they end up in web pages verbatim
//! - **enumerations** (flash, light source, metering, ...): labelled through the
//!   tables below; codes outside a table are left out
//! - **dates**: `YYYY:MM:DD HH:MM:SS`; unparseable EXIF dates are dropped

use crate::imaging::{Dimensions, ExifTags, TagValue};
use crate::model::{DocDate, PhotoAttributes};
use chrono::NaiveDateTime;

/// Timestamp layout used inside EXIF.
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

const FLASH: &[(i64, &str)] = &[
    (0x00, "No Flash"),
    (0x01, "Fired"),
    (0x05, "Fired, Return not detected"),
    (0x07, "Fired, Return detected"),
    (0x08, "On, Did not fire"),
    (0x09, "On, Fired"),
    (0x0d, "On, Return not detected"),
    (0x0f, "On, Return detected"),
    (0x10, "Off, Did not fire"),
    (0x14, "Off, Did not fire, Return not detected"),
    (0x18, "Auto, Did not fire"),
    (0x19, "Auto, Fired"),
    (0x1d, "Auto, Fired, Return not detected"),
    (0x1f, "Auto, Fired, Return detected"),
    (0x20, "No flash function"),
    (0x30, "Off, No flash function"),
    (0x41, "Fired, Red-eye reduction"),
    (0x45, "Fired, Red-eye reduction, Return not detected"),
    (0x47, "Fired, Red-eye reduction, Return detected"),
    (0x49, "On, Red-eye reduction"),
    (0x4d, "On, Red-eye reduction, Return not detected"),
    (0x4f, "On, Red-eye reduction, Return detected"),
    (0x50, "Off, Red-eye reduction"),
    (0x58, "Auto, Did not fire, Red-eye reduction"),
    (0x59, "Auto, Fired, Red-eye reduction"),
    (0x5d, "Auto, Fired, Red-eye reduction, Return not detected"),
    (0x5f, "Auto, Fired, Red-eye reduction, Return detected"),
];

const LIGHT_SOURCE: &[(i64, &str)] = &[
    (0, "Unknown"),
    (1, "Daylight"),
    (2, "Fluorescent"),
    (3, "Tungsten (incandescent light)"),
    (4, "Flash"),
    (9, "Fine weather"),
    (10, "Cloudy weather"),
    (11, "Shade"),
    (12, "Daylight fluorescent (D 5700 - 7100K)"),
    (13, "Day white fluorescent (N 4600 - 5400K)"),
    (14, "Cool white fluorescent (W 3900 - 4500K)"),
    (15, "White fluorescent (WW 3200 - 3700K)"),
    (17, "Standard light A"),
    (18, "Standard light B"),
    (19, "Standard light C"),
    (20, "D55"),
    (21, "D65"),
    (22, "D75"),
    (23, "D50"),
    (24, "ISO studio tungsten"),
];

const METERING_MODE: &[&str] = &[
    "Unknown",
    "Average",
    "Center-weighted average",
    "Spot",
    "Multi-spot",
    "Multi-segment",
    "Partial",
];

const EXPOSURE_PROGRAM: &[&str] = &[
    "Not Defined",
    "Manual",
    "Program AE",
    "Aperture-priority AE",
    "Shutter speed priority AE",
    "Creative (Slow speed)",
    "Action (High speed)",
    "Portrait",
    "Landscape",
    "Bulb",
];

/// Indexed by orientation code minus one.
const ORIENTATION: &[&str] = &[
    "Horizontal (normal)",
    "Mirror horizontal",
    "Rotate 180",
    "Mirror vertical",
    "Mirror horizontal and rotate 270 CW",
    "Rotate 90 CW",
    "Mirror horizontal and rotate 90 CW",
    "Rotate 270 CW",
];

const SENSING_METHOD: &[&str] = &[
    "Not defined",
    "One-chip color area sensor",
    "Two-chip color area sensor",
    "Three-chip color area sensor",
    "Color sequential area sensor",
    "Trilinear sensor",
    "Color sequential linear sensor",
];

const SCENE_CAPTURE_TYPE: &[&str] = &["Standard", "Landscape", "Portrait", "Night scene"];

const SUBJECT_DISTANCE_RANGE: &[&str] = &["Unknown", "Macro", "Close view", "Distant view"];

/// ISO tags in increasing precedence.
const ISO_TAGS: &[&str] = &["ISOSpeedRatings", "ISO", "ISOSpeed", "PhotographicSensitivity"];

/// EXIF orientation code, or 1 (normal) when absent.
pub fn orientation_code(tags: &ExifTags) -> u16 {
    int(tags, "Orientation")
        .and_then(|n| u16::try_from(n).ok())
        .unwrap_or(1)
}

/// Build a photo's attributes from its decoded size, EXIF tags and file time.
pub fn extract_attributes(
    dims: Dimensions,
    tags: &ExifTags,
    file_time: NaiveDateTime,
) -> PhotoAttributes {
    let mut attrs = PhotoAttributes::with_file_time(file_time);

    let orientation = orientation_code(tags);
    attrs.size = Some(if (5..=8).contains(&orientation) {
        (dims.height, dims.width)
    } else {
        (dims.width, dims.height)
    });
    if tags.contains_key("Orientation") {
        attrs.orientation = (1..=8)
            .contains(&orientation)
            .then(|| ORIENTATION[usize::from(orientation) - 1].to_string());
    }

    attrs.artist = text(tags, "Artist").map(html_escape);
    attrs.copyright = text(tags, "Copyright").map(html_escape);
    if attrs.artist.is_none() || attrs.copyright.is_none() {
        log::debug!("photo has no Artist or Copyright in its EXIF data");
    }
    attrs.make = text(tags, "Make").map(str::to_string);
    attrs.model = text(tags, "Model").map(str::to_string);
    attrs.spectral_sensitivity = text(tags, "SpectralSensitivity").map(str::to_string);

    attrs.aperture = float(tags, "ApertureValue").or_else(|| float(tags, "FNumber"));
    attrs.focal_length = float(tags, "FocalLength");
    attrs.exposure_time = float(tags, "ExposureTime");
    attrs.exposure_compensation =
        float(tags, "ExposureBiasValue").or_else(|| float(tags, "ExposureCompensation"));
    attrs.iso = ISO_TAGS
        .iter()
        .rev()
        .find_map(|name| int(tags, name).and_then(|n| u32::try_from(n).ok()));

    attrs.flash = lookup(FLASH, int(tags, "Flash"));
    attrs.light_source = lookup(LIGHT_SOURCE, int(tags, "LightSource"));
    attrs.exposure_program = label(EXPOSURE_PROGRAM, int(tags, "ExposureProgram"));
    attrs.metering_mode = label(METERING_MODE, int(tags, "MeteringMode"));
    attrs.sensing_method = label(SENSING_METHOD, int(tags, "SensingMethod"));
    attrs.scene_capture_type = label(SCENE_CAPTURE_TYPE, int(tags, "SceneCaptureType"));
    attrs.subject_distance_range =
        label(SUBJECT_DISTANCE_RANGE, int(tags, "SubjectDistanceRange"));

    attrs.date_time_original = exif_date(tags, "DateTimeOriginal");
    attrs.date_time = exif_date(tags, "DateTime");

    attrs
}

fn text<'a>(tags: &'a ExifTags, name: &str) -> Option<&'a str> {
    tags.get(name)
        .and_then(TagValue::as_text)
        .filter(|s| !s.is_empty())
}

fn int(tags: &ExifTags, name: &str) -> Option<i64> {
    tags.get(name).and_then(TagValue::as_int)
}

fn float(tags: &ExifTags, name: &str) -> Option<f64> {
    tags.get(name)
        .and_then(TagValue::as_float)
        .filter(|f| f.is_finite())
}

fn lookup(table: &[(i64, &str)], code: Option<i64>) -> Option<String> {
    let code = code?;
    table
        .iter()
        .find(|(k, _)| *k == code)
        .map(|(_, v)| v.to_string())
}

fn label(table: &[&str], code: Option<i64>) -> Option<String> {
    let index = usize::try_from(code?).ok()?;
    table.get(index).map(|s| s.to_string())
}

fn exif_date(tags: &ExifTags, name: &str) -> Option<DocDate> {
    let raw = text(tags, name)?;
    match NaiveDateTime::parse_from_str(raw, EXIF_DATE_FORMAT) {
        Ok(date) => Some(DocDate::Parsed(date)),
        Err(_) => {
            log::debug!("ignoring unparseable {name} {raw:?}");
            None
        }
    }
}

/// Escape `& < > " '` for safe embedding in HTML.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}
