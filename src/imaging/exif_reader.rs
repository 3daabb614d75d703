//! EXIF extraction via `kamadak-exif`.
//!
//! Only primary-image (IFD0 + Exif IFD) fields are read. Each field is reduced
//! to its first component as a [`TagValue`]; multi-valued tags the metadata
//! tables care about (ISO, dates, lens numbers) are single-valued in practice.

use super::backend::{ExifTags, TagValue};
use exif::{Field, In, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read every primary-image EXIF field of `path`.
///
/// Files without EXIF (or that `kamadak-exif` cannot parse) yield no tags.
pub fn read_exif_tags(path: &Path) -> ExifTags {
    let mut tags = ExifTags::new();
    let Ok(file) = File::open(path) else {
        return tags;
    };
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(e) => {
            log::debug!("{}: no EXIF ({e})", path.display());
            return tags;
        }
    };

    for field in exif.fields() {
        if field.ifd_num != In::PRIMARY {
            continue;
        }
        let name = field.tag.to_string();
        match convert(field) {
            Some(value) => {
                tags.insert(name, value);
            }
            None if is_zero_rational(&field.value) => {
                log::warn!(
                    "{}: dropping {name}, rational with zero denominator",
                    path.display()
                );
            }
            None => {}
        }
    }
    tags
}

fn convert(field: &Field) -> Option<TagValue> {
    match &field.value {
        Value::Ascii(parts) => parts.first().map(|bytes| {
            let text = String::from_utf8_lossy(bytes);
            TagValue::Text(text.trim_end_matches('\0').trim().to_string())
        }),
        Value::Byte(v) => v.first().map(|n| TagValue::Int(i64::from(*n))),
        Value::Short(v) => v.first().map(|n| TagValue::Int(i64::from(*n))),
        Value::Long(v) => v.first().map(|n| TagValue::Int(i64::from(*n))),
        Value::SByte(v) => v.first().map(|n| TagValue::Int(i64::from(*n))),
        Value::SShort(v) => v.first().map(|n| TagValue::Int(i64::from(*n))),
        Value::SLong(v) => v.first().map(|n| TagValue::Int(i64::from(*n))),
        Value::Rational(v) => v
            .first()
            .filter(|r| r.denom != 0)
            .map(|r| TagValue::Float(r.to_f64())),
        Value::SRational(v) => v
            .first()
            .filter(|r| r.denom != 0)
            .map(|r| TagValue::Float(r.to_f64())),
        Value::Float(v) => v.first().map(|f| TagValue::Float(f64::from(*f))),
        Value::Double(v) => v.first().map(|f| TagValue::Float(*f)),
        _ => None,
    }
}

fn is_zero_rational(value: &Value) -> bool {
    match value {
        Value::Rational(v) => v.first().is_some_and(|r| r.denom == 0),
        Value::SRational(v) => v.first().is_some_and(|r| r.denom == 0),
        _ => false,
    }
}
