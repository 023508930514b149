use std::io::BufReader;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Tag, Value};

use crate::domain::LatLon;
use crate::error::Result;

/// Metadata the core needs from a photo file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifData {
    pub capture_time: Option<NaiveDateTime>,
    pub position: Option<LatLon>,
}

/// Reads capture time and GPS position from an image file.
pub trait ExifProvider: Send + Sync {
    fn read(&self, path: &Path) -> Result<ExifData>;
}

/// `ExifProvider` backed by kamadak-exif.
#[derive(Debug, Clone, Copy, Default)]
pub struct KamadakExif;

impl ExifProvider for KamadakExif {
    fn read(&self, path: &Path) -> Result<ExifData> {
        let file = std::fs::File::open(path)?;
        let mut reader = BufReader::new(file);
        let exif = exif::Reader::new().read_from_container(&mut reader)?;
        Ok(extract(&exif))
    }
}

pub(crate) fn extract(exif: &exif::Exif) -> ExifData {
    let capture_time = [Tag::DateTimeOriginal, Tag::DateTime]
        .iter()
        .find_map(|&tag| exif.get_field(tag, In::PRIMARY).and_then(|f| parse_datetime(&f.value)));

    let position = match (
        coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef),
        coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef),
    ) {
        (Some(lat), Some(lon)) => Some(LatLon { lat, lon }),
        _ => None,
    };

    ExifData { capture_time, position }
}

fn parse_datetime(value: &Value) -> Option<NaiveDateTime> {
    let Value::Ascii(ref parts) = *value else {
        return None;
    };
    let dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
    NaiveDate::from_ymd_opt(dt.year as i32, dt.month as u32, dt.day as u32)?
        .and_hms_opt(dt.hour as u32, dt.minute as u32, dt.second as u32)
}

fn coordinate(exif: &exif::Exif, value_tag: Tag, ref_tag: Tag) -> Option<f64> {
    let field = exif.get_field(value_tag, In::PRIMARY)?;
    let Value::Rational(ref parts) = field.value else {
        return None;
    };
    if parts.len() < 3 || parts.iter().any(|r| r.denom == 0) {
        return None;
    }
    let reference = exif
        .get_field(ref_tag, In::PRIMARY)
        .and_then(|f| match f.value {
            Value::Ascii(ref v) => v.first().and_then(|s| s.first().copied()),
            _ => None,
        })
        .map(char::from)
        .unwrap_or('N');

    Some(dms_to_decimal(
        parts[0].to_f64(),
        parts[1].to_f64(),
        parts[2].to_f64(),
        reference,
    ))
}

/// Degrees/minutes/seconds to signed decimal degrees. `S` and `W` are negative.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, reference: char) -> f64 {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match reference.to_ascii_uppercase() {
        'S' | 'W' => -value,
        _ => value,
    }
}
