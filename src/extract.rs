//! EXIF metadata extraction: one image file in, one placemark record out.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDateTime};
use exif::{Exif, In, Tag, Value};
use thiserror::Error;

/// Per-file extraction failure. Never fatal to the overall job: callers
/// collect these into a skip report and continue with the remaining files.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no GPS coordinate tags")]
    NoGpsTag,
    #[error("unreadable file: {0}")]
    UnreadableFile(String),
    #[error("corrupt metadata: {0}")]
    CorruptMetadata(String),
}

impl ExtractionError {
    /// Stable reason name used in skip reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoGpsTag => "NoGpsTag",
            Self::UnreadableFile(_) => "UnreadableFile",
            Self::CorruptMetadata(_) => "CorruptMetadata",
        }
    }
}

/// Capture time as recorded by the camera.
///
/// EXIF `DateTime*` tags carry local wall-clock time with no zone. When the
/// companion `OffsetTime*` tag is present the offset is resolved; otherwise
/// the timestamp stays local-naive and is never silently assumed to be UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureTime {
    pub local: NaiveDateTime,
    pub offset: Option<FixedOffset>,
}

impl CaptureTime {
    /// RFC 3339 string for a KML `<when>` element. Only available when the
    /// UTC offset was recorded; a naive local time has no defined instant.
    pub fn kml_when(&self) -> Option<String> {
        let offset = self.offset?;
        self.local
            .and_local_timezone(offset)
            .single()
            .map(|dt| dt.to_rfc3339())
    }

    /// Human-readable form for descriptions and tables.
    pub fn display(&self) -> String {
        match self.offset {
            Some(offset) => format!("{} {}", self.local.format("%Y-%m-%d %H:%M:%S"), offset),
            None => format!(
                "{} (local time, zone unknown)",
                self.local.format("%Y-%m-%d %H:%M:%S")
            ),
        }
    }
}

/// Normalized metadata for one geotagged image.
///
/// Created by the extractor, consumed exactly once by the KMZ writer, never
/// mutated after creation. Latitude and longitude are always present and in
/// range; images without them never become records.
#[derive(Debug, Clone)]
pub struct PlacemarkRecord {
    pub source_path: PathBuf,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude_m: Option<f64>,
    pub timestamp: Option<CaptureTime>,
    /// EXIF orientation value 1-8; 1 when absent.
    pub orientation: u32,
    pub label: String,
}

/// Read EXIF metadata from an image file and build a placemark record.
///
/// I/O failures map to `UnreadableFile`, malformed EXIF to
/// `CorruptMetadata`, and a readable image without GPS coordinate tags to
/// `NoGpsTag`.
pub fn extract_placemark(path: &Path) -> Result<PlacemarkRecord, ExtractionError> {
    let file = File::open(path).map_err(|e| ExtractionError::UnreadableFile(e.to_string()))?;
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(exif::Error::Io(e)) => return Err(ExtractionError::UnreadableFile(e.to_string())),
        // No EXIF block at all implies no GPS tags either.
        Err(exif::Error::NotFound(_)) => return Err(ExtractionError::NoGpsTag),
        Err(e) => return Err(ExtractionError::CorruptMetadata(e.to_string())),
    };
    record_from_exif(&exif, path)
}

/// Build a record from already-parsed EXIF data.
pub fn record_from_exif(exif: &Exif, path: &Path) -> Result<PlacemarkRecord, ExtractionError> {
    let latitude = gps_coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?
        .ok_or(ExtractionError::NoGpsTag)?;
    let longitude = gps_coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?
        .ok_or(ExtractionError::NoGpsTag)?;

    if !(-90.0..=90.0).contains(&latitude) {
        return Err(ExtractionError::CorruptMetadata(format!(
            "latitude {latitude} out of range"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(ExtractionError::CorruptMetadata(format!(
            "longitude {longitude} out of range"
        )));
    }

    let orientation = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .unwrap_or(1);

    Ok(PlacemarkRecord {
        source_path: path.to_path_buf(),
        latitude,
        longitude,
        altitude_m: gps_altitude(exif),
        timestamp: capture_time(exif),
        orientation,
        label: derive_label(exif, path),
    })
}

/// Convert a degree/minute/second triple into decimal degrees.
pub fn dms_to_decimal(deg: f64, min: f64, sec: f64) -> f64 {
    deg + min / 60.0 + sec / 3600.0
}

/// Negate the decimal value for southern/western hemisphere references.
pub fn apply_hemisphere(decimal: f64, reference: Option<char>) -> Result<f64, ExtractionError> {
    match reference {
        Some('N') | Some('E') => Ok(decimal),
        Some('S') | Some('W') => Ok(-decimal),
        other => Err(ExtractionError::CorruptMetadata(format!(
            "unrecognized hemisphere reference {other:?}"
        ))),
    }
}

/// Read one signed decimal coordinate from a coordinate/reference tag pair.
///
/// `Ok(None)` means the pair is absent; malformed values are corrupt
/// metadata, not a missing tag.
fn gps_coordinate(
    exif: &Exif,
    coord_tag: Tag,
    ref_tag: Tag,
) -> Result<Option<f64>, ExtractionError> {
    let (Some(coord), Some(hemisphere)) = (
        exif.get_field(coord_tag, In::PRIMARY),
        exif.get_field(ref_tag, In::PRIMARY),
    ) else {
        return Ok(None);
    };

    let Value::Rational(ref dms) = coord.value else {
        return Err(ExtractionError::CorruptMetadata(format!(
            "{coord_tag} is not a rational value"
        )));
    };
    if dms.len() != 3 {
        return Err(ExtractionError::CorruptMetadata(format!(
            "{coord_tag} has {} components, expected 3",
            dms.len()
        )));
    }
    if dms.iter().any(|r| r.denom == 0) {
        return Err(ExtractionError::CorruptMetadata(format!(
            "{coord_tag} has a zero denominator"
        )));
    }

    let decimal = dms_to_decimal(dms[0].to_f64(), dms[1].to_f64(), dms[2].to_f64());
    let reference = hemisphere.display_value().to_string().chars().next();
    apply_hemisphere(decimal, reference).map(Some)
}

/// Altitude in meters, signed via GPSAltitudeRef (1 = below sea level).
/// Malformed altitude is dropped rather than failing the record.
fn gps_altitude(exif: &Exif) -> Option<f64> {
    let field = exif.get_field(Tag::GPSAltitude, In::PRIMARY)?;
    let Value::Rational(ref v) = field.value else {
        return None;
    };
    let r = v.first()?;
    if r.denom == 0 {
        return None;
    }
    let altitude = r.to_f64();
    let below_sea_level = exif
        .get_field(Tag::GPSAltitudeRef, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        == Some(1);
    Some(if below_sea_level { -altitude } else { altitude })
}

/// Capture timestamp: DateTimeOriginal preferred, DateTime as fallback,
/// each paired with its OffsetTime* companion when present.
fn capture_time(exif: &Exif) -> Option<CaptureTime> {
    let candidates = [
        (Tag::DateTimeOriginal, Tag::OffsetTimeOriginal),
        (Tag::DateTime, Tag::OffsetTime),
    ];
    for (dt_tag, offset_tag) in candidates {
        let Some(raw) = ascii_field(exif, dt_tag) else {
            continue;
        };
        let Ok(local) = NaiveDateTime::parse_from_str(&raw, "%Y:%m:%d %H:%M:%S") else {
            continue;
        };
        let offset = ascii_field(exif, offset_tag).and_then(|s| s.parse::<FixedOffset>().ok());
        return Some(CaptureTime { local, offset });
    }
    None
}

/// Placemark label: EXIF ImageDescription when non-empty, else file stem.
fn derive_label(exif: &Exif, path: &Path) -> String {
    ascii_field(exif, Tag::ImageDescription).unwrap_or_else(|| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned())
    })
}

fn ascii_field(exif: &Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    if let Value::Ascii(ref v) = field.value {
        v.first()
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_dms_to_decimal() {
        // 48° 51' 29.6" ≈ 48.858222
        let decimal = dms_to_decimal(48.0, 51.0, 29.6);
        assert!((decimal - 48.858222).abs() < 1e-6);
        assert_eq!(dms_to_decimal(0.0, 0.0, 0.0), 0.0);
        assert_eq!(dms_to_decimal(90.0, 0.0, 0.0), 90.0);
    }

    #[test]
    fn test_apply_hemisphere() {
        assert_eq!(apply_hemisphere(12.5, Some('N')).unwrap(), 12.5);
        assert_eq!(apply_hemisphere(12.5, Some('E')).unwrap(), 12.5);
        assert_eq!(apply_hemisphere(12.5, Some('S')).unwrap(), -12.5);
        assert_eq!(apply_hemisphere(12.5, Some('W')).unwrap(), -12.5);
        assert!(matches!(
            apply_hemisphere(12.5, Some('X')),
            Err(ExtractionError::CorruptMetadata(_))
        ));
        assert!(apply_hemisphere(12.5, None).is_err());
    }

    #[test]
    fn test_capture_time_display_without_offset() {
        let local = NaiveDate::from_ymd_opt(2023, 7, 14)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap();
        let ts = CaptureTime {
            local,
            offset: None,
        };
        assert_eq!(ts.display(), "2023-07-14 12:30:05 (local time, zone unknown)");
        // No offset means no defined instant, so no <when> element.
        assert!(ts.kml_when().is_none());
    }

    #[test]
    fn test_capture_time_with_offset() {
        let local = NaiveDate::from_ymd_opt(2023, 7, 14)
            .unwrap()
            .and_hms_opt(12, 30, 5)
            .unwrap();
        let ts = CaptureTime {
            local,
            offset: Some(FixedOffset::east_opt(2 * 3600).unwrap()),
        };
        assert_eq!(ts.kml_when().unwrap(), "2023-07-14T12:30:05+02:00");
        assert_eq!(ts.display(), "2023-07-14 12:30:05 +02:00");
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = extract_placemark(Path::new("does/not/exist.jpg")).unwrap_err();
        assert!(matches!(err, ExtractionError::UnreadableFile(_)));
        assert_eq!(err.kind(), "UnreadableFile");
    }

    #[test]
    fn test_garbage_bytes_are_corrupt_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.jpg");
        std::fs::write(&path, b"this is not an image at all").unwrap();
        let err = extract_placemark(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::CorruptMetadata(_)));
    }

    #[test]
    fn test_image_without_exif_is_no_gps_tag() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.jpg");
        // Bare JPEG: SOI + EOI, no APP1 segment.
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        let err = extract_placemark(&path).unwrap_err();
        assert!(matches!(err, ExtractionError::NoGpsTag));
    }
}
