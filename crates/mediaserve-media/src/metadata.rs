// MediaServe - Content-Addressed Media Catalogue
// Copyright (C) 2025 MediaServe Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Best-effort media metadata extraction
//!
//! Extraction is an ordered chain of fallbacks: EXIF capture time, then
//! filesystem created-time, then modification time. Dimensions and GPS
//! coordinates come from the image header and EXIF block respectively.
//! Every step degrades to an absent field on failure; extraction itself
//! never fails, so a corrupt EXIF block cannot abort a scan.

use crate::detect::MediaKind;
use crate::error::{MediaError, Result};
use chrono::NaiveDateTime;
use exif::{In, Tag, Value};
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Metadata gathered for a single media file
///
/// Timestamps are seconds since the Unix epoch. Optional fields are absent
/// when the source (image header, EXIF block) is missing or unreadable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileMetadata {
    /// Filesystem modification time
    pub last_modified: f64,
    /// EXIF capture time, else filesystem created-time, else `last_modified`
    pub original_creation_date: f64,
    /// File size in bytes
    pub file_size: u64,
    /// Pixel width (images only)
    pub width: Option<u32>,
    /// Pixel height (images only)
    pub height: Option<u32>,
    /// GPS latitude in decimal degrees
    pub latitude: Option<f64>,
    /// GPS longitude in decimal degrees
    pub longitude: Option<f64>,
}

/// Extract metadata from a file on disk
///
/// Never returns an error: each field falls back independently, and a file
/// whose filesystem metadata is unreadable still yields a record stamped
/// with the current time.
pub fn extract(path: &Path, kind: MediaKind) -> FileMetadata {
    let now = now_secs();
    let mut meta = FileMetadata {
        last_modified: now,
        original_creation_date: now,
        ..FileMetadata::default()
    };

    match std::fs::metadata(path) {
        Ok(fs_meta) => {
            meta.file_size = fs_meta.len();
            if let Ok(modified) = fs_meta.modified() {
                meta.last_modified = systime_secs(modified);
            }
            // created() is unsupported on some filesystems; mtime stands in
            meta.original_creation_date = fs_meta
                .created()
                .ok()
                .map(systime_secs)
                .unwrap_or(meta.last_modified);
        }
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not stat file");
        }
    }

    if kind == MediaKind::Image {
        match probe_dimensions(path) {
            Ok((w, h)) => {
                meta.width = Some(w);
                meta.height = Some(h);
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "could not read image dimensions");
            }
        }

        match read_exif(path) {
            Ok(exif) => apply_exif(&mut meta, &exif),
            Err(e) => debug!(path = %path.display(), error = %e, "no EXIF block"),
        }
    }

    meta
}

/// Read image dimensions from the header without a full decode
fn probe_dimensions(path: &Path) -> Result<(u32, u32)> {
    image::image_dimensions(path).map_err(|e| MediaError::Image(e.to_string()))
}

/// Parse the EXIF block of a file on disk
fn read_exif(path: &Path) -> Result<exif::Exif> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    exif::Reader::new()
        .read_from_container(&mut reader)
        .map_err(|e| MediaError::Exif(e.to_string()))
}

/// Extract metadata from an in-memory buffer (upload path)
///
/// Timestamps default to the current time since there is no file on disk
/// yet; EXIF capture time still takes precedence when present.
pub fn extract_from_bytes(bytes: &[u8], kind: MediaKind) -> FileMetadata {
    let now = now_secs();
    let mut meta = FileMetadata {
        last_modified: now,
        original_creation_date: now,
        file_size: bytes.len() as u64,
        ..FileMetadata::default()
    };

    if kind == MediaKind::Image {
        if let Ok(reader) = image::ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
            if let Ok((w, h)) = reader.into_dimensions() {
                meta.width = Some(w);
                meta.height = Some(h);
            }
        }

        let mut cursor = Cursor::new(bytes);
        if let Ok(exif) = exif::Reader::new().read_from_container(&mut cursor) {
            apply_exif(&mut meta, &exif);
        }
    }

    meta
}

/// Fold EXIF capture time and GPS position into the metadata
fn apply_exif(meta: &mut FileMetadata, exif: &exif::Exif) {
    if let Some(field) = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY) {
        let raw = field.display_value().to_string();
        if let Some(ts) = parse_exif_datetime(&raw) {
            meta.original_creation_date = ts;
        } else {
            debug!(value = %raw, "unparsable EXIF DateTimeOriginal");
        }
    }

    if let Some((lat, lon)) = extract_gps(exif) {
        meta.latitude = Some(lat);
        meta.longitude = Some(lon);
    }
}

/// Parse an EXIF datetime string as UTC seconds since the epoch
///
/// EXIF datetimes carry no timezone; UTC is the fixed reference zone for
/// all calendar maths in the catalogue. Separators vary between writers,
/// so they are normalised before parsing.
fn parse_exif_datetime(s: &str) -> Option<f64> {
    let cleaned = s.replace(['-', '/'], ":");
    let dt = NaiveDateTime::parse_from_str(cleaned.trim(), "%Y:%m:%d %H:%M:%S").ok()?;
    Some(dt.and_utc().timestamp() as f64)
}

/// Extract GPS coordinates from EXIF as (latitude, longitude)
fn extract_gps(exif: &exif::Exif) -> Option<(f64, f64)> {
    let lat_field = exif.get_field(Tag::GPSLatitude, In::PRIMARY)?;
    let lon_field = exif.get_field(Tag::GPSLongitude, In::PRIMARY)?;

    let mut lat = dms_to_decimal(&lat_field.value)?;
    let mut lon = dms_to_decimal(&lon_field.value)?;

    // Hemisphere references flip the sign (S / W are negative)
    if let Some(ref_field) = exif.get_field(Tag::GPSLatitudeRef, In::PRIMARY) {
        let r = ref_field.value.display_as(Tag::GPSLatitudeRef).to_string();
        if r.trim().eq_ignore_ascii_case("S") {
            lat = -lat;
        }
    }
    if let Some(ref_field) = exif.get_field(Tag::GPSLongitudeRef, In::PRIMARY) {
        let r = ref_field.value.display_as(Tag::GPSLongitudeRef).to_string();
        if r.trim().eq_ignore_ascii_case("W") {
            lon = -lon;
        }
    }

    Some((lat, lon))
}

/// Convert an EXIF degrees/minutes/seconds rational triple to decimal degrees
///
/// Returns the unsigned magnitude; the caller applies the hemisphere sign.
fn dms_to_decimal(value: &Value) -> Option<f64> {
    if let Value::Rational(rats) = value {
        if rats.len() >= 3 && rats[0].denom != 0 && rats[1].denom != 0 && rats[2].denom != 0 {
            let degrees = rats[0].to_f64();
            let minutes = rats[1].to_f64();
            let seconds = rats[2].to_f64();
            return Some(degrees + minutes / 60.0 + seconds / 3600.0);
        }
    }
    None
}

fn now_secs() -> f64 {
    systime_secs(SystemTime::now())
}

fn systime_secs(t: SystemTime) -> f64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode png");
        buf
    }

    #[test]
    fn exif_datetime_parsing() {
        assert_eq!(
            parse_exif_datetime("2021:06:15 12:30:45"),
            Some(1623760245.0)
        );
        // Some writers use dashes
        assert_eq!(
            parse_exif_datetime("2021-06-15 12:30:45"),
            Some(1623760245.0)
        );
        assert_eq!(parse_exif_datetime("not a date"), None);
        assert_eq!(parse_exif_datetime(""), None);
    }

    #[test]
    fn dms_conversion() {
        let rats = Value::Rational(vec![
            exif::Rational { num: 52, denom: 1 },
            exif::Rational { num: 30, denom: 1 },
            exif::Rational { num: 0, denom: 1 },
        ]);
        let decimal = dms_to_decimal(&rats).expect("decimal");
        assert!((decimal - 52.5).abs() < 1e-9);
    }

    #[test]
    fn dms_rejects_zero_denominator() {
        let rats = Value::Rational(vec![
            exif::Rational { num: 52, denom: 0 },
            exif::Rational { num: 30, denom: 1 },
            exif::Rational { num: 0, denom: 1 },
        ]);
        assert_eq!(dms_to_decimal(&rats), None);
    }

    #[test]
    fn image_file_has_dimensions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pic.png");
        std::fs::write(&path, png_bytes(6, 4)).expect("write");

        let meta = extract(&path, MediaKind::Image);
        assert_eq!(meta.width, Some(6));
        assert_eq!(meta.height, Some(4));
        assert!(meta.last_modified > 0.0);
        assert!(meta.original_creation_date > 0.0);
        assert!(meta.file_size > 0);
        assert_eq!(meta.latitude, None);
        assert_eq!(meta.longitude, None);
    }

    #[test]
    fn video_skips_image_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"not really a video").expect("write");

        let meta = extract(&path, MediaKind::Video);
        assert_eq!(meta.width, None);
        assert_eq!(meta.height, None);
        assert!(meta.last_modified > 0.0);
    }

    #[test]
    fn corrupt_image_falls_back() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"\xFF\xD8 garbage").expect("write");

        // Extraction never fails; unreadable header just leaves dims absent
        let meta = extract(&path, MediaKind::Image);
        assert_eq!(meta.width, None);
        assert!(meta.last_modified > 0.0);
    }

    #[test]
    fn bytes_variant_reads_dimensions() {
        let meta = extract_from_bytes(&png_bytes(8, 2), MediaKind::Image);
        assert_eq!(meta.width, Some(8));
        assert_eq!(meta.height, Some(2));
        assert_eq!(meta.file_size as usize, png_bytes(8, 2).len());
    }
}
