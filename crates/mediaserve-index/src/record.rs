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

//! The media record data model

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One catalogued media item, keyed by content hash
///
/// The hash is the sole identity: two records with the same hash describe
/// the same content and collapse into one entry. Records are immutable
/// once published into a snapshot; a rescan or upload replaces the entry
/// wholesale rather than mutating it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// SHA-256 content digest, 64 hex characters; primary key
    pub hash: String,
    /// Current on-disk base name
    pub filename: String,
    /// Name at first ingestion; set by the upload path from the client
    /// name, by the scanner from the on-disk name
    pub original_filename: String,
    /// Path relative to the storage root, `/`-separated
    pub file_path: String,
    /// Filesystem modification time, seconds since epoch
    pub last_modified: f64,
    /// EXIF capture time if present, else filesystem creation time;
    /// drives chronological ordering and date queries
    pub original_creation_date: f64,
    /// Pixel width (absent for non-image types)
    pub width: Option<u32>,
    /// Pixel height (absent for non-image types)
    pub height: Option<u32>,
    /// Key within the thumbnail store, `None` when no thumbnail exists
    pub thumbnail_path: Option<String>,
    /// GPS latitude in decimal degrees
    pub latitude: Option<f64>,
    /// GPS longitude in decimal degrees
    pub longitude: Option<f64>,
    /// Nearest city, derived from coordinates
    pub city: Option<String>,
    /// Country of the nearest city
    pub country: Option<String>,
    /// Guessed MIME type
    pub mime_type: Option<String>,
    /// File size in bytes
    pub file_size: u64,
}

impl MediaRecord {
    /// Capture time as a UTC datetime, when representable
    pub fn creation_datetime(&self) -> Option<DateTime<Utc>> {
        if !self.original_creation_date.is_finite() {
            return None;
        }
        Utc.timestamp_opt(self.original_creation_date as i64, 0).single()
    }

    /// UTC calendar day of the capture time; the unit of date queries
    pub fn creation_day(&self) -> Option<NaiveDate> {
        self.creation_datetime().map(|dt| dt.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(creation: f64) -> MediaRecord {
        MediaRecord {
            hash: "ab".repeat(32),
            filename: "photo.jpg".into(),
            original_filename: "photo.jpg".into(),
            file_path: "photo.jpg".into(),
            last_modified: creation,
            original_creation_date: creation,
            width: Some(640),
            height: Some(480),
            thumbnail_path: None,
            latitude: None,
            longitude: None,
            city: None,
            country: None,
            mime_type: Some("image/jpeg".into()),
            file_size: 1234,
        }
    }

    #[test]
    fn creation_day_is_utc() {
        // 2021-06-15 23:59:59 UTC
        let r = record(1623801599.0);
        assert_eq!(
            r.creation_day(),
            NaiveDate::from_ymd_opt(2021, 6, 15)
        );
        // One second later rolls over to the next day
        let r = record(1623801600.0);
        assert_eq!(
            r.creation_day(),
            NaiveDate::from_ymd_opt(2021, 6, 16)
        );
    }

    #[test]
    fn non_finite_creation_has_no_day() {
        assert_eq!(record(f64::NAN).creation_day(), None);
        assert_eq!(record(f64::INFINITY).creation_day(), None);
    }

    #[test]
    fn serializes_with_nullable_fields() {
        let json = serde_json::to_value(record(0.0)).expect("serialize");
        assert_eq!(json["hash"], serde_json::json!("ab".repeat(32)));
        assert_eq!(json["width"], serde_json::json!(640));
        assert!(json["thumbnail_path"].is_null());
        assert!(json["city"].is_null());
    }
}
