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

//! Reverse geocoding against a cities reference file
//!
//! The locator is an optional collaborator: when no cities file is
//! configured, records simply carry no city/country. The reference file is
//! CSV with a header row and `name,latitude,longitude,country` columns.

use crate::error::IndexError;
use std::path::Path;

/// Mean Earth radius in kilometers, for haversine distances
const EARTH_RADIUS_KM: f64 = 6371.0;

/// One reference city
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    /// City name
    pub name: String,
    /// Country name
    pub country: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

/// Nearest-city lookup over a loaded reference list
#[derive(Debug, Default)]
pub struct GeoLocator {
    cities: Vec<City>,
}

impl GeoLocator {
    /// Load the reference list from a CSV file
    ///
    /// Rows that fail to parse are skipped with a warning; an unreadable
    /// file is an error, since a configured-but-broken cities file should
    /// surface at startup rather than silently disable location data.
    pub fn from_csv(path: &Path) -> Result<Self, IndexError> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| IndexError::CitiesLoad(e.to_string()))?;

        let mut cities = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| IndexError::CitiesLoad(e.to_string()))?;
            match Self::parse_row(&row) {
                Some(city) => cities.push(city),
                None => {
                    tracing::warn!(row = ?row, "skipping malformed cities row");
                }
            }
        }

        tracing::info!(cities = cities.len(), path = %path.display(), "loaded cities file");
        Ok(Self { cities })
    }

    fn parse_row(row: &csv::StringRecord) -> Option<City> {
        Some(City {
            name: row.get(0)?.to_string(),
            latitude: row.get(1)?.trim().parse().ok()?,
            longitude: row.get(2)?.trim().parse().ok()?,
            country: row.get(3)?.to_string(),
        })
    }

    /// Number of loaded reference cities
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    /// Whether the reference list is empty
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// The reference city closest to the given coordinates
    pub fn nearest_city(&self, latitude: f64, longitude: f64) -> Option<&City> {
        self.cities.iter().min_by(|a, b| {
            let da = haversine_km(latitude, longitude, a.latitude, a.longitude);
            let db = haversine_km(latitude, longitude, b.latitude, b.longitude);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }
}

/// Great-circle distance between two coordinates in kilometers
fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1) = (lat1.to_radians(), lon1.to_radians());
    let (lat2, lon2) = (lat2.to_radians(), lon2.to_radians());

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
