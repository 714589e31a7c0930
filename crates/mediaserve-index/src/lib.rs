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

//! In-memory media catalogue for MediaServe
//!
//! This crate provides:
//! - The `MediaRecord` data model (hash-keyed, immutable once published)
//! - The `MediaIndex` snapshot holder with single-writer/multi-reader
//!   discipline and atomic snapshot swap
//! - Date, date-range and location query operations
//! - The optional `GeoLocator` mapping coordinates to the nearest city

pub mod error;
pub mod geo;
pub mod index;
pub mod record;

// Re-export commonly used types
pub use error::IndexError;
pub use geo::{City, GeoLocator};
pub use index::{MediaIndex, Snapshot};
pub use record::MediaRecord;
