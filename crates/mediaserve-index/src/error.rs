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

//! Index error types

use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by catalogue operations
///
/// Read operations never error on absence; an unknown hash is `None`, an
/// empty filter result is an empty list. Errors are reserved for invalid
/// caller input and collaborator setup failures.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Date range query with start after end
    #[error("invalid date range: {start} is after {end}")]
    InvalidRange {
        /// Requested range start
        start: NaiveDate,
        /// Requested range end
        end: NaiveDate,
    },

    /// Cities reference file could not be loaded
    #[error("failed to load cities file: {0}")]
    CitiesLoad(String),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Check if this is an InvalidRange error
    pub fn is_invalid_range(&self) -> bool {
        matches!(self, IndexError::InvalidRange { .. })
    }
}
