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

//! Scan error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors that fail an entire scan pass
///
/// Per-file problems (unreadable file, corrupt metadata) are logged and
/// skipped inside the pass; only a root that cannot be read at all fails
/// the pass, in which case the previously published snapshot is retained.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The storage root does not exist or cannot be read
    #[error("storage root unavailable: {path}: {source}")]
    RootUnavailable {
        /// The configured storage root
        path: PathBuf,
        /// Underlying filesystem error
        source: std::io::Error,
    },

    /// The blocking scan task died before completing
    #[error("scan task failed: {0}")]
    TaskFailed(String),
}
