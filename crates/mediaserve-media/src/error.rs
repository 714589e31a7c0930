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

//! Error types for media processing operations

use thiserror::Error;

/// Media processing errors
#[derive(Debug, Error)]
pub enum MediaError {
    /// Image decoding or encoding error
    #[error("image processing error: {0}")]
    Image(String),

    /// EXIF parsing error
    #[error("EXIF parsing error: {0}")]
    Exif(String),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for media operations
pub type Result<T> = std::result::Result<T, MediaError>;
