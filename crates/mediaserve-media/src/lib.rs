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

//! Leaf media utilities for MediaServe
//!
//! This crate provides:
//! - Streaming SHA-256 content hashing
//! - Media type detection (image/video) from file paths
//! - Best-effort metadata extraction (EXIF timestamps, dimensions, GPS)
//! - Content-addressed thumbnail generation and storage

pub mod detect;
pub mod error;
pub mod hash;
pub mod metadata;
pub mod thumbnail;

// Re-export commonly used types
pub use detect::MediaKind;
pub use error::{MediaError, Result};
pub use hash::{is_valid_hash, sha256_bytes, sha256_file};
pub use metadata::FileMetadata;
pub use thumbnail::ThumbnailStore;
