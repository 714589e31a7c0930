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

//! Media type detection
//!
//! Candidates are recognized by the MIME type guessed from the file path.
//! Anything that is not `image/*` or `video/*` is not a media file and is
//! skipped silently by the scanner.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Broad classification of a media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// Still image (thumbnails and dimensions apply)
    Image,
    /// Video (hashed and catalogued, but not decoded)
    Video,
}

/// Classify a file path as image, video, or neither
pub fn detect(path: &Path) -> Option<MediaKind> {
    let mime = mime_guess::from_path(path).first()?;
    match mime.type_().as_str() {
        "image" => Some(MediaKind::Image),
        "video" => Some(MediaKind::Video),
        _ => None,
    }
}

/// Guess the full MIME type for a path, e.g. `image/jpeg`
pub fn mime_for(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
}
