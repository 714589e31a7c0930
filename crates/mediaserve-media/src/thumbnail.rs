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

//! Content-addressed thumbnail store
//!
//! Thumbnails are keyed by the content hash of the original file and
//! stored as fixed-size PNGs, sharded by the first two hex characters to
//! bound directory fan-out:
//!
//! ```text
//! thumbnails/
//!   ab/
//!     abcd1234....png
//! ```
//!
//! Generation is best-effort: non-image or undecodable input yields "no
//! thumbnail", which is an expected outcome rather than an error. Writes
//! go through a temp file and an atomic rename so concurrent writers for
//! distinct hashes never expose partial files.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fixed-size PNG thumbnail store keyed by content hash
#[derive(Debug, Clone)]
pub struct ThumbnailStore {
    root: PathBuf,
    target_size: u32,
}

impl ThumbnailStore {
    /// Create a store rooted at `root` producing `target_size` bounding-box thumbnails
    pub fn new<P: Into<PathBuf>>(root: P, target_size: u32) -> Self {
        Self {
            root: root.into(),
            target_size,
        }
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bounding-box edge length of generated thumbnails
    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    /// Store-relative key for a hash, e.g. `ab/abcd....png`
    pub fn key_for(hash: &str) -> String {
        let shard = hash.get(0..2).unwrap_or(hash);
        format!("{}/{}.png", shard, hash)
    }

    /// Absolute path for a store-relative key
    pub fn path_for_key(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Generate (or reuse) the thumbnail for `hash` from encoded image bytes
    ///
    /// Returns the store-relative key on success, `None` when the input
    /// cannot be decoded or the write fails. Generation is skipped when
    /// the thumbnail already exists: the store is content-addressed, so an
    /// existing entry is always current.
    pub fn generate(&self, hash: &str, bytes: &[u8]) -> Option<String> {
        let key = Self::key_for(hash);
        let path = self.path_for_key(&key);
        if path.exists() {
            return Some(key);
        }

        let img = match image::load_from_memory(bytes) {
            Ok(img) => img,
            Err(e) => {
                debug!(hash = %hash, error = %e, "input not decodable, no thumbnail");
                return None;
            }
        };

        // Aspect-preserving fit into a target_size square
        let thumb = img.thumbnail(self.target_size, self.target_size);

        let mut encoded = Vec::new();
        if let Err(e) = thumb.write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png) {
            debug!(hash = %hash, error = %e, "thumbnail encode failed");
            return None;
        }

        match self.write_atomic(&path, &encoded) {
            Ok(()) => Some(key),
            Err(e) => {
                debug!(hash = %hash, error = %e, "thumbnail write failed");
                None
            }
        }
    }

    /// Generate the thumbnail for `hash` by reading the original from disk
    pub fn generate_from_file(&self, hash: &str, path: &Path) -> Option<String> {
        // Skip the read entirely when the thumbnail is already present
        let key = Self::key_for(hash);
        if self.path_for_key(&key).exists() {
            return Some(key);
        }

        match fs::read(path) {
            Ok(bytes) => self.generate(hash, &bytes),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "could not read file for thumbnail");
                None
            }
        }
    }

    /// Read thumbnail bytes for a store-relative key
    pub fn read(&self, key: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_for_key(key))
    }

    /// Write via temp file + rename so readers never observe a partial PNG
    fn write_atomic(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, data)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([200, 100, 50])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .expect("encode png");
        buf
    }

    const HASH: &str = "aabbccddaabbccddaabbccddaabbccddaabbccddaabbccddaabbccddaabbccdd";

    #[test]
    fn key_sharding() {
        assert_eq!(
            ThumbnailStore::key_for(HASH),
            format!("aa/{}.png", HASH)
        );
    }

    #[test]
    fn generates_bounded_png() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ThumbnailStore::new(dir.path(), 16);

        let key = store.generate(HASH, &png_bytes(64, 32)).expect("thumbnail");
        assert_eq!(key, format!("aa/{}.png", HASH));

        let bytes = store.read(&key).expect("read back");
        let thumb = image::load_from_memory(&bytes).expect("valid png");
        let (w, h) = thumb.dimensions();
        assert!(w <= 16 && h <= 16);
        // Aspect ratio preserved: 64x32 fits as 16x8
        assert_eq!((w, h), (16, 8));
    }

    #[test]
    fn undecodable_input_yields_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ThumbnailStore::new(dir.path(), 16);

        assert_eq!(store.generate(HASH, b"definitely not an image"), None);
        assert_eq!(store.generate(HASH, b""), None);
    }

    #[test]
    fn existing_thumbnail_reused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ThumbnailStore::new(dir.path(), 16);

        let key = store.generate(HASH, &png_bytes(8, 8)).expect("first");
        let before = store.read(&key).expect("read");

        // Second call with different (even invalid) bytes must not rewrite
        let again = store.generate(HASH, b"garbage").expect("reused");
        assert_eq!(again, key);
        assert_eq!(store.read(&key).expect("read"), before);
    }

    #[test]
    fn from_file_missing_original() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ThumbnailStore::new(dir.path().join("thumbs"), 16);
        assert_eq!(
            store.generate_from_file(HASH, &dir.path().join("gone.png")),
            None
        );
    }

    #[test]
    fn no_partial_files_left_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ThumbnailStore::new(dir.path(), 16);
        store.generate(HASH, &png_bytes(4, 4)).expect("thumbnail");

        let shard_dir = dir.path().join("aa");
        let leftovers: Vec<_> = fs::read_dir(shard_dir)
            .expect("shard dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|x| x == "tmp").unwrap_or(false))
            .collect();
        assert!(leftovers.is_empty());
    }
}
