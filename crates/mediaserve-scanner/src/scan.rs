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

//! Storage tree scanner
//!
//! A scan pass walks the storage root recursively and builds a complete
//! hash-keyed mapping covering every readable, recognized media file. The
//! pass is tolerant of partial failure: a file that cannot be hashed or
//! stat-ed is logged and skipped, and the pass still succeeds. Only an
//! unreadable root fails the pass as a whole.
//!
//! Duplicate content at different paths is a feature, not an error: the
//! candidate list is sorted so the lexicographically smallest relative
//! path is processed first and wins the map entry deterministically.

use crate::error::ScanError;
use mediaserve_index::{GeoLocator, MediaRecord};
use mediaserve_media::{detect, metadata, sha256_file, MediaError, MediaKind, ThumbnailStore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// One recognized media file found during the walk
#[derive(Debug)]
struct Candidate {
    abs_path: PathBuf,
    rel_path: String,
    kind: MediaKind,
}

/// Directory tree scanner producing catalogue snapshots
#[derive(Debug)]
pub struct Scanner {
    storage_root: PathBuf,
    thumbnails: Arc<ThumbnailStore>,
    geolocator: Option<Arc<GeoLocator>>,
}

impl Scanner {
    /// Create a scanner over `storage_root`
    ///
    /// The thumbnail store lives inside the storage root and is excluded
    /// from scanning; the geolocator is optional.
    pub fn new(
        storage_root: impl Into<PathBuf>,
        thumbnails: Arc<ThumbnailStore>,
        geolocator: Option<Arc<GeoLocator>>,
    ) -> Self {
        Self {
            storage_root: storage_root.into(),
            thumbnails,
            geolocator,
        }
    }

    /// The storage root this scanner walks
    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Run one complete scan pass (blocking)
    ///
    /// Performs file I/O and hashing; call from a blocking context or via
    /// [`Scanner::scan_off_thread`].
    pub fn scan(&self) -> Result<HashMap<String, MediaRecord>, ScanError> {
        let candidates = self.collect_candidates()?;
        info!(
            root = %self.storage_root.display(),
            candidates = candidates.len(),
            "scan pass started"
        );

        let mut snapshot: HashMap<String, MediaRecord> = HashMap::new();
        let mut skipped = 0usize;

        for candidate in candidates {
            match self.process_file(&candidate) {
                Ok(record) => {
                    if snapshot.contains_key(&record.hash) {
                        // Same content at another path; the first
                        // (smallest) path already owns the entry
                        debug!(path = %candidate.rel_path, hash = %record.hash, "duplicate content, keeping first path");
                    } else {
                        snapshot.insert(record.hash.clone(), record);
                    }
                }
                Err(e) => {
                    warn!(path = %candidate.rel_path, error = %e, "skipping unreadable file");
                    skipped += 1;
                }
            }
        }

        info!(
            items = snapshot.len(),
            skipped = skipped,
            "scan pass complete"
        );
        Ok(snapshot)
    }

    /// Run one scan pass on the blocking thread pool
    ///
    /// Index readers stay responsive while the pass hashes files.
    pub async fn scan_off_thread(
        self: Arc<Self>,
    ) -> Result<HashMap<String, MediaRecord>, ScanError> {
        tokio::task::spawn_blocking(move || self.scan())
            .await
            .map_err(|e| ScanError::TaskFailed(e.to_string()))?
    }

    /// Walk the tree and collect candidate media files, sorted by relative path
    fn collect_candidates(&self) -> Result<Vec<Candidate>, ScanError> {
        // An unreadable root fails the pass; everything below degrades
        // per-entry
        std::fs::read_dir(&self.storage_root).map_err(|source| ScanError::RootUnavailable {
            path: self.storage_root.clone(),
            source,
        })?;

        let thumb_root = self.thumbnails.root();
        let mut candidates = Vec::new();

        for entry in WalkDir::new(&self.storage_root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            let path = entry.path();
            if path.starts_with(thumb_root) {
                continue; // derived artifacts are not catalogue content
            }
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(kind) = detect::detect(path) else {
                debug!(path = %path.display(), "skipping non-media file");
                continue;
            };

            match self.relative_key(path) {
                Some(rel_path) => candidates.push(Candidate {
                    abs_path: path.to_path_buf(),
                    rel_path,
                    kind,
                }),
                None => warn!(path = %path.display(), "file outside storage root, skipping"),
            }
        }

        // Deterministic duplicate resolution: smallest relative path first
        candidates.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        Ok(candidates)
    }

    /// Hash, extract and enrich one file into a record
    fn process_file(&self, candidate: &Candidate) -> Result<MediaRecord, MediaError> {
        let abs_path = candidate.abs_path.as_path();
        let hash = sha256_file(abs_path)?;

        let meta = metadata::extract(abs_path, candidate.kind);

        let thumbnail_path = match candidate.kind {
            MediaKind::Image => self.thumbnails.generate_from_file(&hash, abs_path),
            MediaKind::Video => None,
        };

        let (city, country) = self.locate(meta.latitude, meta.longitude);

        let filename = abs_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| candidate.rel_path.clone());

        Ok(MediaRecord {
            hash,
            original_filename: filename.clone(),
            filename,
            file_path: candidate.rel_path.clone(),
            last_modified: meta.last_modified,
            original_creation_date: meta.original_creation_date,
            width: meta.width,
            height: meta.height,
            thumbnail_path,
            latitude: meta.latitude,
            longitude: meta.longitude,
            city,
            country,
            mime_type: detect::mime_for(abs_path),
            file_size: meta.file_size,
        })
    }

    /// Resolve coordinates to the nearest reference city, when possible
    fn locate(&self, latitude: Option<f64>, longitude: Option<f64>) -> (Option<String>, Option<String>) {
        let (Some(lat), Some(lon)) = (latitude, longitude) else {
            return (None, None);
        };
        let Some(geo) = &self.geolocator else {
            return (None, None);
        };
        match geo.nearest_city(lat, lon) {
            Some(city) => (Some(city.name.clone()), Some(city.country.clone())),
            None => (None, None),
        }
    }

    /// Storage-root-relative path with `/` separators
    fn relative_key(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.storage_root).ok()?;
        let parts: Vec<String> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }
}
