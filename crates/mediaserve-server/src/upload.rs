//! Upload ingestion path
//!
//! Uploads converge on the same identity invariant as the scanner: the
//! content hash. Known content short-circuits before any disk write; new
//! content is written under a dated upload directory with a
//! collision-safe name, enriched, and merged into the index as a single
//! record. The uploaded file is on disk before the merge, so the next
//! scan pass rediscovers it naturally.

use bytes::Bytes;
use chrono::Utc;
use mediaserve_index::MediaRecord;
use mediaserve_media::{detect, metadata, sha256_bytes, MediaKind};
use std::io;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info};

use crate::state::AppState;

/// Upload failures
///
/// `EmptyFile` and `InvalidFileType` are caller errors; `Storage` is the
/// only server-side fault.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Request carried no file bytes
    #[error("empty or missing file body")]
    EmptyFile,

    /// Extension not on the upload allow-list
    #[error("invalid file type for '{0}'")]
    InvalidFileType(String),

    /// Disk write failed (full disk, permissions)
    #[error("failed to store upload: {0}")]
    Storage(#[from] io::Error),
}

/// Result of a processed upload
#[derive(Debug)]
pub struct UploadOutcome {
    /// The new or pre-existing record
    pub record: MediaRecord,
    /// True when new content was written; false on a dedup hit
    pub created: bool,
}

/// Accept raw upload bytes and merge the resulting record into the index
pub async fn store_upload(
    state: &AppState,
    suggested_name: &str,
    body: Bytes,
) -> Result<UploadOutcome, UploadError> {
    if body.is_empty() {
        return Err(UploadError::EmptyFile);
    }

    let hash = sha256_bytes(&body);

    // Dedup hit: no disk write, no thumbnail work
    if let Some(existing) = state.index.get(&hash).await {
        info!(hash = %hash, path = %existing.file_path, "upload content already known");
        return Ok(UploadOutcome {
            record: existing,
            created: false,
        });
    }

    let (stem, extension) = sanitized_parts(suggested_name);
    let extension = match extension {
        Some(ext) if state.config.extension_allowed(&ext) => ext,
        _ => return Err(UploadError::InvalidFileType(suggested_name.to_string())),
    };

    // Destination directory is keyed by the upload date
    let rel_dir = format!("uploads/{}", Utc::now().format("%Y%m%d"));
    let abs_dir = state.config.storage_dir.join(&rel_dir);
    fs::create_dir_all(&abs_dir).await?;

    // Distinct content under an already-taken name gets a numeric
    // suffix; hash identity is untouched by the rename
    let mut final_name = format!("{stem}.{extension}");
    let mut counter = 0u32;
    while fs::try_exists(abs_dir.join(&final_name)).await? {
        counter += 1;
        final_name = format!("{stem}_{counter}.{extension}");
    }

    let abs_path = abs_dir.join(&final_name);
    write_atomic(&abs_path, &body).await?;
    info!(hash = %hash, path = %abs_path.display(), "stored upload");

    // Metadata extraction and thumbnail generation are CPU/disk work;
    // keep them off the request workers
    let meta_hash = hash.clone();
    let meta_bytes = body.clone();
    let thumbnails = Arc::clone(&state.thumbnails);
    let kind = detect::detect(Path::new(&final_name)).unwrap_or(MediaKind::Image);
    let (meta, thumbnail_path) = tokio::task::spawn_blocking(move || {
        let meta = metadata::extract_from_bytes(&meta_bytes, kind);
        let thumb = match kind {
            MediaKind::Image => thumbnails.generate(&meta_hash, &meta_bytes),
            MediaKind::Video => None,
        };
        (meta, thumb)
    })
    .await
    .map_err(|e| UploadError::Storage(io::Error::other(e)))?;

    let (city, country) = match (&state.geolocator, meta.latitude, meta.longitude) {
        (Some(geo), Some(lat), Some(lon)) => match geo.nearest_city(lat, lon) {
            Some(city) => (Some(city.name.clone()), Some(city.country.clone())),
            None => (None, None),
        },
        _ => (None, None),
    };

    let record = MediaRecord {
        hash,
        filename: final_name.clone(),
        original_filename: suggested_name.to_string(),
        file_path: format!("{rel_dir}/{final_name}"),
        last_modified: meta.last_modified,
        original_creation_date: meta.original_creation_date,
        width: meta.width,
        height: meta.height,
        thumbnail_path,
        latitude: meta.latitude,
        longitude: meta.longitude,
        city,
        country,
        mime_type: detect::mime_for(Path::new(&final_name)),
        file_size: body.len() as u64,
    };

    state.index.merge_one(record.clone()).await;
    debug!(hash = %record.hash, "upload merged into index");

    Ok(UploadOutcome {
        record,
        created: true,
    })
}

/// Split a client-supplied name into a safe stem and lowercase extension
///
/// Path separators are stripped by keeping only the final component,
/// leading dots are removed, and anything outside `[A-Za-z0-9._-]`
/// becomes `_`. An unusable stem falls back to `upload`.
fn sanitized_parts(name: &str) -> (String, Option<String>) {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let base = base.trim_start_matches('.');

    let (stem, extension) = match base.rfind('.') {
        Some(idx) if idx > 0 => (&base[..idx], Some(base[idx + 1..].to_ascii_lowercase())),
        _ => (base, None),
    };

    let mut clean: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if clean.is_empty() {
        clean = "upload".to_string();
    }

    (clean, extension)
}

/// Write via temp file + rename; partially written uploads are never visible
async fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, data).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitization_strips_path_components() {
        assert_eq!(
            sanitized_parts("../../etc/passwd.png"),
            ("passwd".to_string(), Some("png".to_string()))
        );
        assert_eq!(
            sanitized_parts("C:\\photos\\holiday.JPG"),
            ("holiday".to_string(), Some("jpg".to_string()))
        );
    }

    #[test]
    fn sanitization_replaces_unsafe_chars() {
        assert_eq!(
            sanitized_parts("my photo (1).png"),
            ("my_photo__1_".to_string(), Some("png".to_string()))
        );
    }

    #[test]
    fn hidden_and_extensionless_names() {
        assert_eq!(sanitized_parts("no_extension"), ("no_extension".to_string(), None));
        // Leading dots are stripped; ".png" has no stem left, so no extension
        assert_eq!(sanitized_parts(".png"), ("png".to_string(), None));
        assert_eq!(sanitized_parts(""), ("upload".to_string(), None));
    }
}
