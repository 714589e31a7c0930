use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use chrono::NaiveDate;
use mediaserve_index::{IndexError, MediaRecord};
use mediaserve_media::is_valid_hash;
use serde_json::json;
use std::sync::Arc;

use crate::state::AppState;
use crate::upload::{self, UploadError};

/// Structured API error mapped to an HTTP status and JSON body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Newest-first presentation order for filtered listings
fn sort_newest_first(records: &mut [MediaRecord]) {
    records.sort_by(|a, b| {
        b.original_creation_date
            .partial_cmp(&a.original_creation_date)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("invalid date '{raw}', expected YYYY-MM-DD")))
}

/// GET /list - the full catalogue as a JSON object keyed by hash
pub async fn list_all(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.index.get_all().await;
    tracing::info!("GET /list ({} items)", snapshot.len());

    let body = serde_json::to_value(snapshot.as_ref())
        .map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(body))
}

/// GET /list/date/:date - items captured on one UTC calendar day
pub async fn list_by_date(
    Path(date): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaRecord>>, ApiError> {
    let day = parse_date(&date)?;
    let mut records = state.index.get_by_date(day).await;
    sort_newest_first(&mut records);

    tracing::info!("GET /list/date/{} ({} items)", date, records.len());
    Ok(Json(records))
}

/// GET /list/daterange/:start/:end - items captured within [start, end]
pub async fn list_by_date_range(
    Path((start, end)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaRecord>>, ApiError> {
    let start_day = parse_date(&start)?;
    let end_day = parse_date(&end)?;

    let mut records = state
        .index
        .get_by_date_range(start_day, end_day)
        .await
        .map_err(|e| match e {
            IndexError::InvalidRange { .. } => ApiError::bad_request(e.to_string()),
            other => ApiError::internal(other.to_string()),
        })?;
    sort_newest_first(&mut records);

    tracing::info!(
        "GET /list/daterange/{}/{} ({} items)",
        start,
        end,
        records.len()
    );
    Ok(Json(records))
}

/// GET /list/location/:city - items located in a city
pub async fn list_by_location(
    Path(city): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaRecord>>, ApiError> {
    let mut records = state.index.get_by_location(&city, None).await;
    sort_newest_first(&mut records);

    tracing::info!("GET /list/location/{} ({} items)", city, records.len());
    Ok(Json(records))
}

/// GET /list/location/:city/:country - items located in a city and country
pub async fn list_by_location_country(
    Path((city, country)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MediaRecord>>, ApiError> {
    let mut records = state.index.get_by_location(&city, Some(&country)).await;
    sort_newest_first(&mut records);

    tracing::info!(
        "GET /list/location/{}/{} ({} items)",
        city,
        country,
        records.len()
    );
    Ok(Json(records))
}

/// PUT /image/:filename - upload new file bytes
pub async fn put_image(
    Path(filename): Path<String>,
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    tracing::info!("PUT /image/{} ({} bytes)", filename, body.len());

    match upload::store_upload(&state, &filename, body).await {
        Ok(outcome) if outcome.created => Ok((
            StatusCode::CREATED,
            Json(json!({
                "message": "image uploaded and processed",
                "record": outcome.record,
            })),
        )
            .into_response()),
        Ok(outcome) => Ok((
            StatusCode::OK,
            Json(json!({
                "message": "image content already exists",
                "record": outcome.record,
            })),
        )
            .into_response()),
        Err(e @ (UploadError::EmptyFile | UploadError::InvalidFileType(_))) => {
            Err(ApiError::bad_request(e.to_string()))
        }
        Err(e) => {
            tracing::error!("upload of '{}' failed: {}", filename, e);
            Err(ApiError::internal(e.to_string()))
        }
    }
}

/// GET /image/:sha256 - raw bytes of the original file for a hash
pub async fn get_image(
    Path(reference): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let record = lookup_record(&state, &reference).await?;

    let rel = std::path::Path::new(&record.file_path);
    if rel
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(ApiError::bad_request("invalid stored file path"));
    }

    let abs = state.config.storage_dir.join(rel);
    match tokio::fs::read(&abs).await {
        Ok(bytes) => {
            let content_type = record
                .mime_type
                .clone()
                .unwrap_or_else(|| "application/octet-stream".to_string());
            Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("file for hash {} missing on disk: {}", reference, e);
            Err(ApiError::not_found("file missing on disk"))
        }
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

/// GET /thumbnail/:sha256 - PNG thumbnail for a hash
pub async fn get_thumbnail(
    Path(reference): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let record = lookup_record(&state, &reference).await?;

    let key = record
        .thumbnail_path
        .as_deref()
        .ok_or_else(|| ApiError::not_found("no thumbnail for this item"))?;

    match tokio::fs::read(state.thumbnails.path_for_key(key)).await {
        Ok(bytes) => Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("thumbnail {} missing on disk: {}", key, e);
            Err(ApiError::not_found("thumbnail missing on disk"))
        }
        Err(e) => Err(ApiError::internal(e.to_string())),
    }
}

/// GET /healthz - liveness probe with the current item count
pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "items": state.index.len().await,
    }))
}

/// Validate a hash reference and resolve it in the current snapshot
///
/// A malformed digest is always a 400, never a 404: the two are distinct
/// caller mistakes.
async fn lookup_record(state: &AppState, reference: &str) -> Result<MediaRecord, ApiError> {
    if !is_valid_hash(reference) {
        return Err(ApiError::bad_request(
            "malformed hash, expected 64 hex characters",
        ));
    }
    state
        .index
        .get(reference)
        .await
        .ok_or_else(|| ApiError::not_found("unknown content hash"))
}
