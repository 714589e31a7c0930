// Library exports for mediaserve-server
// This allows integration tests to use server components

pub mod config;
pub mod handlers;
pub mod state;
pub mod upload;

pub use config::ServerConfig;
pub use state::AppState;
pub use upload::{store_upload, UploadError, UploadOutcome};

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the axum router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/list", get(handlers::list_all))
        .route("/list/date/:date", get(handlers::list_by_date))
        .route(
            "/list/daterange/:start/:end",
            get(handlers::list_by_date_range),
        )
        .route("/list/location/:city", get(handlers::list_by_location))
        .route(
            "/list/location/:city/:country",
            get(handlers::list_by_location_country),
        )
        // One path, two meanings: GET resolves a content hash, PUT
        // ingests a new file under the given name
        .route(
            "/image/:reference",
            get(handlers::get_image).put(handlers::put_image),
        )
        .route("/thumbnail/:hash", get(handlers::get_thumbnail))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        // Body size limit (512MB, uploads are single images but the
        // default 2MB limit is far too small)
        .layer(DefaultBodyLimit::max(512 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
}
