use std::sync::Arc;

use mediaserve_index::{GeoLocator, MediaIndex};
use mediaserve_media::ThumbnailStore;
use mediaserve_scanner::Scanner;

use crate::config::ServerConfig;

/// Shared application state
pub struct AppState {
    /// Effective server configuration
    pub config: ServerConfig,

    /// The one published catalogue snapshot holder
    pub index: Arc<MediaIndex>,

    /// Scanner over the configured storage root
    pub scanner: Arc<Scanner>,

    /// Content-addressed thumbnail store
    pub thumbnails: Arc<ThumbnailStore>,

    /// Optional reverse geocoder (present when a cities file is configured)
    pub geolocator: Option<Arc<GeoLocator>>,
}

impl AppState {
    /// Build the application state from configuration
    ///
    /// A configured-but-unloadable cities file degrades to no geocoding
    /// with a warning; everything else here is infallible wiring.
    pub fn new(config: ServerConfig) -> Self {
        let thumbnails = Arc::new(ThumbnailStore::new(
            config.thumbnail_dir(),
            config.thumbnail_size,
        ));

        let geolocator = config.cities_file.as_ref().and_then(|path| {
            match GeoLocator::from_csv(path) {
                Ok(geo) => Some(Arc::new(geo)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cities file unusable, location data disabled");
                    None
                }
            }
        });

        let scanner = Arc::new(Scanner::new(
            &config.storage_dir,
            Arc::clone(&thumbnails),
            geolocator.clone(),
        ));

        Self {
            config,
            index: Arc::new(MediaIndex::new()),
            scanner,
            thumbnails,
            geolocator,
        }
    }
}
