use std::sync::Arc;

use libris_core::{Authenticator, Config, LibraryService, SanitizedConfig, ThumbnailGenerator};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    library: Arc<LibraryService>,
    thumbnails: Arc<ThumbnailGenerator>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        library: Arc<LibraryService>,
        thumbnails: Arc<ThumbnailGenerator>,
    ) -> Self {
        Self {
            config,
            authenticator,
            library,
            thumbnails,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Authenticator guarding the storage-event and maintenance routes.
    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn library(&self) -> &LibraryService {
        &self.library
    }

    pub fn thumbnails(&self) -> &ThumbnailGenerator {
        &self.thumbnails
    }

    /// Whether storage events are handled by this process.
    pub fn thumbnail_events_enabled(&self) -> bool {
        self.config.thumbnails.enabled
    }
}
