//! rugdesk-photos library interface
//!
//! Photo upload pipeline, object storage and the HTTP surface over the
//! dimension engine. Exposed as a library for integration testing.

pub mod api;
pub mod compression;
pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod storage;
pub mod upload;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::compression::compressor_from_config;
use crate::config::ServiceConfig;
use crate::storage::LocalObjectStore;
use crate::upload::PhotoUploader;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub uploader: Arc<PhotoUploader>,
    /// Local store backing signed downloads
    pub store: Arc<LocalObjectStore>,
    /// TTL for signed URLs when the caller names none
    pub default_ttl: Duration,
    /// Cancelled on shutdown; uploads stop before their next batch
    pub shutdown: CancellationToken,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last upload failure for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(uploader: PhotoUploader, store: Arc<LocalObjectStore>, default_ttl: Duration) -> Self {
        Self {
            uploader: Arc::new(uploader),
            store,
            default_ttl,
            shutdown: CancellationToken::new(),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Wire the local store, compressor and uploader from resolved settings
    pub fn from_config(config: &ServiceConfig) -> Self {
        let store = Arc::new(LocalObjectStore::new(
            config.objects_dir(),
            config.public_base_url.clone(),
            config.signing_secret.clone(),
        ));
        let compressor = compressor_from_config(&config.toml.compression);
        let uploader = PhotoUploader::from_config(store.clone(), compressor, &config.toml.upload);

        Self::new(uploader, store, config.default_ttl)
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::dimension_routes())
        .merge(api::photo_routes())
        .merge(api::object_routes())
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
