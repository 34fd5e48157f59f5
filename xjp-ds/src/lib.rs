//! xjp-ds library - data service for the XJP56 site
//!
//! Persists the site document as one JSON file and stores uploaded media.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod error;
pub mod repository;
pub mod uploads;

pub use config::ServiceConfig;
pub use error::{ApiError, ApiResult};
pub use repository::DocumentRepository;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<DocumentRepository>,
    pub config: Arc<ServiceConfig>,
}

impl AppState {
    /// Open (or create) the document under the configured root folder
    pub async fn new(config: ServiceConfig) -> xjp_common::Result<Self> {
        let repository = DocumentRepository::open(config.root_folder()).await?;
        Ok(Self {
            repository: Arc::new(repository),
            config: Arc::new(config),
        })
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.config.uploads_dir());
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/data", get(api::get_data).post(api::post_data))
        .route("/upload", post(api::upload_image))
        .route("/upload-audio", post(api::upload_audio))
        .merge(api::health_routes())
        .nest_service("/uploads", uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
