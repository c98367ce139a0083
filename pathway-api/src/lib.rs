//! pathway-api library: assessments, question import, leads and analytics
//!
//! The router is built here so integration tests can drive it in-process.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub mod analytics;
pub mod api;
pub mod db;
pub mod error;
pub mod uploads;

pub use error::{ApiError, ApiResult};
pub use uploads::{UploadStore, UPLOADS_URL_PREFIX};

/// Default request body limit, multipart uploads included
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub uploads: UploadStore,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: SqlitePool, uploads: UploadStore) -> Self {
        Self {
            db,
            uploads,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }
}

/// Build application router
///
/// Protected routes resolve the bearer token first; `/health`, signup, login,
/// the public assessment view, lead submission and `/uploads` do not.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/assessments",
            get(api::list_assessments).post(api::create_assessment),
        )
        .route("/api/assessments/:slug/import", post(api::import_questions))
        .route(
            "/api/assessments/id/:id",
            put(api::update_assessment).delete(api::delete_assessment),
        )
        .route(
            "/api/assessments/id/:id/duplicate",
            post(api::duplicate_assessment),
        )
        .route("/api/leads", get(api::list_leads))
        .route("/api/leads/export", get(api::export_leads))
        .route("/api/leads/:id/status", patch(api::update_lead_status))
        .route("/api/analytics", get(api::get_analytics))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/auth/signup", post(api::signup))
        .route("/api/auth/login", post(api::login))
        .route("/api/assessments/:slug", get(api::get_assessment))
        .route("/api/leads", post(api::submit_lead))
        .merge(api::health_routes());

    let uploads = ServeDir::new(state.uploads.root());
    let body_limit = state.max_upload_bytes;

    Router::new()
        .merge(protected)
        .merge(public)
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
