//! # searchive-api
//!
//! HTTP surface and composition pieces for searchive: configuration,
//! session-based owner identity, the redemption guard and the axum router.

pub mod config;
pub mod error;
pub mod handlers;
pub mod redemption;
pub mod session;
pub mod startup;
pub mod state;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use config::AppConfig;
pub use error::ApiError;
pub use state::{AppState, Capabilities};

/// Request IDs are UUIDv7 so they sort by arrival time.
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router.
pub fn router(state: AppState, allowed_origins: Vec<HeaderValue>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/documents", get(handlers::list_documents))
        .route("/api/v1/documents/upload", post(handlers::upload_document))
        .route(
            "/api/v1/documents/:id",
            get(handlers::get_document).delete(handlers::delete_document),
        )
        .route(
            "/api/v1/documents/:id/download",
            get(handlers::download_document),
        )
        .route("/api/v1/documents/:id/tags", get(handlers::get_document_tags))
        .route("/api/v1/keywords/status", get(handlers::keyword_status))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(Duration::from_secs(3600)),
        )
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}
