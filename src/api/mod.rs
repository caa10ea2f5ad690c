//! HTTP API
//!
//! | Method | Path             | Handler                |
//! |--------|------------------|------------------------|
//! | GET    | `/video/{id}`    | [`handlers::video`]    |
//! | POST   | `/download`      | [`handlers::download`] |
//! | GET    | `/progress/{id}` | [`handlers::progress`] |
//! | GET    | `/health`        | [`handlers::health`]   |
//!
//! The OpenAPI document is served at `/api-docs/openapi.json` and browsable
//! through Swagger UI at `/swagger-ui`.

pub mod handlers;
pub mod types;

pub use types::*;

use crate::core::service::Service;
use crate::error::ApiError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Shared handler state
pub type AppState = Arc<Service>;

pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

#[derive(OpenApi)]
#[openapi(
    info(title = "RYT API", description = "Video metadata lookup and tracked downloads"),
    paths(handlers::video, handlers::download, handlers::progress, handlers::health),
    tags(
        (name = "videos", description = "Video metadata"),
        (name = "downloads", description = "Background download jobs"),
        (name = "service", description = "Service status"),
    )
)]
pub struct ApiDoc;

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/video/{id}", get(handlers::video))
        .route("/download", post(handlers::download))
        .route("/progress/{id}", get(handlers::progress))
        .route("/health", get(handlers::health))
        .merge(SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "Invalid video ID".to_string()),
            ApiError::InvalidPayload(_) => {
                (StatusCode::BAD_REQUEST, "Invalid request payload".to_string())
            }
            ApiError::NoSuchJob(_) => (
                StatusCode::NOT_FOUND,
                "No progress found for the given video ID".to_string(),
            ),
            other => {
                error!("Request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
