//! Route handlers

use crate::api::types::{
    DownloadRequest, ErrorBody, HealthResponse, MessageResponse, ProgressResponse, VideoDetails,
};
use crate::api::AppState;
use crate::core::video_info::FormatSelector;
use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use tracing::debug;

/// Video metadata
#[utoipa::path(
    get,
    path = "/video/{id}",
    tag = "videos",
    params(("id" = String, Path, description = "Video ID or URL")),
    responses(
        (status = 200, description = "Metadata of the video", body = VideoDetails),
        (status = 400, description = "Invalid video ID", body = ErrorBody),
    )
)]
pub async fn video(
    State(service): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<VideoDetails>, ApiError> {
    let info = service.video_info(&video_id).await?;
    Ok(Json(VideoDetails::from(info)))
}

/// Start a download
///
/// Validates the payload, resolves metadata, then starts the job in the
/// background. Poll `/progress/{id}` for its state.
#[utoipa::path(
    post,
    path = "/download",
    tag = "downloads",
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "Download started", body = MessageResponse),
        (status = 400, description = "Invalid payload or video ID", body = ErrorBody),
    )
)]
pub async fn download(
    State(service): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        debug!("Rejected download payload: {}", rejection.body_text());
        ApiError::InvalidPayload(rejection.body_text())
    })?;

    if request.video_id.trim().is_empty() {
        return Err(ApiError::InvalidPayload("video_id is required".to_string()));
    }
    let selector = FormatSelector::for_request(request.audio_only, request.quality.as_deref());

    service.start_download(&request.video_id, selector).await?;

    Ok(Json(MessageResponse {
        message: "Download started".to_string(),
    }))
}

/// Progress of the latest download of a video
#[utoipa::path(
    get,
    path = "/progress/{id}",
    tag = "downloads",
    params(("id" = String, Path, description = "Video ID the download was started with")),
    responses(
        (status = 200, description = "Job snapshot", body = ProgressResponse),
        (status = 404, description = "No progress found for the given video ID", body = ErrorBody),
    )
)]
pub async fn progress(
    State(service): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let job = service.progress(&video_id)?;
    Ok(Json(ProgressResponse::from(job)))
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "service",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health(State(service): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        jobs: service.registry().len(),
    })
}
