//! Request and response bodies

use crate::core::job::{Job, JobState};
use crate::core::progress::format_duration;
use crate::core::video_info::{Format, Thumbnail, VideoInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /download`
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DownloadRequest {
    #[schema(example = "dQw4w9WgXcQ")]
    pub video_id: String,
    #[serde(default)]
    pub audio_only: bool,
    /// `best`, `worst`, `720p`, `1080p60`, `height<=480`, `itag=18`, ...;
    /// anything else means `best`
    #[serde(default)]
    pub quality: Option<String>,
}

/// Metadata record returned by `GET /video/{id}`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VideoDetails {
    pub title: String,
    pub author: String,
    /// Compact duration such as `2h45m`
    #[schema(example = "3m33s")]
    pub duration: String,
    pub thumbnails: Vec<Thumbnail>,
    pub formats: Vec<Format>,
}

impl From<VideoInfo> for VideoDetails {
    fn from(info: VideoInfo) -> Self {
        Self {
            duration: format_duration(info.duration()),
            title: info.title,
            author: info.author,
            thumbnails: info.thumbnails,
            formats: info.formats,
        }
    }
}

/// Job snapshot returned by `GET /progress/{id}`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProgressResponse {
    #[serde(rename = "videoID")]
    pub video_id: String,
    pub progress: u8,
    pub completed: bool,
    pub error: Option<String>,
    pub state: JobState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<Job> for ProgressResponse {
    fn from(job: Job) -> Self {
        Self {
            state: job.state(),
            video_id: job.video_id,
            progress: job.progress,
            completed: job.completed,
            error: job.error,
            started_at: job.started_at,
            finished_at: job.finished_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(value_type = String, example = "ok")]
    pub status: &'static str,
    pub jobs: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}
