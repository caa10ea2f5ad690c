//! Error types for ryt-api

use thiserror::Error;

/// Main error type for ryt-api operations
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid video identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Invalid request payload: {0}")]
    InvalidPayload(String),

    #[error("No job registered for video {0}")]
    NoSuchJob(String),

    #[error("Job for video {0} was replaced by a newer download")]
    JobSuperseded(String),

    #[error("Download failed: {0}")]
    RunnerFailure(String),

    #[error("Video is geo-blocked")]
    GeoBlocked,

    #[error("Rate limited")]
    RateLimited,

    #[error("Age restricted")]
    AgeRestricted,

    #[error("Private video")]
    Private,

    #[error("Video unavailable")]
    VideoUnavailable,

    #[error("No suitable format found")]
    NoFormatFound,

    #[error("Format itag={0} requires signature deciphering")]
    FormatRequiresDecipher(u32),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Timeout error: {0}")]
    Timeout(String),
}

impl ApiError {
    /// Check if a metadata request failing with this error may be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Http(err) => {
                err.is_timeout()
                    || err.is_connect()
                    || err.status().map_or(false, |status| status.is_server_error())
            }
            ApiError::Timeout(_) | ApiError::RateLimited => true,
            _ => false,
        }
    }

    /// Check if the error was reported by the video platform itself
    pub fn is_platform_error(&self) -> bool {
        matches!(
            self,
            ApiError::GeoBlocked
                | ApiError::RateLimited
                | ApiError::AgeRestricted
                | ApiError::Private
                | ApiError::VideoUnavailable
        )
    }
}

/// Result type alias for ryt-api operations
pub type Result<T> = std::result::Result<T, ApiError>;
