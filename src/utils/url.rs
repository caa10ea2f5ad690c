//! Video identifier extraction and validation

use crate::error::ApiError;
use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static VIDEO_ID: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$"));

/// Check that `candidate` has the shape of a platform video ID
pub fn is_video_id(candidate: &str) -> Result<bool, ApiError> {
    match &*VIDEO_ID {
        Ok(pattern) => Ok(pattern.is_match(candidate)),
        Err(e) => Err(ApiError::Regex(e.clone())),
    }
}

/// Extract the video ID from a bare ID or any supported video URL
pub fn extract_video_id(input: &str) -> Result<String, ApiError> {
    let input = input.trim();
    if is_video_id(input)? {
        return Ok(input.to_string());
    }

    let invalid = || ApiError::InvalidIdentifier(input.to_string());
    let parsed = Url::parse(input).map_err(|_| invalid())?;

    let candidate = match parsed.host_str() {
        Some("youtu.be") => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        Some(host) if host == "youtube.com" || host.ends_with(".youtube.com") => {
            let mut segments = parsed.path_segments().into_iter().flatten();
            match segments.next() {
                Some("watch") => parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("shorts" | "embed" | "live" | "v") => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    };

    match candidate {
        Some(id) if is_video_id(&id)? => Ok(id),
        _ => Err(invalid()),
    }
}
