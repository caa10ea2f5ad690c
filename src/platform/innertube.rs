//! InnerTube API client: the video metadata source

use crate::core::video_info::{Format, Thumbnail, VideoInfo};
use crate::error::ApiError;
use crate::platform::client::VideoClient;
use crate::platform::MetadataSource;
use crate::utils::url::extract_video_id;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

/// InnerTube API client
#[derive(Debug, Clone)]
pub struct InnerTubeClient {
    http_client: VideoClient,
    base_url: String,
    client_name: String,
    client_version: String,
}

impl InnerTubeClient {
    pub fn new(http_client: VideoClient) -> Self {
        Self {
            http_client,
            base_url: DEFAULT_BASE_URL.to_string(),
            client_name: "ANDROID".to_string(), // ANDROID gives direct URLs
            client_version: "20.10.38".to_string(),
        }
    }

    /// Point the client at another host (used by tests)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_client(mut self, name: &str, version: &str) -> Self {
        self.client_name = name.to_string();
        self.client_version = version.to_string();
        self
    }

    /// Get player response for a video
    pub async fn get_player_response(&self, video_id: &str) -> Result<PlayerResponse, ApiError> {
        info!("Fetching player response for video ID: {}", video_id);

        let request_body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": self.client_name,
                    "clientVersion": self.client_version,
                    "androidSdkVersion": 30,
                    "osName": "Android",
                    "osVersion": "11",
                    "hl": "en",
                    "gl": "US"
                }
            },
            "videoId": video_id,
            "contentCheckOk": true,
            "racyCheckOk": true
        });

        let url = format!("{}/youtubei/v1/player?prettyPrint=false", self.base_url);
        debug!("Request URL: {}", url);

        let request = self
            .http_client
            .create_innertube_request(&url, &self.client_name, &self.client_version)
            .json(&request_body);
        let response: PlayerResponse = self.http_client.execute_json(request).await?;

        response.check_playability()?;
        Ok(response)
    }
}

#[async_trait]
impl MetadataSource for InnerTubeClient {
    async fn video_info(&self, identifier: &str) -> Result<VideoInfo, ApiError> {
        let video_id = extract_video_id(identifier)?;
        let response = self.get_player_response(&video_id).await?;
        response.into_video_info(&video_id)
    }
}

/// Player response from InnerTube API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub playability_status: Option<PlayabilityStatus>,
    pub video_details: Option<VideoDetails>,
    pub streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
pub struct PlayabilityStatus {
    pub status: String,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub author: String,
    pub length_seconds: String,
    #[serde(default)]
    pub short_description: String,
    pub thumbnail: Option<ThumbnailList>,
}

#[derive(Debug, Deserialize)]
pub struct ThumbnailList {
    pub thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    #[serde(default)]
    pub formats: Vec<FormatData>,
    #[serde(default)]
    pub adaptive_formats: Vec<FormatData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatData {
    pub itag: u32,
    pub url: Option<String>,
    pub mime_type: String,
    pub bitrate: Option<u32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality_label: Option<String>,
    pub content_length: Option<String>,
    pub signature_cipher: Option<String>,
    pub fps: Option<u32>,
    pub audio_sample_rate: Option<String>,
    pub audio_channels: Option<u32>,
}

impl FormatData {
    fn into_format(self) -> Format {
        let (video_codec, audio_codec) = split_codecs(&self.mime_type);
        Format {
            itag: self.itag,
            url: self.url.unwrap_or_default(),
            quality: self.quality_label.unwrap_or_default(),
            bitrate: self.bitrate.unwrap_or(0),
            size: self.content_length.and_then(|s| s.parse().ok()),
            signature_cipher: self.signature_cipher,
            audio_codec,
            video_codec,
            fps: self.fps,
            width: self.width,
            height: self.height,
            audio_sample_rate: self.audio_sample_rate.and_then(|s| s.parse().ok()),
            audio_channels: self.audio_channels,
            mime_type: self.mime_type,
        }
    }
}

/// Split `video/mp4; codecs="avc1.42001E, mp4a.40.2"` into (video, audio) codecs
fn split_codecs(mime_type: &str) -> (Option<String>, Option<String>) {
    let codecs: Vec<String> = mime_type
        .split_once("codecs=")
        .map(|(_, list)| {
            list.trim_matches('"')
                .split(',')
                .map(|c| c.trim().trim_matches('"').to_string())
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if mime_type.starts_with("audio/") {
        return (None, codecs.into_iter().next());
    }

    let mut iter = codecs.into_iter();
    (iter.next(), iter.next())
}

impl PlayerResponse {
    /// Map the playability status onto the error taxonomy
    pub fn check_playability(&self) -> Result<(), ApiError> {
        let Some(status) = &self.playability_status else {
            return Ok(());
        };
        let reason = status.reason.as_deref().unwrap_or_default().to_lowercase();

        match status.status.as_str() {
            "OK" | "LIVE_STREAM_OFFLINE" => Ok(()),
            "LOGIN_REQUIRED" if reason.contains("private") => Err(ApiError::Private),
            "LOGIN_REQUIRED" => Err(ApiError::AgeRestricted),
            "UNPLAYABLE" if reason.contains("private") => Err(ApiError::Private),
            "ERROR" | "UNPLAYABLE"
                if reason.contains("geograph") || reason.contains("available in your country") =>
            {
                Err(ApiError::GeoBlocked)
            }
            other => {
                warn!("Video playability {}: {}", other, reason);
                Err(ApiError::VideoUnavailable)
            }
        }
    }

    /// Parse progressive and adaptive formats
    pub fn parse_formats(&mut self) -> Vec<Format> {
        let Some(streaming_data) = self.streaming_data.take() else {
            return Vec::new();
        };

        streaming_data
            .formats
            .into_iter()
            .chain(streaming_data.adaptive_formats)
            .map(FormatData::into_format)
            .collect()
    }

    pub fn into_video_info(mut self, video_id: &str) -> Result<VideoInfo, ApiError> {
        let formats = self.parse_formats();
        let details = self.video_details.ok_or(ApiError::VideoUnavailable)?;
        debug!("Found {} formats for video {}", formats.len(), video_id);

        if details.video_id != video_id {
            warn!(
                "Player response for {} describes video {}",
                video_id, details.video_id
            );
        }

        Ok(VideoInfo {
            id: video_id.to_string(),
            title: details.title,
            author: details.author,
            duration: details.length_seconds.parse().unwrap_or(0),
            description: details.short_description,
            thumbnails: details.thumbnail.map(|t| t.thumbnails).unwrap_or_default(),
            formats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::retry::RetryConfig;
    use mockito::Matcher;
    use std::time::Duration;

    const PLAYER_OK: &str = r#"{
        "playabilityStatus": {"status": "OK"},
        "videoDetails": {
            "videoId": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "author": "Rick Astley",
            "lengthSeconds": "213",
            "shortDescription": "Official video",
            "thumbnail": {"thumbnails": [
                {"url": "https://i.ytimg.com/vi/dQw4w9WgXcQ/default.jpg", "width": 120, "height": 90}
            ]}
        },
        "streamingData": {
            "formats": [{
                "itag": 18,
                "url": "https://rr1.googlevideo.com/videoplayback?itag=18",
                "mimeType": "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"",
                "bitrate": 503000,
                "width": 640,
                "height": 360,
                "qualityLabel": "360p",
                "contentLength": "13400000",
                "fps": 25,
                "audioSampleRate": "44100",
                "audioChannels": 2
            }],
            "adaptiveFormats": [{
                "itag": 140,
                "mimeType": "audio/mp4; codecs=\"mp4a.40.2\"",
                "bitrate": 130000,
                "signatureCipher": "s=abc&sp=sig&url=https%3A%2F%2Fexample"
            }]
        }
    }"#;

    fn client_for(server: &mockito::Server) -> InnerTubeClient {
        let http = VideoClient::new().unwrap().with_retry(
            RetryConfig::default()
                .with_max_retries(0)
                .with_initial_delay(Duration::from_millis(1)),
        );
        InnerTubeClient::new(http).with_base_url(&server.url())
    }

    #[test]
    fn test_innertube_client_creation() {
        let client = InnerTubeClient::new(VideoClient::new().unwrap());
        assert_eq!(client.client_name, "ANDROID");
        assert_eq!(client.client_version, "20.10.38");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);

        let client = client.with_client("IOS", "19.29.1").with_base_url("http://localhost:1/");
        assert_eq!(client.client_name, "IOS");
        assert_eq!(client.base_url, "http://localhost:1");
    }

    #[test]
    fn test_split_codecs() {
        assert_eq!(
            split_codecs("video/mp4; codecs=\"avc1.42001E, mp4a.40.2\""),
            (Some("avc1.42001E".to_string()), Some("mp4a.40.2".to_string()))
        );
        assert_eq!(
            split_codecs("audio/webm; codecs=\"opus\""),
            (None, Some("opus".to_string()))
        );
        assert_eq!(split_codecs("video/mp4; codecs=\"avc1\""), (Some("avc1".to_string()), None));
        assert_eq!(split_codecs("video/mp4"), (None, None));
    }

    #[test]
    fn test_playability_mapping() {
        let status = |status: &str, reason: Option<&str>| PlayerResponse {
            playability_status: Some(PlayabilityStatus {
                status: status.to_string(),
                reason: reason.map(str::to_string),
            }),
            video_details: None,
            streaming_data: None,
        };

        assert!(status("OK", None).check_playability().is_ok());
        assert!(matches!(
            status("LOGIN_REQUIRED", Some("Sign in to confirm your age")).check_playability(),
            Err(ApiError::AgeRestricted)
        ));
        assert!(matches!(
            status("LOGIN_REQUIRED", Some("This video is private")).check_playability(),
            Err(ApiError::Private)
        ));
        assert!(matches!(
            status("UNPLAYABLE", Some("The uploader has not made this video available in your country")).check_playability(),
            Err(ApiError::GeoBlocked)
        ));
        assert!(matches!(
            status("ERROR", Some("Video unavailable")).check_playability(),
            Err(ApiError::VideoUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_video_info_from_player_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/youtubei/v1/player")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJsonString(
                r#"{"videoId": "dQw4w9WgXcQ"}"#.to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PLAYER_OK)
            .create_async()
            .await;

        let client = client_for(&server);
        let info = client
            .video_info("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
            .await
            .unwrap();

        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.title, "Never Gonna Give You Up");
        assert_eq!(info.author, "Rick Astley");
        assert_eq!(info.duration, 213);
        assert_eq!(info.thumbnails.len(), 1);
        assert_eq!(info.thumbnails[0].width, 120);
        assert_eq!(info.formats.len(), 2);

        let muxed = &info.formats[0];
        assert!(muxed.is_progressive());
        assert_eq!(muxed.size, Some(13_400_000));
        assert_eq!(muxed.audio_sample_rate, Some(44100));

        let audio = &info.formats[1];
        assert!(audio.is_audio_only());
        assert!(audio.needs_deciphering());

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_override_sets_headers_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/youtubei/v1/player")
            .match_query(Matcher::Any)
            .match_header("X-YouTube-Client-Name", "5")
            .match_header("X-YouTube-Client-Version", "19.29.1")
            .match_body(Matcher::PartialJsonString(
                r#"{"context": {"client": {"clientName": "IOS", "clientVersion": "19.29.1"}}}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PLAYER_OK)
            .create_async()
            .await;

        let client = client_for(&server).with_client("IOS", "19.29.1");
        client.video_info("dQw4w9WgXcQ").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_default_client_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/youtubei/v1/player")
            .match_query(Matcher::Any)
            .match_header("X-YouTube-Client-Name", "3")
            .match_header("X-YouTube-Client-Version", "20.10.38")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(PLAYER_OK)
            .create_async()
            .await;

        client_for(&server).video_info("dQw4w9WgXcQ").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unplayable_video_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/youtubei/v1/player")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"playabilityStatus": {"status": "ERROR", "reason": "Video unavailable"}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.video_info("aaaaaaaaaaa").await;
        assert!(matches!(result, Err(ApiError::VideoUnavailable)));
    }

    #[tokio::test]
    async fn test_malformed_identifier_skips_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/youtubei/v1/player")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server);
        let result = client.video_info("not a video").await;
        assert!(matches!(result, Err(ApiError::InvalidIdentifier(_))));

        mock.assert_async().await;
    }
}
