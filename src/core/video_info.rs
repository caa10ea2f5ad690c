//! Video information structures

use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use utoipa::ToSchema;

/// Video information and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Platform video ID
    pub id: String,
    pub title: String,
    /// Channel name
    pub author: String,
    /// Duration in seconds
    pub duration: u32,
    pub description: String,
    pub thumbnails: Vec<Thumbnail>,
    pub formats: Vec<Format>,
}

impl VideoInfo {
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            author: String::new(),
            duration: 0,
            description: String::new(),
            thumbnails: Vec::new(),
            formats: Vec::new(),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.duration))
    }
}

/// Thumbnail image reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Thumbnail {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// Video format information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    /// Platform format ID
    pub itag: u32,
    /// Direct media URL, empty when the format is ciphered
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Quality label (e.g., "720p")
    pub quality: String,
    pub mime_type: String,
    /// Bits per second
    pub bitrate: u32,
    /// Size in bytes, if known
    #[serde(default, rename = "contentLength", skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing)]
    pub signature_cipher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_channels: Option<u32>,
}

impl Format {
    pub fn new(itag: u32, url: String, quality: String, mime_type: String) -> Self {
        Self {
            itag,
            url,
            quality,
            mime_type,
            bitrate: 0,
            size: None,
            signature_cipher: None,
            audio_codec: None,
            video_codec: None,
            fps: None,
            width: None,
            height: None,
            audio_sample_rate: None,
            audio_channels: None,
        }
    }

    /// Check if format is progressive (video+audio combined)
    pub fn is_progressive(&self) -> bool {
        self.mime_type.starts_with("video/")
            && self.audio_codec.is_some()
            && self.video_codec.is_some()
    }

    pub fn is_video_only(&self) -> bool {
        self.mime_type.starts_with("video/") && self.audio_codec.is_none()
    }

    pub fn is_audio_only(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    /// Get file extension from MIME type
    pub fn extension(&self) -> &'static str {
        crate::utils::mime::ext_from_mime(&self.mime_type)
    }

    /// Check if the media URL must be deciphered before use
    pub fn needs_deciphering(&self) -> bool {
        self.signature_cipher.is_some() || self.url.is_empty()
    }
}

/// What a download request asks for
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSelector {
    pub quality: QualitySelector,
    pub audio_only: bool,
}

impl FormatSelector {
    pub fn new(quality: QualitySelector) -> Self {
        Self {
            quality,
            audio_only: false,
        }
    }

    /// Build a selector from the request's `audio_only` and `quality` fields.
    ///
    /// A quality that does not parse falls back to `Best`.
    pub fn for_request(audio_only: bool, quality: Option<&str>) -> Self {
        let quality = match quality {
            Some(raw) => raw.parse::<QualitySelector>().unwrap_or_else(|e| {
                warn!("Using best quality instead of '{}': {}", raw, e);
                QualitySelector::Best
            }),
            None => QualitySelector::Best,
        };
        Self::new(quality).with_audio_only(audio_only)
    }

    pub fn with_audio_only(mut self, audio_only: bool) -> Self {
        self.audio_only = audio_only;
        self
    }
}

/// Quality selection criteria
#[derive(Debug, Clone, PartialEq)]
pub enum QualitySelector {
    Best,
    Worst,
    Itag(u32),
    Height(u32),
    HeightLessOrEqual(u32),
    HeightGreaterOrEqual(u32),
}

/// Height of a label such as `720p`, `1080p60` or `720p60 HDR`
fn parse_label(label: &str) -> Option<u32> {
    let label = label.split_whitespace().next()?;
    let (height, fps) = label.split_once('p')?;
    if fps.chars().all(|c| c.is_ascii_digit()) {
        height.parse().ok()
    } else {
        None
    }
}

fn parse_number(value: &str, what: &str) -> Result<u32, ApiError> {
    value
        .parse::<u32>()
        .map_err(|_| ApiError::InvalidPayload(format!("invalid {}: {}", what, value)))
}

impl FromStr for QualitySelector {
    type Err = ApiError;

    /// Accepts `best`, `worst`, `itag=N`, `height=N`, `height<=N`,
    /// `height>=N`, format labels like `720p` or `1080p60 HDR` and the
    /// platform labels `tiny` .. `hd2160`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        let selector = match s.as_str() {
            "" | "best" | "highest" | "high" => QualitySelector::Best,
            "worst" | "lowest" | "low" => QualitySelector::Worst,
            "tiny" => QualitySelector::Height(144),
            "small" => QualitySelector::Height(240),
            "medium" => QualitySelector::Height(360),
            "large" => QualitySelector::Height(480),
            _ => {
                if let Some(rest) = s.strip_prefix("itag=") {
                    QualitySelector::Itag(parse_number(rest, "itag")?)
                } else if let Some(rest) = s.strip_prefix("height<=") {
                    QualitySelector::HeightLessOrEqual(parse_number(rest, "height")?)
                } else if let Some(rest) = s.strip_prefix("height>=") {
                    QualitySelector::HeightGreaterOrEqual(parse_number(rest, "height")?)
                } else if let Some(rest) = s.strip_prefix("height=") {
                    QualitySelector::Height(parse_number(rest, "height")?)
                } else if let Some(rest) = s.strip_prefix("hd") {
                    QualitySelector::Height(parse_number(rest, "quality")?)
                } else if let Some(height) = parse_label(&s) {
                    QualitySelector::Height(height)
                } else {
                    return Err(ApiError::InvalidPayload(format!(
                        "unknown quality selector: {}",
                        s
                    )));
                }
            }
        };

        Ok(selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(itag: u32, mime_type: &str) -> Format {
        Format::new(
            itag,
            "https://media.example.com/v".to_string(),
            String::new(),
            mime_type.to_string(),
        )
    }

    #[test]
    fn test_video_info_creation() {
        let info = VideoInfo::new("dQw4w9WgXcQ".to_string(), "Test Video".to_string());
        assert_eq!(info.id, "dQw4w9WgXcQ");
        assert_eq!(info.title, "Test Video");
        assert!(info.formats.is_empty());
        assert_eq!(info.duration(), Duration::ZERO);
    }

    #[test]
    fn test_format_kinds() {
        let mut muxed = format(18, "video/mp4; codecs=\"avc1.42001E, mp4a.40.2\"");
        muxed.audio_codec = Some("mp4a.40.2".to_string());
        muxed.video_codec = Some("avc1.42001E".to_string());
        assert!(muxed.is_progressive());
        assert!(!muxed.is_video_only());

        let video = format(137, "video/mp4");
        assert!(video.is_video_only());
        assert!(!video.is_progressive());

        let audio = format(140, "audio/mp4");
        assert!(audio.is_audio_only());
    }

    #[test]
    fn test_needs_deciphering() {
        let mut ciphered = format(22, "video/mp4");
        ciphered.url.clear();
        assert!(ciphered.needs_deciphering());

        assert!(!format(22, "video/mp4").needs_deciphering());
    }

    #[test]
    fn test_format_serializes_camel_case() {
        let mut f = format(18, "video/mp4");
        f.size = Some(1024);
        f.signature_cipher = Some("s=abc".to_string());

        let value = serde_json::to_value(&f).unwrap();
        assert_eq!(value["mimeType"], "video/mp4");
        assert_eq!(value["contentLength"], 1024);
        assert!(value.get("signatureCipher").is_none());
        assert!(value.get("fps").is_none());
    }

    #[test]
    fn test_quality_selector_parsing() {
        assert_eq!("best".parse::<QualitySelector>().unwrap(), QualitySelector::Best);
        assert_eq!("".parse::<QualitySelector>().unwrap(), QualitySelector::Best);
        assert_eq!("Worst".parse::<QualitySelector>().unwrap(), QualitySelector::Worst);
        assert_eq!("itag=22".parse::<QualitySelector>().unwrap(), QualitySelector::Itag(22));
        assert_eq!("720p".parse::<QualitySelector>().unwrap(), QualitySelector::Height(720));
        assert_eq!("hd1080".parse::<QualitySelector>().unwrap(), QualitySelector::Height(1080));
        assert_eq!("medium".parse::<QualitySelector>().unwrap(), QualitySelector::Height(360));
        assert_eq!(
            "height<=480".parse::<QualitySelector>().unwrap(),
            QualitySelector::HeightLessOrEqual(480)
        );
        assert_eq!(
            "height>=480".parse::<QualitySelector>().unwrap(),
            QualitySelector::HeightGreaterOrEqual(480)
        );

        assert!(matches!(
            "ultra".parse::<QualitySelector>(),
            Err(ApiError::InvalidPayload(_))
        ));
        assert!("itag=abc".parse::<QualitySelector>().is_err());
        assert!("p60".parse::<QualitySelector>().is_err());
    }

    #[test]
    fn test_format_labels_parse_as_height() {
        assert_eq!("1080p60".parse::<QualitySelector>().unwrap(), QualitySelector::Height(1080));
        assert_eq!(
            "720p60 HDR".parse::<QualitySelector>().unwrap(),
            QualitySelector::Height(720)
        );
        assert_eq!("2160p HDR".parse::<QualitySelector>().unwrap(), QualitySelector::Height(2160));
        assert!("720px".parse::<QualitySelector>().is_err());
    }

    #[test]
    fn test_selector_for_request() {
        let selector = FormatSelector::for_request(true, None);
        assert!(selector.audio_only);
        assert_eq!(selector.quality, QualitySelector::Best);

        let selector = FormatSelector::for_request(false, Some("1080p60"));
        assert_eq!(selector.quality, QualitySelector::Height(1080));

        let selector = FormatSelector::for_request(false, Some("sharp"));
        assert_eq!(selector.quality, QualitySelector::Best);
        assert!(!selector.audio_only);
    }
}
