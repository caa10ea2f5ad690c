//! Format selection for download requests

use crate::core::video_info::{Format, FormatSelector, QualitySelector};
use crate::error::ApiError;

/// Pick the format a download request should transfer
pub fn select_format<'a>(
    formats: &'a [Format],
    selector: &FormatSelector,
) -> Result<&'a Format, ApiError> {
    let candidates: Vec<&Format> = if selector.audio_only {
        formats.iter().filter(|f| f.is_audio_only()).collect()
    } else {
        // Muxed formats first; adaptive video would need a separate audio track
        let progressive: Vec<&Format> = formats.iter().filter(|f| f.is_progressive()).collect();
        if progressive.is_empty() {
            formats.iter().filter(|f| f.mime_type.starts_with("video/")).collect()
        } else {
            progressive
        }
    };

    if candidates.is_empty() {
        return Err(ApiError::NoFormatFound);
    }

    let chosen = match &selector.quality {
        QualitySelector::Best => candidates
            .iter()
            .max_by_key(|f| (height(f), f.bitrate))
            .copied(),
        QualitySelector::Worst => candidates
            .iter()
            .min_by_key(|f| (height(f), f.bitrate))
            .copied(),
        QualitySelector::Itag(itag) => candidates.iter().find(|f| f.itag == *itag).copied(),
        // Audio has no height, so height constraints only rank by bitrate
        _ if selector.audio_only => candidates.iter().max_by_key(|f| f.bitrate).copied(),
        QualitySelector::Height(target) => candidates
            .iter()
            .filter(|f| height(f) == *target)
            .max_by_key(|f| f.bitrate)
            .copied(),
        QualitySelector::HeightLessOrEqual(target) => candidates
            .iter()
            .filter(|f| height(f) <= *target)
            .max_by_key(|f| (height(f), f.bitrate))
            .copied(),
        QualitySelector::HeightGreaterOrEqual(target) => candidates
            .iter()
            .filter(|f| height(f) >= *target)
            .min_by_key(|f| (height(f), std::cmp::Reverse(f.bitrate)))
            .copied(),
    };

    chosen.ok_or(ApiError::NoFormatFound)
}

fn height(format: &Format) -> u32 {
    format.height.unwrap_or(0)
}
