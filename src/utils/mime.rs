//! MIME type utilities for determining file extensions

/// Strip codec parameters, e.g. `video/mp4; codecs="avc1"` -> `video/mp4`
pub fn essence(mime_type: &str) -> &str {
    mime_type.split(';').next().unwrap_or_default().trim()
}

/// Get file extension from MIME type
pub fn ext_from_mime(mime_type: &str) -> &'static str {
    match essence(mime_type) {
        // Video formats
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/3gpp" => "3gp",
        "video/x-flv" => "flv",
        "video/mp2t" => "ts",
        "video/x-matroska" => "mkv",

        // Audio formats
        "audio/mp4" => "m4a",
        "audio/webm" => "webm",
        "audio/mpeg" => "mp3",
        "audio/ogg" => "ogg",
        "audio/opus" => "opus",
        "audio/aac" | "audio/x-aac" => "aac",

        _ => "bin",
    }
}
