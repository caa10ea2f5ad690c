//! Safe filename generation utilities

use crate::error::ApiError;
use regex::Regex;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;

const MAX_TITLE_LEN: usize = 200;

/// Convert a title to a safe filename by replacing characters filesystems reject
pub fn to_safe_filename(title: &str, extension: &str) -> Result<String, ApiError> {
    let invalid_chars = Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#)?;
    let replaced = invalid_chars.replace_all(title, "_");
    let mut safe_title = replaced
        .trim_matches(|c: char| c == '.' || c == ' ')
        .to_string();

    if safe_title.len() > MAX_TITLE_LEN {
        let mut cut = MAX_TITLE_LEN;
        while !safe_title.is_char_boundary(cut) {
            cut -= 1;
        }
        safe_title.truncate(cut);
        safe_title = safe_title.trim_end().to_string();
    }

    if safe_title.is_empty() {
        safe_title = "video".to_string();
    }

    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        Ok(safe_title)
    } else {
        Ok(format!("{}.{}", safe_title, extension))
    }
}

/// Claim a free name inside `base_path`, appending ` (n)` to the stem while
/// the name is taken.
///
/// The name is reserved by creating an empty file with `create_new`, so two
/// callers racing for the same name never get the same path.
pub async fn reserve_unique_filename(base_path: &Path, filename: &str) -> io::Result<PathBuf> {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    let mut candidate = filename.to_string();
    for counter in 1..=10000 {
        let target = base_path.join(&candidate);
        match OpenOptions::new().write(true).create_new(true).open(&target).await {
            Ok(_) => return Ok(target),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                candidate = format!("{} ({}){}", stem, counter, extension);
            }
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        "Too many files with similar names",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_to_safe_filename() {
        assert_eq!(
            to_safe_filename("Test Video: Title", "mp4").unwrap(),
            "Test Video_ Title.mp4"
        );
        assert_eq!(
            to_safe_filename("Video with <invalid> chars", ".webm").unwrap(),
            "Video with _invalid_ chars.webm"
        );
        assert_eq!(to_safe_filename("", "mp4").unwrap(), "video.mp4");
        assert_eq!(to_safe_filename(" ..", "").unwrap(), "video");
    }

    #[test]
    fn test_long_titles_are_truncated_on_char_boundary() {
        let title = "é".repeat(150);
        let name = to_safe_filename(&title, "mp4").unwrap();
        assert!(name.len() <= MAX_TITLE_LEN + 4);
        assert!(name.ends_with(".mp4"));
    }

    #[tokio::test]
    async fn test_reserve_unique_filename() {
        let dir = TempDir::new().unwrap();
        let first = reserve_unique_filename(dir.path(), "clip.mp4").await.unwrap();
        assert_eq!(first, dir.path().join("clip.mp4"));
        assert!(first.exists());

        std::fs::write(dir.path().join("clip (1).mp4"), b"x").unwrap();
        let second = reserve_unique_filename(dir.path(), "clip.mp4").await.unwrap();
        assert_eq!(second, dir.path().join("clip (2).mp4"));
        assert_eq!(std::fs::read(dir.path().join("clip (1).mp4")).unwrap(), b"x");
    }

    #[tokio::test]
    async fn test_concurrent_reservations_get_distinct_names() {
        let dir = TempDir::new().unwrap();
        let (a, b) = tokio::join!(
            reserve_unique_filename(dir.path(), "clip.mp4"),
            reserve_unique_filename(dir.path(), "clip.mp4"),
        );
        assert_ne!(a.unwrap(), b.unwrap());
    }
}
