//! Streaming media downloader

use crate::core::progress::{format_bytes, Progress};
use crate::core::runner::{ProgressSink, Transfer, TransferRequest};
use crate::error::ApiError;
use crate::platform::client::{check_status, VideoClient};
use crate::platform::formats::select_format;
use crate::utils::filename::{reserve_unique_filename, to_safe_filename};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Downloads the selected format of a video into a directory
#[derive(Debug, Clone)]
pub struct HttpTransfer {
    client: VideoClient,
    output_dir: PathBuf,
    /// Longest pause tolerated between two chunks
    stall_timeout: Duration,
}

impl HttpTransfer {
    pub fn new(client: VideoClient, output_dir: impl Into<PathBuf>) -> Self {
        let stall_timeout = client.config().timeout;
        Self {
            client,
            output_dir: output_dir.into(),
            stall_timeout,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Stream `url` into the reserved `output_path` through this run's own
    /// `.part` file.
    ///
    /// The content only appears at `output_path` once every byte is on disk.
    /// On failure both the partial file and the reservation are removed.
    async fn download(
        &self,
        url: &str,
        output_path: &Path,
        size_hint: Option<u64>,
        sink: &ProgressSink,
    ) -> Result<u64, ApiError> {
        let tmp_path = part_path(output_path, sink.ticket().generation);

        let result = match File::create(&tmp_path).await {
            Ok(mut file) => match self.stream_to(url, &mut file, size_hint, sink).await {
                Ok(bytes) => finalize(file, &tmp_path, output_path).await.map(|_| bytes),
                Err(e) => Err(e),
            },
            Err(e) => Err(e.into()),
        };

        if result.is_err() {
            remove_quietly(&tmp_path).await;
            remove_quietly(output_path).await;
        }
        result
    }

    async fn stream_to(
        &self,
        url: &str,
        file: &mut File,
        size_hint: Option<u64>,
        sink: &ProgressSink,
    ) -> Result<u64, ApiError> {
        let response = self
            .client
            .create_media_request(url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout(e.to_string())
                } else {
                    ApiError::Http(e)
                }
            })?;
        let response = check_status(response)?;

        let total_size = response.content_length().or(size_hint).unwrap_or(0);
        debug!("Media response declares {} bytes", total_size);

        let mut progress = Progress::new(total_size);
        let mut reported = 0u8;
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::time::timeout(self.stall_timeout, stream.next())
                .await
                .map_err(|_| {
                    ApiError::Timeout(format!(
                        "no data received for {}",
                        humantime::format_duration(self.stall_timeout)
                    ))
                })?;

            let chunk = match next {
                Some(chunk) => chunk?,
                None => break,
            };

            file.write_all(&chunk).await?;
            progress.update(progress.downloaded_size + chunk.len() as u64);

            let percent = progress.percent();
            if percent > reported {
                reported = sink.report(percent)?;
            }
        }

        let downloaded = progress.downloaded_size;
        if downloaded == 0 {
            return Err(ApiError::RunnerFailure("empty download (0 bytes)".to_string()));
        }
        if total_size > 0 && !progress.is_complete() {
            return Err(ApiError::RunnerFailure(format!(
                "connection closed after {} of {}",
                format_bytes(downloaded),
                format_bytes(total_size)
            )));
        }

        debug!("Average speed {}", progress.speed_string());
        Ok(downloaded)
    }
}

async fn finalize(mut file: File, tmp_path: &Path, output_path: &Path) -> Result<(), ApiError> {
    file.flush().await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(tmp_path, output_path).await?;
    Ok(())
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove {}: {}", path.display(), e),
    }
}

/// Temp file of one run: `<output>.<generation>.part`
fn part_path(output_path: &Path, generation: u64) -> PathBuf {
    let mut name = output_path.as_os_str().to_owned();
    name.push(format!(".{}.part", generation));
    PathBuf::from(name)
}

#[async_trait]
impl Transfer for HttpTransfer {
    async fn run(&self, request: &TransferRequest, sink: &ProgressSink) -> Result<(), ApiError> {
        let video_id = &sink.ticket().video_id;
        let format = select_format(&request.video.formats, &request.selector)?;
        if format.needs_deciphering() {
            return Err(ApiError::FormatRequiresDecipher(format.itag));
        }

        sink.report(0)?;

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let filename = to_safe_filename(&request.video.title, format.extension())?;
        let output_path = reserve_unique_filename(&self.output_dir, &filename).await?;

        info!(
            "[{}] downloading itag {} ({}) to {}",
            video_id,
            format.itag,
            format.mime_type,
            output_path.display()
        );

        let bytes = self
            .download(&format.url, &output_path, format.size, sink)
            .await?;

        info!(
            "[{}] saved {} to {}",
            video_id,
            format_bytes(bytes),
            output_path.display()
        );
        sink.report(100)?;
        Ok(())
    }
}
