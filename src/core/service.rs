//! Wiring of registry, runner and metadata source

use crate::core::job::{Job, JobTicket};
use crate::core::registry::JobRegistry;
use crate::core::runner::{JobRunner, SimulatedTransfer, Transfer, TransferRequest};
use crate::core::video_info::{FormatSelector, VideoInfo};
use crate::download::downloader::HttpTransfer;
use crate::error::ApiError;
use crate::platform::client::{HttpClientConfig, VideoClient};
use crate::platform::innertube::InnerTubeClient;
use crate::platform::{CachedMetadata, MetadataSource};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How accepted downloads move their bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TransferMode {
    /// Step progress from 0 to 100 without touching the network
    Simulated,
    /// Stream the selected format to the output directory
    Http,
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub transfer: TransferMode,
    /// Destination for `http` transfers
    pub output_dir: PathBuf,
    /// Percent increment of the simulated transfer
    pub simulated_step: u8,
    /// Pause between simulated progress steps
    pub simulated_delay: Duration,
    /// Transfers allowed to run at once
    pub max_concurrent: usize,
    /// How long completed jobs stay pollable
    pub job_ttl: Duration,
    pub sweep_interval: Duration,
    pub metadata_ttl: Duration,
    /// InnerTube client name and version override
    pub innertube_client: Option<(String, String)>,
    pub http: HttpClientConfig,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            transfer: TransferMode::Simulated,
            output_dir: PathBuf::from("downloads"),
            simulated_step: 20,
            simulated_delay: Duration::from_millis(200),
            max_concurrent: 4,
            job_ttl: Duration::from_secs(60 * 60),
            sweep_interval: Duration::from_secs(60),
            metadata_ttl: Duration::from_secs(10 * 60),
            innertube_client: None,
            http: HttpClientConfig::default(),
        }
    }
}

/// The operations the HTTP API exposes
pub struct Service {
    registry: Arc<JobRegistry>,
    runner: JobRunner,
    metadata: Arc<dyn MetadataSource>,
    options: ServiceOptions,
    stop: CancellationToken,
}

impl Service {
    /// Build the production service: InnerTube metadata behind a cache, plus
    /// the transfer selected by `options.transfer`
    pub fn from_options(options: ServiceOptions) -> Result<Self, ApiError> {
        let mut innertube = InnerTubeClient::new(VideoClient::with_config(options.http.clone())?);
        if let Some((name, version)) = &options.innertube_client {
            innertube = innertube.with_client(name, version);
        }
        let metadata = CachedMetadata::new(innertube, options.metadata_ttl);

        let transfer: Arc<dyn Transfer> = match options.transfer {
            TransferMode::Simulated => Arc::new(SimulatedTransfer::new(
                options.simulated_step,
                options.simulated_delay,
            )),
            TransferMode::Http => Arc::new(HttpTransfer::new(
                VideoClient::for_media(options.http.clone())?,
                options.output_dir.clone(),
            )),
        };

        Ok(Self::with_parts(Arc::new(metadata), transfer, options))
    }

    /// Assemble a service from explicit collaborators
    pub fn with_parts(
        metadata: Arc<dyn MetadataSource>,
        transfer: Arc<dyn Transfer>,
        options: ServiceOptions,
    ) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let runner = JobRunner::new(Arc::clone(&registry), transfer, options.max_concurrent);

        Self {
            registry,
            runner,
            metadata,
            options,
            stop: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &ServiceOptions {
        &self.options
    }

    /// Resolve metadata; every failure counts as an invalid identifier
    pub async fn video_info(&self, video_id: &str) -> Result<VideoInfo, ApiError> {
        self.metadata.video_info(video_id).await.map_err(|e| {
            if e.is_platform_error() {
                info!("[{}] video not available: {}", video_id, e);
            } else {
                warn!("[{}] metadata lookup failed: {}", video_id, e);
            }
            match e {
                ApiError::InvalidIdentifier(id) => ApiError::InvalidIdentifier(id),
                other => ApiError::InvalidIdentifier(format!("{}: {}", video_id, other)),
            }
        })
    }

    /// Resolve metadata, register a fresh job and launch its runner.
    ///
    /// The job is registered before this returns, so an immediate poll sees it.
    /// Nothing is registered when metadata resolution fails.
    pub async fn start_download(
        &self,
        video_id: &str,
        selector: FormatSelector,
    ) -> Result<JobTicket, ApiError> {
        let video = self.video_info(video_id).await?;

        let ticket = self.registry.create(video_id);
        info!(
            "[{}] accepted download of '{}' (generation {})",
            video_id, video.title, ticket.generation
        );
        self.runner
            .start(ticket.clone(), TransferRequest { video, selector });

        Ok(ticket)
    }

    /// Snapshot of the job tracked for `video_id`
    pub fn progress(&self, video_id: &str) -> Result<Job, ApiError> {
        self.registry.get(video_id)
    }

    /// Periodically evict completed jobs older than the configured TTL
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let ttl = self.options.job_ttl;
        let period = self.options.sweep_interval.max(Duration::from_millis(10));
        let stop = self.stop.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = registry.evict_completed(ttl);
                        if evicted > 0 {
                            debug!("Evicted {} completed job(s)", evicted);
                        }
                    }
                }
            }
        })
    }

    /// Stop the sweeper and cancel outstanding downloads
    pub async fn shutdown(&self) {
        self.stop.cancel();
        self.runner.shutdown().await;
    }
}
