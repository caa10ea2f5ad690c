//! Background execution of download jobs
//!
//! A [`JobRunner`] spawns one task per accepted download. The task waits for a
//! concurrency permit, drives a [`Transfer`] and records the outcome in the
//! [`JobRegistry`]. Nothing is ever returned to the request that started it:
//! errors, panics and shutdown cancellations all end up as the job's error
//! message.

use crate::core::job::JobTicket;
use crate::core::registry::JobRegistry;
use crate::core::video_info::{FormatSelector, VideoInfo};
use crate::error::ApiError;
use async_trait::async_trait;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

/// Error recorded on jobs that were still running when the server stopped
pub const CANCELLED_MESSAGE: &str = "download cancelled: server shutting down";

/// Everything a transfer needs to know about one download
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Metadata resolved before the job was created
    pub video: VideoInfo,
    pub selector: FormatSelector,
}

/// Moves the bytes of one download, reporting progress as it goes
#[async_trait]
pub trait Transfer: Send + Sync {
    /// Run the transfer to completion.
    ///
    /// Implementations must stop as soon as [`ProgressSink::report`] fails;
    /// that means the job has been replaced by a newer download.
    async fn run(&self, request: &TransferRequest, sink: &ProgressSink) -> Result<(), ApiError>;
}

/// Write handle for the single job a transfer owns
#[derive(Debug, Clone)]
pub struct ProgressSink {
    registry: Arc<JobRegistry>,
    ticket: JobTicket,
}

impl ProgressSink {
    pub fn new(registry: Arc<JobRegistry>, ticket: JobTicket) -> Self {
        Self { registry, ticket }
    }

    pub fn ticket(&self) -> &JobTicket {
        &self.ticket
    }

    /// Publish a percentage, returning what the registry now holds
    pub fn report(&self, percent: u8) -> Result<u8, ApiError> {
        self.registry.update_progress(&self.ticket, percent)
    }

    fn complete(&self, error: Option<String>) -> Result<(), ApiError> {
        self.registry.mark_completed(&self.ticket, error)
    }
}

/// Spawns and supervises job tasks
pub struct JobRunner {
    registry: Arc<JobRegistry>,
    transfer: Arc<dyn Transfer>,
    permits: Arc<Semaphore>,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl JobRunner {
    /// Create a runner allowing at most `max_concurrent` transfers at once
    pub fn new(registry: Arc<JobRegistry>, transfer: Arc<dyn Transfer>, max_concurrent: usize) -> Self {
        Self {
            registry,
            transfer,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    /// Number of job tasks that have not finished yet
    pub fn active(&self) -> usize {
        self.tasks.len()
    }

    /// Launch the task for an already registered job.
    ///
    /// Returns immediately. The job stays `Created` until a permit is free.
    pub fn start(&self, ticket: JobTicket, request: TransferRequest) -> JoinHandle<()> {
        let sink = ProgressSink::new(Arc::clone(&self.registry), ticket);
        let transfer = Arc::clone(&self.transfer);
        let permits = Arc::clone(&self.permits);
        let shutdown = self.shutdown.clone();

        self.tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Err(ApiError::RunnerFailure(CANCELLED_MESSAGE.to_string())),
                outcome = drive(transfer.as_ref(), permits, &request, &sink) => outcome,
            };
            finish(&sink, outcome);
        })
    }

    /// Cancel every running or queued job and wait for their outcomes to be recorded
    pub async fn shutdown(&self) {
        info!("Cancelling {} outstanding download(s)", self.tasks.len());
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }
}

async fn drive(
    transfer: &dyn Transfer,
    permits: Arc<Semaphore>,
    request: &TransferRequest,
    sink: &ProgressSink,
) -> Result<(), ApiError> {
    let _permit = permits
        .acquire_owned()
        .await
        .map_err(|_| ApiError::RunnerFailure(CANCELLED_MESSAGE.to_string()))?;

    let ticket = sink.ticket();
    info!(
        "[{}] download started (generation {})",
        ticket.video_id, ticket.generation
    );

    match AssertUnwindSafe(transfer.run(request, sink)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => Err(ApiError::RunnerFailure(format!(
            "transfer panicked: {}",
            panic_message(&*panic)
        ))),
    }
}

fn finish(sink: &ProgressSink, outcome: Result<(), ApiError>) {
    let ticket = sink.ticket();
    let error = match outcome {
        Ok(()) => None,
        Err(ApiError::JobSuperseded(_)) => {
            info!(
                "[{}] generation {} superseded, abandoning transfer",
                ticket.video_id, ticket.generation
            );
            return;
        }
        Err(ApiError::RunnerFailure(message)) => Some(message),
        Err(e) => Some(e.to_string()),
    };

    if let Some(message) = &error {
        warn!("[{}] download failed: {}", ticket.video_id, message);
    }

    match sink.complete(error) {
        Ok(()) => debug!(
            "[{}] generation {} reached a terminal state",
            ticket.video_id, ticket.generation
        ),
        Err(ApiError::JobSuperseded(_)) => debug!(
            "[{}] generation {} superseded before completion",
            ticket.video_id, ticket.generation
        ),
        Err(e) => warn!("[{}] outcome not recorded: {}", ticket.video_id, e),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Stand-in transfer that walks progress from 0 to 100 in fixed steps
#[derive(Debug, Clone)]
pub struct SimulatedTransfer {
    step: u8,
    delay: Duration,
}

impl SimulatedTransfer {
    pub fn new(step: u8, delay: Duration) -> Self {
        Self {
            step: step.clamp(1, 100),
            delay,
        }
    }
}

impl Default for SimulatedTransfer {
    fn default() -> Self {
        Self::new(20, Duration::from_millis(200))
    }
}

#[async_trait]
impl Transfer for SimulatedTransfer {
    async fn run(&self, request: &TransferRequest, sink: &ProgressSink) -> Result<(), ApiError> {
        debug!(
            "[{}] simulating transfer of '{}'",
            sink.ticket().video_id,
            request.video.title
        );

        let mut percent = 0u8;
        loop {
            sink.report(percent)?;
            if percent >= 100 {
                return Ok(());
            }
            tokio::time::sleep(self.delay).await;
            percent = percent.saturating_add(self.step).min(100);
        }
    }
}
