//! # ryt-api - video metadata and download jobs over HTTP
//!
//! Looks up video metadata through the InnerTube player endpoint and runs
//! download jobs in the background while clients poll their progress.
//!
//! ## Features
//!
//! - Concurrent job registry with monotonic progress and job generations
//! - Bounded background runner with failure, panic and shutdown capture
//! - Simulated or real streaming transfers
//! - Metadata caching and retry with backoff
//! - Retention sweep for completed jobs
//!
//! ## Example
//!
//! ```rust,no_run
//! use ryt_api::{api, Service, ServiceOptions};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Arc::new(Service::from_options(ServiceOptions::default())?);
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, api::router(service)).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod download;
pub mod error;
pub mod platform;
pub mod utils;

// Re-export main types
pub use crate::core::{
    Format, FormatSelector, Job, JobRegistry, JobRunner, JobState, QualitySelector, Service,
    ServiceOptions, VideoInfo,
};
pub use error::{ApiError, Result};
