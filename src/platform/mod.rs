//! Video platform API client and related functionality

pub mod client;
pub mod formats;
pub mod innertube;

pub use client::*;
pub use formats::*;
pub use innertube::*;

use crate::core::video_info::VideoInfo;
use crate::error::ApiError;
use crate::utils::cache::{new_async_cache_with_capacity, AsyncCache};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Resolves a video identifier to its metadata
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo, ApiError>;
}

#[async_trait]
impl<S: MetadataSource + ?Sized> MetadataSource for Arc<S> {
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo, ApiError> {
        (**self).video_info(video_id).await
    }
}

/// Metadata source that remembers successful lookups for a while
pub struct CachedMetadata<S> {
    inner: S,
    cache: AsyncCache<String, VideoInfo>,
}

impl<S: MetadataSource> CachedMetadata<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            cache: new_async_cache_with_capacity(ttl, 1024),
        }
    }
}

#[async_trait]
impl<S: MetadataSource> MetadataSource for CachedMetadata<S> {
    async fn video_info(&self, video_id: &str) -> Result<VideoInfo, ApiError> {
        if let Some(info) = self.cache.get(video_id).await {
            debug!("[{}] metadata served from cache", video_id);
            return Ok(info);
        }

        // Failures are not cached so a transient error can be retried by the caller
        let info = self.inner.video_info(video_id).await?;
        self.cache.insert(video_id.to_string(), info.clone()).await;
        Ok(info)
    }
}
