//! HTTP client for video platform requests

use crate::download::retry::{RetryConfig, RetryExecutor};
use crate::error::ApiError;
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

const ANDROID_USER_AGENT: &str = "com.google.android.youtube/20.10.38 (Linux; U; Android 11) gzip";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Retries for transient failures
    pub max_retries: u32,
    /// User agent override
    pub user_agent: Option<String>,
    /// Proxy URL (http/https/socks)
    pub proxy_url: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            user_agent: None,
            proxy_url: None,
        }
    }
}

/// Platform HTTP client
#[derive(Debug, Clone)]
pub struct VideoClient {
    client: Client,
    config: HttpClientConfig,
    retry: RetryExecutor,
}

impl VideoClient {
    /// Create a client with default configuration
    pub fn new() -> Result<Self, ApiError> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, ApiError> {
        Self::build(config, true)
    }

    /// Client for media streams: `timeout` bounds connecting, not the whole body
    pub fn for_media(config: HttpClientConfig) -> Result<Self, ApiError> {
        Self::build(config, false)
    }

    fn build(config: HttpClientConfig, bound_total: bool) -> Result<Self, ApiError> {
        let mut builder = ClientBuilder::new()
            .connect_timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_deref().unwrap_or(ANDROID_USER_AGENT));

        if bound_total {
            builder = builder.timeout(config.timeout);
        }
        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        let retry = RetryExecutor::with_config(
            RetryConfig::default().with_max_retries(config.max_retries),
        );

        Ok(Self {
            client: builder.build()?,
            config,
            retry,
        })
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = RetryExecutor::with_config(retry);
        self
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// JSON POST to an InnerTube endpoint on behalf of the given client
    pub fn create_innertube_request(
        &self,
        url: &str,
        client_name: &str,
        client_version: &str,
    ) -> RequestBuilder {
        self.client
            .post(url)
            .header("Accept", "application/json")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Content-Type", "application/json")
            .header("X-YouTube-Client-Name", innertube_client_id(client_name))
            .header("X-YouTube-Client-Version", client_version)
    }

    /// Plain GET for media hosts, which reject browser-specific headers
    pub fn create_media_request(&self, url: &str) -> RequestBuilder {
        self.client
            .get(url)
            .header("Accept", "*/*")
            .header("Connection", "keep-alive")
    }

    /// Send `request` and decode a JSON body, retrying transient failures
    pub async fn execute_json<T>(&self, request: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.retry
            .execute(|| {
                let attempt = request.try_clone();
                Box::pin(async move {
                    let request = attempt.ok_or_else(|| {
                        ApiError::Io(std::io::Error::new(
                            std::io::ErrorKind::Other,
                            "request body cannot be replayed",
                        ))
                    })?;
                    let response = request.send().await.map_err(|e| {
                        if e.is_timeout() {
                            ApiError::Timeout(e.to_string())
                        } else {
                            ApiError::Http(e)
                        }
                    })?;
                    let response = check_status(response)?;
                    Ok(response.json::<T>().await?)
                })
            })
            .await
    }
}

/// Numeric id sent in `X-YouTube-Client-Name`; unknown names are sent verbatim
pub fn innertube_client_id(client_name: &str) -> String {
    let id = match client_name.to_ascii_uppercase().as_str() {
        "WEB" => 1,
        "MWEB" => 2,
        "ANDROID" => 3,
        "IOS" => 5,
        "TVHTML5" => 7,
        "ANDROID_MUSIC" => 21,
        "IOS_MUSIC" => 26,
        "ANDROID_VR" => 28,
        "WEB_EMBEDDED_PLAYER" => 56,
        "WEB_REMIX" => 67,
        "TVHTML5_SIMPLY_EMBEDDED_PLAYER" => 85,
        _ => return client_name.to_string(),
    };
    id.to_string()
}

/// Map platform status codes onto the error taxonomy
pub fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    debug!("Response status: {}", status);

    match status {
        s if s.is_success() => Ok(response),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            warn!("Request refused with status {}", status);
            Err(ApiError::RateLimited)
        }
        StatusCode::NOT_FOUND | StatusCode::GONE => Err(ApiError::VideoUnavailable),
        _ => {
            warn!("HTTP request failed with status: {}", status);
            Err(response
                .error_for_status()
                .err()
                .map(ApiError::Http)
                .unwrap_or(ApiError::VideoUnavailable))
        }
    }
}
