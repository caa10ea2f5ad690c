//! Command line argument parsing

use crate::core::service::{ServiceOptions, TransferMode};
use crate::platform::client::HttpClientConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// RYT API - video metadata lookup and tracked downloads over HTTP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Address to listen on
    #[arg(long, value_name = "ADDR", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// How downloads are carried out
    #[arg(long, value_enum, default_value = "simulated")]
    pub transfer: TransferMode,

    /// Output directory for http transfers
    #[arg(short, long, value_name = "DIR", default_value = "downloads")]
    pub output_dir: PathBuf,

    /// Percent increment of the simulated transfer
    #[arg(long, value_name = "PERCENT", default_value = "20",
          value_parser = clap::value_parser!(u8).range(1..=100))]
    pub simulated_step: u8,

    /// Pause between simulated progress steps (e.g., 200ms, 1s)
    #[arg(long, value_name = "DURATION", default_value = "200ms")]
    pub simulated_delay: humantime::Duration,

    /// Maximum number of downloads transferring at once
    #[arg(long, default_value = "4")]
    pub max_concurrent: usize,

    /// How long completed jobs remain pollable
    #[arg(long, value_name = "DURATION", default_value = "1h")]
    pub job_ttl: humantime::Duration,

    /// How often completed jobs are swept
    #[arg(long, value_name = "DURATION", default_value = "1m")]
    pub sweep_interval: humantime::Duration,

    /// How long video metadata is cached
    #[arg(long, value_name = "DURATION", default_value = "10m")]
    pub metadata_ttl: humantime::Duration,

    /// HTTP timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// HTTP retries for transient errors
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Innertube client name (default ANDROID)
    #[arg(long, value_name = "NAME", requires = "client_version")]
    pub client_name: Option<String>,

    /// Innertube client version (default 20.10.38)
    #[arg(long, value_name = "VERSION", requires = "client_name")]
    pub client_version: Option<String>,

    /// Override User-Agent header
    #[arg(long, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Proxy URL (http/https/socks)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only warnings and errors)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// `host:port` for the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    pub fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig {
            timeout: self.timeout_duration(),
            max_retries: self.retries,
            user_agent: self.user_agent.clone(),
            proxy_url: self.proxy.clone(),
        }
    }

    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            transfer: self.transfer,
            output_dir: self.output_dir.clone(),
            simulated_step: self.simulated_step,
            simulated_delay: self.simulated_delay.into(),
            max_concurrent: self.max_concurrent,
            job_ttl: self.job_ttl.into(),
            sweep_interval: self.sweep_interval.into(),
            metadata_ttl: self.metadata_ttl.into(),
            innertube_client: self.client_name.clone().zip(self.client_version.clone()),
            http: self.http_config(),
        }
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Warnings and errors
    Quiet,
    Normal,
    /// Debug info
    Verbose,
}

impl VerbosityLevel {
    /// Default directive for the log filter when `RUST_LOG` is unset
    pub fn log_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "warn",
            VerbosityLevel::Normal => "info",
            VerbosityLevel::Verbose => "debug",
        }
    }
}

impl Default for Args {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            transfer: TransferMode::Simulated,
            output_dir: PathBuf::from("downloads"),
            simulated_step: 20,
            simulated_delay: humantime::Duration::from(Duration::from_millis(200)),
            max_concurrent: 4,
            job_ttl: humantime::Duration::from(Duration::from_secs(3600)),
            sweep_interval: humantime::Duration::from(Duration::from_secs(60)),
            metadata_ttl: humantime::Duration::from(Duration::from_secs(600)),
            timeout: humantime::Duration::from(Duration::from_secs(30)),
            retries: 3,
            client_name: None,
            client_version: None,
            user_agent: None,
            proxy: None,
            verbose: false,
            quiet: false,
        }
    }
}
