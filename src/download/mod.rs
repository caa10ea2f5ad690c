//! Media transfer for ryt-api

pub mod downloader;
pub mod retry;

pub use downloader::*;
pub use retry::*;
