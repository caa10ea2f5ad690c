//! Core functionality for ryt-api

pub mod job;
pub mod progress;
pub mod registry;
pub mod runner;
pub mod service;
pub mod video_info;

pub use job::*;
pub use progress::*;
pub use registry::*;
pub use runner::*;
pub use service::*;
pub use video_info::*;
