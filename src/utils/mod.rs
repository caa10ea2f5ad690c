//! Utility functions for ryt-api

pub mod cache;
pub mod filename;
pub mod mime;
pub mod url;

pub use self::cache::*;
pub use self::filename::*;
pub use self::mime::*;
pub use self::url::*;
