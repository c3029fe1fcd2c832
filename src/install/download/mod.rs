//! Helper binary download and package extraction
//!
//! ## Module Organization
//!
//! - `platform` - Host architecture resolution
//! - `extract` - `.tar.gz` member extraction
//! - `core` - Download seam and the helper fetch step

pub mod platform;
mod extract;
mod core;

// Re-export public API
pub use self::core::{Downloader, HttpDownloader, fetch_helpers};
pub use extract::extract_member;
