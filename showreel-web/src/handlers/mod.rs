//! HTTP request handlers organized by functionality

pub mod api;
pub mod media;

// Re-export handler functions
pub use api::{api_health, api_media_list};
pub use media::{extract_range_header, stream_media, stream_media_headers};
