//! Integration tests for Showreel
//!
//! Drive the full axum router in-process against real media libraries on
//! disk, checking HTTP semantics end to end without opening sockets.

#[path = "integration/support.rs"]
mod support;

#[path = "integration/media_api.rs"]
mod media_api;

#[path = "integration/range_validation.rs"]
mod range_validation;
