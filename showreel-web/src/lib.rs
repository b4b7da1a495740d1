//! Showreel Web - JSON API and media streaming server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! Serves uploaded event videos with HTTP range support and exposes a small
//! JSON API for the portfolio frontend.

pub mod handlers;
pub mod server;

// Re-export main types
pub use server::{AppState, build_router, run_server};
