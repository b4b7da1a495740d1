//! End-to-end tests for Showreel
//!
//! These tests bind a real listener and talk to it over HTTP, the way a
//! browser video element does: probe, seek, abandon, resume.

mod streaming_workflow;
