//! dashreel - on-demand dashcam route reassembly and streaming
//!
//! This library crate exposes the core functionality for integration testing.

pub mod archive;
pub mod config;
pub mod params;
pub mod server;
pub mod streaming;
