//! # dashreel-av
//!
//! Transcoder invocation and output streaming for dashcam footage.
//!
//! This crate provides functionality for:
//! - Locating the external transcoder (`ffmpeg`)
//! - Building a remux/concatenation invocation for one or many segment files
//!   ([`PipelineBuilder`], [`TranscodePipeline`])
//! - Supervising the spawned transcoder so it is terminated and reaped on every
//!   exit path ([`ProcessSupervisor`], [`RunningProcess`])
//! - Pulling its output in bounded chunks with backpressure ([`ChunkedStreamer`])
//!
//! ## Example
//!
//! ```no_run
//! use dashreel_av::{ChunkedStreamer, PipelineBuilder, ProcessSupervisor, SupervisorConfig};
//! use dashreel_common::CameraType;
//! use std::path::PathBuf;
//!
//! # async fn example() -> dashreel_av::Result<()> {
//! let pipeline = PipelineBuilder::new("ffmpeg").build(
//!     vec![
//!         PathBuf::from("/data/media/00000010--a1b2c3d4e5--0/fcamera.hevc"),
//!         PathBuf::from("/data/media/00000010--a1b2c3d4e5--1/fcamera.hevc"),
//!     ],
//!     CameraType::FCamera,
//! )?;
//!
//! let process = ProcessSupervisor::new(SupervisorConfig::default()).start(pipeline)?;
//! let mut streamer = ChunkedStreamer::new(process, 512 * 1024);
//! while let Some(chunk) = streamer.next_chunk().await? {
//!     println!("{} bytes", chunk.len());
//! }
//! # Ok(())
//! # }
//! ```

mod chunked;
mod error;
pub mod pipeline;
pub mod process;
pub mod tools;

#[cfg(all(test, unix))]
mod test_fixtures;

// Re-exports
pub use chunked::ChunkedStreamer;
pub use error::{Error, Result};
pub use pipeline::{PipelineBuilder, TranscodePipeline, DEFAULT_CHUNK_SIZE, DEFAULT_FRAME_RATE};
pub use process::{ProcessSupervisor, RunningProcess, StreamState, SupervisorConfig};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo, FFMPEG};
