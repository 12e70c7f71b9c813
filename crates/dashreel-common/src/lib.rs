//! Dashreel-Common: Shared identifiers, camera types, and validation.
//!
//! This crate provides the types every other dashreel crate agrees on:
//!
//! - **Typed IDs**: [`RouteId`] and [`SegmentId`], which can only be obtained
//!   through validation
//! - **Camera Types**: the closed [`CameraType`] enumeration and the media file
//!   each camera records into
//! - **Path Utilities**: building archive paths from validated identifiers
//! - **Error Handling**: common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use dashreel_common::{CameraType, SegmentId};
//! use dashreel_common::paths::segment_media_path;
//! use std::path::Path;
//!
//! let segment: SegmentId = "00000010--a1b2c3d4e5--3".parse().unwrap();
//! assert_eq!(segment.index(), 3);
//!
//! let path = segment_media_path(Path::new("/data/media"), &segment, CameraType::FCamera);
//! assert!(path.ends_with("00000010--a1b2c3d4e5--3/fcamera.hevc"));
//!
//! assert!("../../etc--passwd--0".parse::<SegmentId>().is_err());
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
