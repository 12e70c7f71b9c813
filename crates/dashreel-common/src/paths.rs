//! Archive path construction.
//!
//! Paths are only ever built from validated [`SegmentId`]s, so a malformed or
//! hostile identifier cannot be turned into a filesystem path.

use std::path::{Path, PathBuf};

use crate::ids::SegmentId;
use crate::types::CameraType;

/// Directory of a segment inside the log archive.
pub fn segment_dir(log_root: &Path, segment: &SegmentId) -> PathBuf {
    log_root.join(segment.dir_name())
}

/// Path of a camera's media file inside a segment.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use dashreel_common::{CameraType, SegmentId};
/// use dashreel_common::paths::segment_media_path;
///
/// let seg = SegmentId::parse("00000010--a1b2c3d4e5--0").unwrap();
/// let path = segment_media_path(Path::new("/data/media"), &seg, CameraType::QCamera);
/// assert_eq!(path, Path::new("/data/media/00000010--a1b2c3d4e5--0/qcamera.ts"));
/// ```
pub fn segment_media_path(log_root: &Path, segment: &SegmentId, camera: CameraType) -> PathBuf {
    segment_dir(log_root, segment).join(camera.file_name())
}
