//! Read-only access to the segment log archive.
//!
//! The archive is a flat directory with one sub-directory per recorded
//! segment (`<boot-session>--<route-suffix>--<index>`), each holding zero or
//! more per-camera media files. Nothing in dashreel ever writes to it.

mod resolver;

pub use resolver::{RouteMedia, RouteResolver, SegmentSummary};

use dashreel_common::{paths, CameraType, SegmentId};
use std::io;
use std::path::{Path, PathBuf};

/// A directory-like store of recorded segments.
///
/// Implementations do blocking I/O; async callers go through
/// `tokio::task::spawn_blocking`.
pub trait LogArchive: Send + Sync {
    /// Archive root; every media path lives below it.
    fn root(&self) -> &Path;

    /// Names of the entries directly under the root.
    fn list_entries(&self) -> io::Result<Vec<String>>;

    /// Whether `segment` holds a media file for `camera`.
    fn has_media(&self, segment: &SegmentId, camera: CameraType) -> bool;

    /// Path of a segment's media file for `camera`.
    fn media_path(&self, segment: &SegmentId, camera: CameraType) -> PathBuf {
        paths::segment_media_path(self.root(), segment, camera)
    }

    /// Cameras with footage in `segment`.
    fn cameras(&self, segment: &SegmentId) -> Vec<CameraType> {
        CameraType::ALL
            .into_iter()
            .filter(|camera| self.has_media(segment, *camera))
            .collect()
    }
}

/// [`LogArchive`] backed by a local directory.
#[derive(Debug, Clone)]
pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LogArchive for DirArchive {
    fn root(&self) -> &Path {
        &self.root
    }

    fn list_entries(&self) -> io::Result<Vec<String>> {
        let read_dir = match std::fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!("Log archive {:?} does not exist", self.root);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let mut names = Vec::new();
        for entry in read_dir.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            // Segment names are ASCII; anything else can't be a segment.
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn has_media(&self, segment: &SegmentId, camera: CameraType) -> bool {
        self.media_path(segment, camera).is_file()
    }

    fn cameras(&self, segment: &SegmentId) -> Vec<CameraType> {
        let Ok(read_dir) = std::fs::read_dir(paths::segment_dir(&self.root, segment)) else {
            return Vec::new();
        };

        let mut cameras: Vec<CameraType> = read_dir
            .flatten()
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .and_then(CameraType::from_file_name)
            })
            .collect();
        cameras.sort_by_key(|camera| CameraType::ALL.iter().position(|c| c == camera));
        cameras
    }
}
