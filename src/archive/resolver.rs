//! Route to segment resolution.

use dashreel_common::{CameraType, Error, Result, RouteId, SegmentId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::LogArchive;

/// Segments of a route that have footage for one camera, in playback order.
#[derive(Debug, Clone)]
pub struct RouteMedia {
    pub route: RouteId,
    pub camera: CameraType,
    pub segments: Vec<SegmentId>,
    pub paths: Vec<PathBuf>,
}

/// A segment and the cameras it has footage for.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSummary {
    pub id: SegmentId,
    pub index: u32,
    pub cameras: Vec<CameraType>,
}

/// Looks up routes and their segments in a [`LogArchive`].
///
/// Identifiers are validated before the archive is touched. All methods do
/// blocking I/O.
#[derive(Clone)]
pub struct RouteResolver {
    archive: Arc<dyn LogArchive>,
}

impl RouteResolver {
    pub fn new(archive: Arc<dyn LogArchive>) -> Self {
        Self { archive }
    }

    /// Segments of `route` in ascending index order.
    ///
    /// # Errors
    ///
    /// [`Error::RouteNotFound`] for a wrong-length id or a route without
    /// segments, [`Error::InvalidRoute`] for disallowed characters.
    pub fn resolve(&self, route: &str) -> Result<Vec<SegmentId>> {
        let route = RouteId::parse(route)?;
        self.resolve_id(&route)
    }

    fn resolve_id(&self, route: &RouteId) -> Result<Vec<SegmentId>> {
        let mut segments: Vec<SegmentId> = self
            .archive
            .list_entries()?
            .iter()
            .filter_map(|name| SegmentId::parse(name).ok())
            .filter(|segment| segment.belongs_to(route))
            .collect();

        segments.sort_by_key(SegmentId::index);

        if segments.is_empty() {
            return Err(Error::route_not_found(route.as_str()));
        }

        tracing::debug!("Route {} has {} segment(s)", route, segments.len());
        Ok(segments)
    }

    /// Every route in the archive, newest first.
    ///
    /// A segment whose `<boot-session>--<route-suffix>` name is not a valid
    /// route id is listed under its route suffix when that one is.
    pub fn all_routes(&self) -> Result<Vec<RouteId>> {
        let routes: BTreeSet<RouteId> = self
            .archive
            .list_entries()?
            .iter()
            .filter_map(|name| SegmentId::parse(name).ok())
            .filter_map(|segment| {
                RouteId::parse(&segment.route_name())
                    .or_else(|_| RouteId::parse(segment.suffix()))
                    .ok()
            })
            .collect();

        Ok(routes.into_iter().rev().collect())
    }

    /// Media files of `route` for `camera`.
    ///
    /// Segments without that camera's file are skipped.
    ///
    /// # Errors
    ///
    /// As [`resolve`](Self::resolve), plus [`Error::MissingMedia`] when no
    /// segment has the camera's file.
    pub fn media_for_route(&self, route: &str, camera: CameraType) -> Result<RouteMedia> {
        let route = RouteId::parse(route)?;
        let mut segments = Vec::new();
        let mut paths = Vec::new();

        for segment in self.resolve_id(&route)? {
            if !self.archive.has_media(&segment, camera) {
                tracing::warn!("Segment {} has no {} footage, skipping", segment, camera);
                continue;
            }
            paths.push(self.archive.media_path(&segment, camera));
            segments.push(segment);
        }

        if segments.is_empty() {
            return Err(Error::missing_media(route.as_str(), camera));
        }

        Ok(RouteMedia {
            route,
            camera,
            segments,
            paths,
        })
    }

    /// Media file of a single segment for `camera`.
    pub fn segment_media(&self, segment: &SegmentId, camera: CameraType) -> Result<PathBuf> {
        if !self.archive.has_media(segment, camera) {
            return Err(Error::missing_media(segment.to_string(), camera));
        }
        Ok(self.archive.media_path(segment, camera))
    }

    /// Segments of `route` with the cameras each one has.
    pub fn segment_summaries(&self, route: &str) -> Result<Vec<SegmentSummary>> {
        Ok(self
            .resolve(route)?
            .into_iter()
            .map(|id| SegmentSummary {
                index: id.index(),
                cameras: self.archive.cameras(&id),
                id,
            })
            .collect())
    }
}
