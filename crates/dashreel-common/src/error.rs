//! Common error types used throughout dashreel.
//!
//! Validation failures (malformed route, segment, or camera identifiers) are
//! produced before any filesystem access. Resolution failures describe an
//! identifier that is well formed but has nothing behind it in the archive.

use crate::types::CameraType;

/// Common error type for dashreel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A segment identifier does not have the `session--suffix--index` shape.
    #[error("Invalid segment: {0}")]
    InvalidSegment(String),

    /// A route identifier contains characters outside the allowed set.
    #[error("Invalid route: {0}")]
    InvalidRoute(String),

    /// A camera name is not one of the known camera types.
    #[error("Invalid camera type: {0}")]
    InvalidCamera(String),

    /// The route identifier has the wrong length or no segments in the archive.
    #[error("Route not found: {0}")]
    RouteNotFound(String),

    /// The segment (or every segment of a route) lacks the requested camera file.
    #[error("No {camera} footage for {target}")]
    MissingMedia {
        /// Segment or route the footage was requested for.
        target: String,
        /// Requested camera.
        camera: CameraType,
    },

    /// An I/O operation on the log archive failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new InvalidSegment error.
    pub fn invalid_segment<S: Into<String>>(msg: S) -> Self {
        Self::InvalidSegment(msg.into())
    }

    /// Create a new InvalidRoute error.
    pub fn invalid_route<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRoute(msg.into())
    }

    /// Create a new RouteNotFound error.
    pub fn route_not_found<S: Into<String>>(route: S) -> Self {
        Self::RouteNotFound(route.into())
    }

    /// Create a new MissingMedia error.
    pub fn missing_media<S: Into<String>>(target: S, camera: CameraType) -> Self {
        Self::MissingMedia {
            target: target.into(),
            camera,
        }
    }

    /// Whether this error was raised by identifier validation, before any I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidSegment(_) | Self::InvalidRoute(_) | Self::InvalidCamera(_)
        )
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
