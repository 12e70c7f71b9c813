//! Error-to-HTTP response conversion for footage handlers.
//!
//! Handlers return `Result<T, FootageError>`; validation and lookup failures
//! become short plain-text markers, everything else a 500 that is logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub const ROUTE_NOT_FOUND: &str = "route not found";
pub const INVALID_SEGMENT: &str = "invalid segment";
pub const INVALID_CAMERA: &str = "invalid camera type";
pub const FOOTAGE_NOT_FOUND: &str = "footage not found";

/// Failure while serving footage, an HTML page, or a JSON listing.
#[derive(Debug, thiserror::Error)]
pub enum FootageError {
    #[error(transparent)]
    Archive(#[from] dashreel_common::Error),
    #[error(transparent)]
    Transcode(#[from] dashreel_av::Error),
    #[error("internal error: {0}")]
    Internal(String),
}

impl FootageError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Status code and response body marker.
    pub fn status_and_marker(&self) -> (StatusCode, &'static str) {
        use dashreel_common::Error as E;

        match self {
            Self::Archive(E::InvalidSegment(_)) => (StatusCode::BAD_REQUEST, INVALID_SEGMENT),
            Self::Archive(E::InvalidCamera(_)) => (StatusCode::BAD_REQUEST, INVALID_CAMERA),
            Self::Archive(E::InvalidRoute(_) | E::RouteNotFound(_)) => {
                (StatusCode::NOT_FOUND, ROUTE_NOT_FOUND)
            }
            Self::Archive(E::MissingMedia { .. }) => (StatusCode::NOT_FOUND, FOOTAGE_NOT_FOUND),
            Self::Archive(E::Io(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "archive unavailable"),
            Self::Transcode(dashreel_av::Error::Spawn { .. })
            | Self::Transcode(dashreel_av::Error::ToolNotFound { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "transcoder unavailable")
            }
            Self::Transcode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "stream failed"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal error"),
        }
    }
}

impl IntoResponse for FootageError {
    fn into_response(self) -> Response {
        let (status, marker) = self.status_and_marker();

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "Footage request failed");
        } else {
            tracing::debug!(status = %status, error = %self, "Footage request rejected");
        }

        (status, marker).into_response()
    }
}
