//! Camera types and the media formats they record.
//!
//! The road-facing low resolution camera writes an MPEG transport stream; every
//! other camera writes a raw HEVC elementary stream. The mapping is fixed and
//! decides both the file looked up in a segment and how the transcoder is told
//! to read it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Container/stream format of a camera's segment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// MPEG transport stream (`.ts`), self-describing.
    TransportStream,
    /// Raw HEVC elementary stream (`.hevc`), needs an explicit demuxer and rate.
    Hevc,
}

impl SourceFormat {
    /// File extension used for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::TransportStream => "ts",
            Self::Hevc => "hevc",
        }
    }
}

/// Onboard camera whose footage is streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    /// Low resolution road camera preview.
    QCamera,
    /// Road-facing camera.
    FCamera,
    /// Driver-facing camera.
    DCamera,
    /// Wide-angle road camera.
    ECamera,
}

impl CameraType {
    /// Every camera type, in display order.
    pub const ALL: [CameraType; 4] = [
        CameraType::QCamera,
        CameraType::FCamera,
        CameraType::DCamera,
        CameraType::ECamera,
    ];

    /// Lowercase camera name as used in URLs and file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QCamera => "qcamera",
            Self::FCamera => "fcamera",
            Self::DCamera => "dcamera",
            Self::ECamera => "ecamera",
        }
    }

    /// Format of the file this camera records into.
    pub fn source_format(&self) -> SourceFormat {
        match self {
            Self::QCamera => SourceFormat::TransportStream,
            Self::FCamera | Self::DCamera | Self::ECamera => SourceFormat::Hevc,
        }
    }

    /// File extension of this camera's segment file.
    pub fn extension(&self) -> &'static str {
        self.source_format().extension()
    }

    /// Name of this camera's file inside a segment directory, e.g. `fcamera.hevc`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.as_str(), self.extension())
    }

    /// Recover the camera from a segment file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|camera| camera.file_name() == name)
    }
}

impl fmt::Display for CameraType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CameraType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "qcamera" => Ok(Self::QCamera),
            "fcamera" => Ok(Self::FCamera),
            "dcamera" => Ok(Self::DCamera),
            "ecamera" => Ok(Self::ECamera),
            _ => Err(Error::InvalidCamera(s.to_string())),
        }
    }
}
