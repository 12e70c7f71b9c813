//! Transcode invocation building.
//!
//! A [`TranscodePipeline`] describes one transcoder run: which segment files to
//! read, in which order, and how to rewrap them into a fragmented MP4 written to
//! stdout. Building one is pure; nothing here touches the filesystem or spawns
//! a process.
//!
//! Multiple inputs are joined with ffmpeg's `concat:` protocol, which reads the
//! files back to back as one byte stream. Transport streams and raw HEVC
//! elementary streams both tolerate that, so no re-encoding is needed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use dashreel_common::{CameraType, SourceFormat};
use tokio::process::Command;

use crate::{Error, Result};

/// Default number of bytes read from the transcoder per chunk (512 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 512 * 1024;

/// Frame rate the cameras record at; raw HEVC carries no timing of its own.
pub const DEFAULT_FRAME_RATE: u32 = 20;

/// Separator between inputs of the `concat:` protocol.
const CONCAT_SEPARATOR: char = '|';

/// Fragmented MP4 flags so the muxer never needs to seek back in its output.
const MOVFLAGS: &str = "frag_keyframe+empty_moov+default_base_moof";

/// Builds [`TranscodePipeline`]s for a given transcoder binary.
///
/// # Example
///
/// ```
/// use dashreel_av::PipelineBuilder;
/// use dashreel_common::CameraType;
/// use std::path::PathBuf;
///
/// let pipeline = PipelineBuilder::new("ffmpeg")
///     .frame_rate(20)
///     .build(vec![PathBuf::from("/data/a--b--0/qcamera.ts")], CameraType::QCamera)
///     .unwrap();
/// assert!(!pipeline.is_concat());
/// ```
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    program: PathBuf,
    frame_rate: u32,
    chunk_size: usize,
}

impl PipelineBuilder {
    /// Create a builder for the given transcoder program.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            frame_rate: DEFAULT_FRAME_RATE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the input frame rate passed to the transcoder.
    pub fn frame_rate(mut self, fps: u32) -> Self {
        self.frame_rate = fps;
        self
    }

    /// Set the default output chunk size carried by built pipelines.
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Transcoder program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Build a pipeline over `inputs`, in the given order.
    ///
    /// A single input is remuxed on its own; several are concatenated first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Build`] if `inputs` is empty, if a path is relative, or
    /// if a path contains the concat separator `|`.
    pub fn build(&self, inputs: Vec<PathBuf>, camera: CameraType) -> Result<TranscodePipeline> {
        if inputs.is_empty() {
            return Err(Error::build("no input files"));
        }

        for input in &inputs {
            if !input.is_absolute() {
                return Err(Error::build(format!(
                    "input path is not absolute: {}",
                    input.display()
                )));
            }
            if input.to_string_lossy().contains(CONCAT_SEPARATOR) {
                return Err(Error::build(format!(
                    "input path contains '{CONCAT_SEPARATOR}': {}",
                    input.display()
                )));
            }
        }

        Ok(TranscodePipeline {
            program: self.program.clone(),
            inputs,
            camera,
            chunk_size: self.chunk_size,
            frame_rate: self.frame_rate,
        })
    }

    /// Build a pipeline that remuxes a single file.
    pub fn single(&self, input: PathBuf, camera: CameraType) -> Result<TranscodePipeline> {
        self.build(vec![input], camera)
    }
}

/// A request-scoped transcoder invocation.
///
/// Consumed by [`ProcessSupervisor::start`](crate::ProcessSupervisor::start).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodePipeline {
    program: PathBuf,
    inputs: Vec<PathBuf>,
    camera: CameraType,
    chunk_size: usize,
    frame_rate: u32,
}

impl TranscodePipeline {
    /// Transcoder program path.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Short program name for logs and errors.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Input files, in playback order.
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Camera the inputs were recorded by.
    pub fn camera(&self) -> CameraType {
        self.camera
    }

    /// Default chunk size for reading this pipeline's output.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Override the chunk size for this request.
    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes;
        self
    }

    /// Whether the inputs are concatenated (more than one file).
    pub fn is_concat(&self) -> bool {
        self.inputs.len() > 1
    }

    /// The value passed to `-i`: a plain path, or `concat:a|b|...`.
    pub fn input_spec(&self) -> OsString {
        if !self.is_concat() {
            return self.inputs[0].clone().into_os_string();
        }

        let mut spec = OsString::from("concat:");
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                spec.push(CONCAT_SEPARATOR.to_string());
            }
            spec.push(input.as_os_str());
        }
        spec
    }

    /// Full argument list, excluding the program itself.
    pub fn args(&self) -> Vec<OsString> {
        let hevc = self.camera.source_format() == SourceFormat::Hevc;

        let mut args: Vec<OsString> =
            ["-hide_banner", "-nostdin", "-loglevel", "error"].map(OsString::from).into();
        if hevc {
            args.extend(["-f", "hevc"].map(OsString::from));
        }
        args.extend([
            OsString::from("-r"),
            OsString::from(self.frame_rate.to_string()),
            OsString::from("-i"),
            self.input_spec(),
        ]);
        args.extend(["-c", "copy", "-map", "0"].map(OsString::from));
        if hevc {
            // Tag as hvc1 so browsers accept the HEVC track.
            args.extend(["-tag:v", "hvc1"].map(OsString::from));
        }
        args.extend(["-f", "mp4", "-movflags", MOVFLAGS, "pipe:1"].map(OsString::from));
        args
    }

    /// A ready-to-spawn command with stdout piped and stdin closed.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}
