use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use dashreel_av::{SupervisorConfig, DEFAULT_CHUNK_SIZE, DEFAULT_FRAME_RATE};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub transcoder: TranscoderConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    #[serde(default)]
    pub params: ParamsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory served under `/static`
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveConfig {
    /// Directory holding one sub-directory per recorded segment
    #[serde(default = "default_log_root")]
    pub log_root: PathBuf,
}

fn default_log_root() -> PathBuf {
    PathBuf::from("/data/media/0/realdata")
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            log_root: default_log_root(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscoderConfig {
    /// Explicit ffmpeg binary; looked up on PATH when unset
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Frame rate passed to the transcoder for raw camera streams
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}

impl Default for TranscoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            frame_rate: default_frame_rate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StreamingConfig {
    #[serde(default = "default_chunk_size")]
    pub default_chunk_size: usize,

    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Milliseconds between SIGTERM and SIGKILL when stopping a transcoder
    #[serde(default = "default_term_grace_ms")]
    pub term_grace_ms: u64,

    /// Milliseconds allowed for a stopped transcoder to be reaped
    #[serde(default = "default_cleanup_budget_ms")]
    pub cleanup_budget_ms: u64,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_min_chunk_size() -> usize {
    64
}
fn default_max_chunk_size() -> usize {
    8 * 1024 * 1024
}
fn default_term_grace_ms() -> u64 {
    500
}
fn default_cleanup_budget_ms() -> u64 {
    2000
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            default_chunk_size: default_chunk_size(),
            min_chunk_size: default_min_chunk_size(),
            max_chunk_size: default_max_chunk_size(),
            term_grace_ms: default_term_grace_ms(),
            cleanup_budget_ms: default_cleanup_budget_ms(),
        }
    }
}

impl StreamingConfig {
    /// Chunk size for a request, falling back to the default and clamped to
    /// the configured bounds.
    pub fn chunk_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_chunk_size)
            .clamp(self.min_chunk_size, self.max_chunk_size)
    }

    pub fn supervisor(&self) -> SupervisorConfig {
        SupervisorConfig {
            term_grace: Duration::from_millis(self.term_grace_ms),
            cleanup_budget: Duration::from_millis(self.cleanup_budget_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParamsConfig {
    /// Directory with one file per parameter key
    #[serde(default = "default_params_dir")]
    pub dir: PathBuf,

    /// Key flipped by `/lock` and `/unlock`
    #[serde(default = "default_lock_key")]
    pub lock_key: String,
}

fn default_params_dir() -> PathBuf {
    PathBuf::from("/data/params/d")
}
fn default_lock_key() -> String {
    "RemoteLockDoors".to_string()
}

impl Default for ParamsConfig {
    fn default() -> Self {
        Self {
            dir: default_params_dir(),
            lock_key: default_lock_key(),
        }
    }
}
