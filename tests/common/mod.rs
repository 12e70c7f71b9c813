//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which builds a full [`AppContext`] over a
//! temporary log archive, a temporary parameter directory and a fake
//! transcoder script. The fake transcoder concatenates the files named by its
//! `-i` argument (plain path or `concat:a|b|...`) to stdout, so streaming can
//! be checked byte for byte without ffmpeg. Every invocation appends the
//! script's pid to a spawn log.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use dashreel::archive::{DirArchive, LogArchive};
use dashreel::config::Config;
use dashreel::params::FileParamStore;
use dashreel::server::{create_router, AppContext};
use dashreel_common::{CameraType, SegmentId};
use tempfile::TempDir;

/// A 20-character route id in `<session>--<suffix>` form.
pub const ROUTE: &str = "AAAAAAAA--AAAAAAAAAA";

/// Concatenate the inputs named by `-i`.
pub const CONCAT_BODY: &str = r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-i" ]; then shift; input="$1"; fi
  shift
done
case "$input" in
  concat:*) list="${input#concat:}" ;;
  *) list="$input" ;;
esac
IFS='|'
for f in $list; do cat "$f" || exit 1; done"#;

/// Archive wrapper counting every call that reaches the filesystem.
pub struct CountingArchive {
    inner: DirArchive,
    calls: Arc<AtomicUsize>,
}

impl LogArchive for CountingArchive {
    fn root(&self) -> &Path {
        self.inner.root()
    }

    fn list_entries(&self) -> std::io::Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_entries()
    }

    fn has_media(&self, segment: &SegmentId, camera: CameraType) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.has_media(segment, camera)
    }
}

pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: TempDir,
    archive_calls: Arc<AtomicUsize>,
}

impl TestHarness {
    /// Harness with the concatenating fake transcoder.
    pub fn new() -> Self {
        Self::with_transcoder(CONCAT_BODY)
    }

    /// Harness whose transcoder runs `body` as a `/bin/sh` script.
    pub fn with_transcoder(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let spawn_log = dir.path().join("spawns.log");
        let script = format!("echo $$ >> '{}'\n{body}", spawn_log.display());
        let ffmpeg = write_script(dir.path(), "ffmpeg", &script);
        Self::build(dir, ffmpeg)
    }

    /// Harness whose transcoder path does not exist.
    pub fn with_missing_transcoder() -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let ffmpeg = dir.path().join("no-such-ffmpeg");
        Self::build(dir, ffmpeg)
    }

    fn build(dir: TempDir, ffmpeg: PathBuf) -> Self {
        let archive_dir = dir.path().join("archive");
        let params_dir = dir.path().join("params");
        std::fs::create_dir_all(&archive_dir).unwrap();

        let mut config = Config::default();
        config.archive.log_root = archive_dir.clone();
        config.params.dir = params_dir.clone();
        config.transcoder.ffmpeg_path = Some(ffmpeg.clone());
        config.streaming.min_chunk_size = 1;

        let archive_calls = Arc::new(AtomicUsize::new(0));
        let archive = Arc::new(CountingArchive {
            inner: DirArchive::new(archive_dir),
            calls: archive_calls.clone(),
        });
        let params = Arc::new(FileParamStore::new(params_dir));
        let ctx = AppContext::new(config, archive, params, ffmpeg);

        Self {
            ctx,
            dir,
            archive_calls,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone(), None)
    }

    /// Serve the router on a random local port.
    pub async fn serve(&self) -> SocketAddr {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.dir.path().join("archive")
    }

    pub fn params_dir(&self) -> PathBuf {
        self.dir.path().join("params")
    }

    /// Create a segment directory with the given files.
    pub fn add_segment(&self, name: &str, files: &[(&str, &[u8])]) {
        let seg_dir = self.archive_dir().join(name);
        std::fs::create_dir_all(&seg_dir).unwrap();
        for (file, data) in files {
            std::fs::write(seg_dir.join(file), data).unwrap();
        }
    }

    /// Add `count` segments of [`ROUTE`] with distinct per-camera content,
    /// returning the expected concatenation for `camera`.
    pub fn add_route(&self, count: u32, size: usize, camera: CameraType) -> Vec<u8> {
        let mut expected = Vec::new();
        for i in 0..count {
            let mut files: Vec<(String, Vec<u8>)> = Vec::new();
            for cam in CameraType::ALL {
                files.push((cam.file_name(), segment_bytes(cam, i, size)));
            }
            let borrowed: Vec<(&str, &[u8])> = files
                .iter()
                .map(|(name, data)| (name.as_str(), data.as_slice()))
                .collect();
            self.add_segment(&format!("{ROUTE}--{i}"), &borrowed);
            expected.extend(segment_bytes(camera, i, size));
        }
        expected
    }

    /// Calls that reached the archive so far.
    pub fn archive_calls(&self) -> usize {
        self.archive_calls.load(Ordering::SeqCst)
    }

    /// Pids of every transcoder spawned so far.
    pub fn spawned_pids(&self) -> Vec<u32> {
        std::fs::read_to_string(self.dir.path().join("spawns.log"))
            .unwrap_or_default()
            .lines()
            .filter_map(|l| l.trim().parse().ok())
            .collect()
    }
}

/// Deterministic content for one camera file of one segment.
pub fn segment_bytes(camera: CameraType, index: u32, size: usize) -> Vec<u8> {
    let tag = camera.as_str().as_bytes();
    (0..size)
        .map(|i| tag[i % tag.len()].wrapping_add(index as u8).wrapping_add((i / 251) as u8))
        .collect()
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// Whether `pid` is alive and not a zombie.
pub fn is_running(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit_once(')')
            .map(|(_, rest)| !rest.trim_start().starts_with(['Z', 'X']))
            .unwrap_or(true),
        Err(_) => false,
    }
}

/// Poll until `pid` is gone or `limit` elapses.
pub async fn wait_until_gone(pid: u32, limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if !is_running(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    !is_running(pid)
}
