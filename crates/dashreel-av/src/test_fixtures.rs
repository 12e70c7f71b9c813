//! Shell-script stand-ins for the transcoder, used by unit tests.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Concatenates the files named by `-i` (plain path or `concat:a|b`) to stdout.
pub const FAKE_TRANSCODER: &str = r#"while [ $# -gt 0 ]; do
  if [ "$1" = "-i" ]; then shift; input="$1"; fi
  shift
done
case "$input" in
  concat:*) list="${input#concat:}" ;;
  *) list="$input" ;;
esac
IFS='|'
for f in $list; do cat "$f" || exit 1; done"#;

/// Write an executable `/bin/sh` script into `dir`.
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
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
