//! Key/value parameter store for device flags.
//!
//! Each parameter is a file named after its key; booleans are stored as `1`
//! or `0`. Writes go to a temporary file in the same directory which is then
//! renamed over the old value, so readers never see a partial write.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Persistent boolean flags shared with other on-device processes.
pub trait ParamStore: Send + Sync {
    fn put_bool(&self, key: &str, value: bool) -> Result<()>;

    /// `None` when the key has never been written.
    fn get_bool(&self, key: &str) -> Result<Option<bool>>;
}

/// [`ParamStore`] keeping one file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileParamStore {
    dir: PathBuf,
}

impl FileParamStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
        if !valid {
            anyhow::bail!("Invalid parameter key: {:?}", key);
        }
        Ok(self.dir.join(key))
    }
}

impl ParamStore for FileParamStore {
    fn put_bool(&self, key: &str, value: bool) -> Result<()> {
        let path = self.key_path(key)?;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create params dir: {:?}", self.dir))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to create temp file in {:?}", self.dir))?;
        tmp.write_all(if value { b"1" } else { b"0" })?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to write param {:?}", path))?;

        tracing::info!("Param {} set to {}", key, value);
        Ok(())
    }

    fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        let path = self.key_path(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes.first() == Some(&b'1'))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read param {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileParamStore::new(dir.path().join("params"));

        assert_eq!(store.get_bool("RemoteLockDoors").unwrap(), None);

        store.put_bool("RemoteLockDoors", true).unwrap();
        assert_eq!(store.get_bool("RemoteLockDoors").unwrap(), Some(true));
        assert_eq!(
            std::fs::read(dir.path().join("params/RemoteLockDoors")).unwrap(),
            b"1"
        );

        store.put_bool("RemoteLockDoors", false).unwrap();
        assert_eq!(store.get_bool("RemoteLockDoors").unwrap(), Some(false));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileParamStore::new(dir.path());
        store.put_bool("A", true).unwrap();
        store.put_bool("A", false).unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["A"]);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileParamStore::new(dir.path());
        for key in ["", "../x", "a/b", ".hidden"] {
            assert!(store.put_bool(key, true).is_err(), "{key:?}");
        }
    }
}
