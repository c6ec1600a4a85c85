//! File-backed object storage
//!
//! Objects live as plain files under a `.labnote` directory, addressed
//! by `/`-separated object paths (`runs/<id>`, `experiments/<id>`,
//! `workspace`). The directory is discovered by walking up from the
//! base directory, so any subdirectory of an initialized project
//! resolves to the same storage root.

mod repository;

pub use repository::Repository;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Name of the storage directory.
pub const DIR_NAME: &str = ".labnote";

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

fn find_storage_dir(base_dir: &Path) -> Option<PathBuf> {
    let mut check_dir = base_dir.canonicalize().ok()?;
    loop {
        let candidate = check_dir.join(DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }
        if !check_dir.pop() {
            return None;
        }
    }
}

/// Local file based object storage.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open the storage found by walking up from the current directory.
    ///
    /// # Errors
    ///
    /// [`Error::StorageNotFound`] when no `.labnote` directory exists on
    /// the path to the filesystem root.
    pub fn open() -> Result<Self> {
        Self::open_from(".")
    }

    /// Open the storage found by walking up from `base_dir`.
    ///
    /// # Errors
    ///
    /// [`Error::StorageNotFound`] when no `.labnote` directory exists on
    /// the path to the filesystem root.
    pub fn open_from(base_dir: impl AsRef<Path>) -> Result<Self> {
        find_storage_dir(base_dir.as_ref()).map_or_else(
            || {
                Err(Error::StorageNotFound {
                    dir: DIR_NAME.to_string(),
                })
            },
            |root| {
                debug!(root = %root.display(), "opened storage");
                Ok(Self { root })
            },
        )
    }

    /// Create a `.labnote` directory in the current directory and open
    /// it.
    ///
    /// # Errors
    ///
    /// Propagates the underlying IO failure, including when the
    /// directory already exists.
    pub fn initialize() -> Result<Self> {
        Self::initialize_at(".")
    }

    /// Create a `.labnote` directory under `base_dir` and open it.
    ///
    /// # Errors
    ///
    /// Propagates the underlying IO failure, including when the
    /// directory already exists.
    pub fn initialize_at(base_dir: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir(base_dir.as_ref().join(DIR_NAME))?;
        Self::open_from(base_dir)
    }

    /// The resolved storage root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_file(&self, obj_path: &str) -> Result<PathBuf> {
        let segments: Vec<&str> = obj_path.split('/').collect();
        if segments
            .iter()
            .any(|segment| segment.is_empty() || *segment == "." || *segment == "..")
        {
            return Err(Error::InvalidObjectPath {
                path: obj_path.to_string(),
            });
        }
        let mut file_path = self.root.clone();
        for segment in segments {
            file_path.push(segment);
        }
        Ok(file_path)
    }

    /// Save a text object, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidObjectPath`] for malformed paths; IO failures
    /// otherwise.
    pub fn save(&self, obj_path: &str, data: &str) -> Result<()> {
        let file_path = self.object_file(obj_path)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, data)?;
        debug!(obj_path, "saved object");
        Ok(())
    }

    /// Get a text object.
    ///
    /// # Errors
    ///
    /// [`Error::ObjectNotFound`] for a missing object,
    /// [`Error::InvalidObjectPath`] for malformed paths.
    pub fn get(&self, obj_path: &str) -> Result<String> {
        let file_path = self.object_file(obj_path)?;
        match fs::read_to_string(&file_path) {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(Error::ObjectNotFound {
                path: obj_path.to_string(),
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove an object, pruning its directory when emptied.
    ///
    /// # Errors
    ///
    /// [`Error::ObjectNotFound`] for a missing object,
    /// [`Error::InvalidObjectPath`] for malformed paths.
    pub fn remove(&self, obj_path: &str) -> Result<()> {
        let file_path = self.object_file(obj_path)?;
        match fs::remove_file(&file_path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::ObjectNotFound {
                    path: obj_path.to_string(),
                })
            }
            Err(err) => return Err(err.into()),
        }
        debug!(obj_path, "removed object");

        if let Some(parent) = file_path.parent() {
            if parent != self.root && fs::read_dir(parent)?.next().is_none() {
                fs::remove_dir(parent)?;
            }
        }
        Ok(())
    }

    /// List object paths under `dir` whose file name starts with
    /// `prefix`, sorted. A missing directory lists as empty.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidObjectPath`] for malformed paths; IO failures
    /// otherwise.
    pub fn find(&self, dir: &str, prefix: &str) -> Result<Vec<String>> {
        let dir_path = self.object_file(dir)?;
        if !dir_path.is_dir() {
            return Ok(Vec::new());
        }

        let mut obj_paths = Vec::new();
        for entry in fs::read_dir(&dir_path)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with(prefix) && !name.ends_with(".lock") {
                obj_paths.push(format!("{dir}/{name}"));
            }
        }
        obj_paths.sort();
        Ok(obj_paths)
    }

    /// Acquire an exclusive lock scoped to `obj_path`, blocking until
    /// available. The lock is released when the guard drops.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidObjectPath`] for malformed paths; IO failures
    /// otherwise.
    pub fn lock(&self, obj_path: &str) -> Result<LockGuard> {
        let file_path = self.object_file(obj_path)?;
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_path = file_path.with_file_name(format!(
            "{}.lock",
            file_path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
        ));

        loop {
            match fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(_) => {
                    debug!(obj_path, "acquired lock");
                    return Ok(LockGuard { path: lock_path });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Exclusive lock on a storage object, released on drop.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), %err, "failed to release lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_without_storage_dir() {
        let base = tempfile::tempdir().unwrap();
        let err = FileStorage::open_from(base.path()).unwrap_err();
        assert!(matches!(err, Error::StorageNotFound { .. }));
    }

    #[test]
    fn test_discovery_walks_up() {
        let base = tempfile::tempdir().unwrap();
        FileStorage::initialize_at(base.path()).unwrap();

        let nested = base.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let storage = FileStorage::open_from(&nested).unwrap();
        assert!(storage.root().ends_with(DIR_NAME));
    }

    #[test]
    fn test_save_get_remove_roundtrip() {
        let base = tempfile::tempdir().unwrap();
        let storage = FileStorage::initialize_at(base.path()).unwrap();

        storage.save("runs/a111", "{}").unwrap();
        assert_eq!(storage.get("runs/a111").unwrap(), "{}");

        storage.remove("runs/a111").unwrap();
        let err = storage.get("runs/a111").unwrap_err();
        assert!(matches!(err, Error::ObjectNotFound { .. }));
        assert!(!base.path().join(DIR_NAME).join("runs").exists());
    }

    #[test]
    fn test_find_matches_prefix_only() {
        let base = tempfile::tempdir().unwrap();
        let storage = FileStorage::initialize_at(base.path()).unwrap();
        storage.save("runs/a111", "{}").unwrap();
        storage.save("runs/a222", "{}").unwrap();
        storage.save("runs/b333", "{}").unwrap();

        assert!(storage.find("runs", "c").unwrap().is_empty());
        assert_eq!(storage.find("runs", "a1").unwrap(), ["runs/a111"]);
        assert_eq!(storage.find("runs", "a").unwrap(), ["runs/a111", "runs/a222"]);
    }

    #[test]
    fn test_empty_path_segment_rejected() {
        let base = tempfile::tempdir().unwrap();
        let storage = FileStorage::initialize_at(base.path()).unwrap();
        let err = storage.save("runs//a", "{}").unwrap_err();
        assert!(matches!(err, Error::InvalidObjectPath { .. }));
    }

    #[test]
    fn test_lock_guard_releases_on_drop() {
        let base = tempfile::tempdir().unwrap();
        let storage = FileStorage::initialize_at(base.path()).unwrap();

        let lock_path = base.path().join(DIR_NAME).join("workspace.lock");
        {
            let _guard = storage.lock("workspace").unwrap();
            assert!(lock_path.exists());
        }
        assert!(!lock_path.exists());
    }
}
