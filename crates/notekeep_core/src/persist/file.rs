//! Flat-file JSON backend.
//!
//! # Responsibility
//! - Map a collection key onto `<root>/<key>.json`.
//! - Serialize concurrent writers on the same key with a lock file.
//!
//! # Invariants
//! - Readers never observe a partially written payload (temp file + rename).
//! - Lock acquisition is bounded by `lock_timeout`.
//! - A lock file older than `stale_lock_age` belongs to a dead writer and is
//!   broken.
//! - The lock file is removed when the guard drops, including on error paths.

use super::{PersistError, PersistResult, PersistenceAdapter};
use log::{error, info, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant, SystemTime};

pub(crate) const BACKEND_NAME: &str = "file";
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_STALE_LOCK_AGE: Duration = Duration::from_secs(60);
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);
const FILE_EXTENSION: &str = "json";

/// JSON file backend rooted at a directory.
#[derive(Debug, Clone)]
pub struct FileAdapter {
    root: PathBuf,
    lock_timeout: Duration,
    stale_lock_age: Duration,
}

impl FileAdapter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            stale_lock_age: DEFAULT_STALE_LOCK_AGE,
        }
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Lock files last modified longer ago than `age` are removed and retaken.
    ///
    /// Keep this well above the longest expected save.
    pub fn with_stale_lock_age(mut self, age: Duration) -> Self {
        self.stale_lock_age = age;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves the data file for `key`.
    ///
    /// Keys are plain file names; a trailing `.json` is optional.
    pub fn path_for(&self, key: &str) -> PersistResult<PathBuf> {
        let trimmed = key.trim();
        if trimmed.is_empty()
            || trimmed == "."
            || trimmed == ".."
            || trimmed.contains(['/', '\\', '\0'])
        {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        let file_name = if Path::new(trimmed)
            .extension()
            .is_some_and(|ext| ext == FILE_EXTENSION)
        {
            trimmed.to_string()
        } else {
            format!("{trimmed}.{FILE_EXTENSION}")
        };
        Ok(self.root.join(file_name))
    }

    fn acquire_lock(&self, key: &str, data_path: &Path) -> PersistResult<LockGuard> {
        let lock_path = sidecar_path(data_path, "lock");
        let started_at = Instant::now();
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(_) => return Ok(LockGuard { path: lock_path }),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                    if let Some(age) = self.stale_age(&lock_path) {
                        warn!(
                            "event=persist_lock module=persist status=recovered backend=file key={} lock_age_ms={}",
                            key,
                            age.as_millis()
                        );
                        match fs::remove_file(&lock_path) {
                            Ok(()) => continue,
                            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                            Err(err) => return Err(PersistError::unavailable(BACKEND_NAME, err)),
                        }
                    }
                    let waited = started_at.elapsed();
                    if waited >= self.lock_timeout {
                        warn!(
                            "event=persist_lock module=persist status=error backend=file key={} duration_ms={} error_code=lock_timeout",
                            key,
                            waited.as_millis()
                        );
                        return Err(PersistError::Timeout {
                            key: key.to_string(),
                            waited,
                        });
                    }
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(err) => return Err(PersistError::unavailable(BACKEND_NAME, err)),
            }
        }
    }

    /// Age of the lock at `lock_path` when it is past `stale_lock_age`.
    fn stale_age(&self, lock_path: &Path) -> Option<Duration> {
        let modified = fs::metadata(lock_path).and_then(|meta| meta.modified()).ok()?;
        let age = SystemTime::now().duration_since(modified).ok()?;
        (age >= self.stale_lock_age).then_some(age)
    }
}

impl PersistenceAdapter for FileAdapter {
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn retrieve(&self, key: &str) -> PersistResult<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(payload) => Ok(Some(payload)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                error!(
                    "event=persist_read module=persist status=error backend=file key={} error={}",
                    key, err
                );
                Err(PersistError::unavailable(BACKEND_NAME, err))
            }
        }
    }

    fn read_modify_write(
        &self,
        key: &str,
        update: &mut dyn FnMut(Option<String>) -> PersistResult<String>,
    ) -> PersistResult<()> {
        let started_at = Instant::now();
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)
            .map_err(|err| PersistError::unavailable(BACKEND_NAME, err))?;

        let _lock = self.acquire_lock(key, &path)?;
        let current = self.retrieve(key)?;
        let next = update(current)?;

        if let Err(err) = write_atomically(&path, next.as_bytes()) {
            error!(
                "event=persist_write module=persist status=error backend=file key={} duration_ms={} error={}",
                key,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(PersistError::unavailable(BACKEND_NAME, err));
        }

        info!(
            "event=persist_write module=persist status=ok backend=file key={} bytes={} duration_ms={}",
            key,
            next.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!(
                "event=persist_unlock module=persist status=error backend=file path={} error={}",
                self.path.display(),
                err
            );
        }
    }
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp_path = sidecar_path(path, "tmp");
    let result = (|| {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
