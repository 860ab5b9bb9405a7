//! Repository-wide write lock
//!
//! Every mutating operation holds an exclusive advisory lock on `.cit/lock` for its whole
//! duration. The lock is released when the guard is dropped, on every exit path.

use anyhow::Context;
use file_guard::{FileGuard, Lock};
use std::fs::{File, OpenOptions};
use std::path::Path;

pub const LOCK_FILE_NAME: &str = "lock";

pub struct RepositoryLock {
    _guard: FileGuard<Box<File>>,
}

impl RepositoryLock {
    /// Block until the exclusive lock on `<metadata_dir>/lock` is acquired
    pub fn acquire(metadata_dir: &Path) -> anyhow::Result<Self> {
        let lock_path = metadata_dir.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file at {:?}", lock_path))?;

        let guard = file_guard::lock(Box::new(file), Lock::Exclusive, 0, 1)
            .with_context(|| format!("failed to lock {:?}", lock_path))?;
        tracing::trace!(path = ?lock_path, "acquired repository lock");

        Ok(RepositoryLock { _guard: guard })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;

    #[test]
    fn test_lock_is_reacquired_after_drop() {
        let dir = TempDir::new().unwrap();

        {
            let _lock = RepositoryLock::acquire(dir.path()).unwrap();
            assert!(dir.path().join(LOCK_FILE_NAME).exists());
        }

        let _lock = RepositoryLock::acquire(dir.path()).unwrap();
    }
}
