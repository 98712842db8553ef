// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Advisory file lock, grounded on the teacher's daemon startup lock
//! (`fs2::FileExt::try_lock_exclusive` on a marker file before touching
//! shared state). Per §4.1/§4.7, this is used only by the Boot watchdog —
//! everything else relies on the multiplexer's own session-id uniqueness.

use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock already held: {0}")]
    Held(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A held advisory exclusive lock on `path`. Released on drop.
///
/// Distinguished from mere existence of the marker file: the file may
/// exist (e.g. left over from a clean shutdown) without anyone holding
/// the lock, and `try_acquire` succeeds in that case.
pub struct AtomicLock {
    file: File,
    path: PathBuf,
}

impl AtomicLock {
    /// Try to acquire the lock non-blocking. Returns `LockError::Held` if
    /// another process holds it — callers report this, they don't queue.
    pub fn try_acquire(path: impl Into<PathBuf>) -> Result<Self, LockError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new().write(true).create(true).truncate(false).open(&path)?;
        file.try_lock_exclusive().map_err(|_| LockError::Held(path.clone()))?;
        Ok(Self { file, path })
    }

    /// Overwrite the marker file's contents (e.g. with the holder's PID)
    /// now that the lock is held.
    pub fn write_marker(&mut self, contents: &str) -> std::io::Result<()> {
        use std::io::{Seek, SeekFrom, Write};
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(contents.as_bytes())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for AtomicLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn second_acquire_fails_while_first_is_held() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("boot.lock");
        let _first = AtomicLock::try_acquire(&path).unwrap();
        let second = AtomicLock::try_acquire(&path);
        assert!(matches!(second, Err(LockError::Held(_))));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("boot.lock");
        {
            let _first = AtomicLock::try_acquire(&path).unwrap();
        }
        let second = AtomicLock::try_acquire(&path);
        assert!(second.is_ok());
    }

    #[test]
    fn marker_file_existing_without_lock_does_not_block() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("boot.lock");
        std::fs::write(&path, "stale pid from a crashed run").unwrap();
        let lock = AtomicLock::try_acquire(&path);
        assert!(lock.is_ok());
    }

    #[test]
    fn write_marker_records_holder_pid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("boot.lock");
        let mut lock = AtomicLock::try_acquire(&path).unwrap();
        lock.write_marker(&format!("{}", std::process::id())).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, format!("{}", std::process::id()));
    }
}
