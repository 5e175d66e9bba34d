//! File-based locking using flock(2) for concurrent store access.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// A held lock on the store. Released on drop (file close releases flock).
pub struct FileLock {
    _file: File,
}

impl FileLock {
    /// Acquire an exclusive lock for writers, blocking until available.
    pub fn exclusive(path: &Path) -> io::Result<Self> {
        let file = open_lock_file(path)?;
        file.lock_exclusive()?;
        Ok(Self { _file: file })
    }

    /// Acquire a shared lock for readers, blocking while a writer holds it.
    pub fn shared(path: &Path) -> io::Result<Self> {
        let file = open_lock_file(path)?;
        file.lock_shared()?;
        Ok(Self { _file: file })
    }
}

fn open_lock_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
}
