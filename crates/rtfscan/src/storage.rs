//! Scan directory and extracted-file lifecycle.
//!
//! Both types remove what they created when closed, unless the scan was told
//! to keep its temporary files.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use tempfile::{NamedTempFile, TempDir};
use tracing::debug;

/// The per-scan temporary directory extracted objects are written into.
#[derive(Debug)]
pub(crate) struct ScanDir {
    dir: TempDir,
    keep: bool,
}

impl ScanDir {
    pub(crate) fn create(root: &Path, keep: bool) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("rtfscan-")
            .tempdir_in(root)?;
        debug!("created scan directory {}", dir.path().display());
        Ok(Self { dir, keep })
    }

    pub(crate) fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Removes the directory and anything left in it, or leaves it on disk
    /// when retention is configured.
    pub(crate) fn close(self) -> io::Result<()> {
        if self.keep {
            let path = self.dir.keep();
            debug!("keeping scan directory {}", path.display());
            Ok(())
        } else {
            self.dir.close()
        }
    }
}

/// A temporary file receiving one embedded object's payload.
#[derive(Debug)]
pub(crate) struct ExtractedFile {
    file: NamedTempFile,
    written: u64,
}

impl ExtractedFile {
    pub(crate) fn create(dir: &Path) -> io::Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("object-")
            .suffix(".bin")
            .tempfile_in(dir)?;
        Ok(Self { file, written: 0 })
    }

    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }

    pub(crate) fn written(&self) -> u64 {
        self.written
    }

    pub(crate) fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }

    /// Closes the file, deleting it unless `keep` is set. Returns the path the
    /// file had, for diagnostics.
    pub(crate) fn dispose(self, keep: bool) -> (PathBuf, io::Result<()>) {
        let path = self.file.path().to_path_buf();
        let result = if keep {
            self.file.keep().map(|_| ()).map_err(|err| err.error)
        } else {
            self.file.close()
        };
        (path, result)
    }
}
