//! Fatal scan errors.

use std::{io, path::PathBuf};

use thiserror::Error;

/// A fatal condition that aborts a scan.
///
/// `E` is the error type of the [`ContentScanner`](crate::ContentScanner)
/// extracted objects are handed to. Anomalies in the RTF stream itself
/// (unbalanced braces, runaway control words, a wrong magic number) never
/// surface here: they are logged and parsing resynchronises.
///
/// The scan directory and every open extracted file are cleaned up before any
/// of these reach the caller.
#[derive(Error, Debug)]
pub enum ScanError<E> {
    /// A fallible reservation failed.
    #[error("out of memory while growing the {what}")]
    OutOfMemory {
        /// The buffer that could not grow.
        what: &'static str,
    },

    /// The scan-scoped temporary directory could not be created.
    #[error("cannot create a scan directory under {}", .path.display())]
    TempDir {
        /// Parent directory the scan directory was requested in.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A temporary file for an extracted object could not be created.
    #[error("cannot create an extracted file in {}", .path.display())]
    TempFile {
        /// The scan directory.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// Writing an extracted object to disk failed.
    #[error("cannot write extracted file {}", .path.display())]
    Write {
        /// Path of the extracted file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A scanned temporary file could not be deleted.
    #[error("cannot remove extracted file {}", .path.display())]
    Unlink {
        /// Path of the extracted file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The byte source failed.
    #[error("cannot read input at offset {offset}")]
    Read {
        /// Offset of the failed read.
        offset: u64,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The external scanner or OLE1 decoder reported an error.
    #[error("scanner error: {0}")]
    Scanner(#[source] E),
}
