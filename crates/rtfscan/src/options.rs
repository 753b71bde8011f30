//! Scan configuration.

use std::path::PathBuf;

/// Default bound on each read from a [`ByteSource`](crate::ByteSource).
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Configuration for an [`RtfScanner`](crate::RtfScanner).
///
/// The options are read once per scan and never change while it runs, so a
/// single value can be shared by scans running on different threads.
///
/// # Examples
///
/// ```rust
/// use rtfscan::{RtfScanner, ScanOptions};
///
/// let scanner = RtfScanner::new(ScanOptions {
///     keep_temp_files: true,
///     ..Default::default()
/// });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScanOptions {
    /// Whether extracted files and the scan directory survive the scan.
    ///
    /// Useful when debugging a detection: every object handed to the content
    /// scanner stays on disk under the scan directory.
    ///
    /// # Default
    ///
    /// `false`
    pub keep_temp_files: bool,

    /// Parent of the per-scan temporary directory.
    ///
    /// # Default
    ///
    /// `None`, meaning [`std::env::temp_dir`].
    pub temp_root: Option<PathBuf>,

    /// Upper bound on the number of bytes requested from the source per read.
    ///
    /// Literal text runs never span a chunk boundary, so this also bounds the
    /// size of each run handed to the object decoder. Zero is treated as one.
    ///
    /// # Default
    ///
    /// `8192`
    pub chunk_size: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            keep_temp_files: false,
            temp_root: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl ScanOptions {
    pub(crate) fn temp_root(&self) -> PathBuf {
        self.temp_root.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub(crate) fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}
