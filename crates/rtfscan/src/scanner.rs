//! The boundary to the content scanner that inspects extracted objects.

use std::{convert::Infallible, path::Path};

use tracing::debug;

use crate::{error::ScanError, storage::ExtractedFile};

/// Outcome of scanning one extracted object, or a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Verdict {
    /// Nothing was found; the scan keeps looking for further objects.
    Clean,
    /// The scanner matched a signature. Scanning stops here.
    Infected {
        /// Name of the matched signature.
        name: String,
    },
}

impl Verdict {
    /// Returns `true` if the verdict is [`Clean`].
    ///
    /// [`Clean`]: Verdict::Clean
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }
}

/// Which decode path an extracted object is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanPath {
    /// The payload started with the OLE2 compound-file signature and was
    /// written verbatim; it goes to [`ContentScanner::scan`].
    Generic,
    /// The payload is a legacy OLE1 stream: the file holds a 4-byte
    /// little-endian length followed by the payload, and goes to
    /// [`ContentScanner::scan_ole10`].
    Ole10,
}

/// An extracted object on disk, as handed to a [`ContentScanner`].
///
/// The file is deleted once the scanner returns, unless the scan keeps its
/// temporary files; scanners must read it before returning.
#[derive(Debug, Clone, Copy)]
pub struct ExtractedObject<'a> {
    /// Location of the extracted file.
    pub path: &'a Path,
    /// Payload length declared by the object header.
    pub declared_len: u32,
    /// Number of bytes actually written to the file, including the OLE1
    /// length header when present.
    pub written: u64,
    /// The decode path selected for this object.
    pub scan_path: ScanPath,
    /// `false` when the enclosing group or the document ended before the
    /// declared payload length was reached.
    pub complete: bool,
}

/// The external scanner embedded objects are handed to.
///
/// Implementations decide what a payload contains; the RTF scanner only
/// extracts. Returning a non-clean [`Verdict`] stops the scan and becomes its
/// result. Returning an error aborts the scan with
/// [`ScanError::Scanner`](crate::ScanError::Scanner).
pub trait ContentScanner {
    /// Error reported by the scanner itself.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Scans an object whose payload is written verbatim.
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn scan(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error>;

    /// Decodes a legacy OLE1 stream and scans what it contains.
    ///
    /// # Errors
    ///
    /// Implementation-defined.
    fn scan_ole10(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error>;
}

impl<S: ContentScanner + ?Sized> ContentScanner for &mut S {
    type Error = S::Error;

    fn scan(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        (**self).scan(object)
    }

    fn scan_ole10(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        (**self).scan_ole10(object)
    }
}

/// A scanner that reports every object clean.
///
/// Useful for measuring extraction alone, or for driving the parser over
/// untrusted input in fuzzing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardScanner;

impl ContentScanner for DiscardScanner {
    type Error = Infallible;

    fn scan(&mut self, _object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        Ok(Verdict::Clean)
    }

    fn scan_ole10(&mut self, _object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        Ok(Verdict::Clean)
    }
}

/// Everything the object handler needs from the surrounding scan.
pub(crate) struct ScanCx<'a, S: ContentScanner> {
    scanner: &'a mut S,
    dir: &'a Path,
    keep_temp_files: bool,
    handed_off: usize,
}

impl<'a, S: ContentScanner> ScanCx<'a, S> {
    pub(crate) fn new(scanner: &'a mut S, dir: &'a Path, keep_temp_files: bool) -> Self {
        Self {
            scanner,
            dir,
            keep_temp_files,
            handed_off: 0,
        }
    }

    pub(crate) fn dir(&self) -> &Path {
        self.dir
    }

    pub(crate) fn handed_off(&self) -> usize {
        self.handed_off
    }

    /// Flushes `file`, passes it to the scanner along `scan_path`, then
    /// deletes it (unless retained).
    pub(crate) fn hand_off(
        &mut self,
        mut file: ExtractedFile,
        scan_path: ScanPath,
        declared_len: u32,
        complete: bool,
    ) -> Result<Verdict, ScanError<S::Error>> {
        if let Err(source) = file.flush() {
            let (path, _) = file.dispose(self.keep_temp_files);
            return Err(ScanError::Write { path, source });
        }

        let object = ExtractedObject {
            path: file.path(),
            declared_len,
            written: file.written(),
            scan_path,
            complete,
        };
        debug!(
            "scanning embedded object {} ({:?}, {} bytes{})",
            object.path.display(),
            scan_path,
            object.written,
            if complete { "" } else { ", incomplete" }
        );
        let verdict = match scan_path {
            ScanPath::Generic => self.scanner.scan(&object),
            ScanPath::Ole10 => self.scanner.scan_ole10(&object),
        };
        self.handed_off += 1;

        let (path, disposed) = file.dispose(self.keep_temp_files);
        let verdict = verdict.map_err(ScanError::Scanner)?;
        disposed.map_err(|source| ScanError::Unlink { path, source })?;
        Ok(verdict)
    }
}
