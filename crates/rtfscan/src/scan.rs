//! Scan orchestration: read, lex, unwind, clean up.

use tracing::{debug, debug_span, warn};

use crate::{
    error::ScanError,
    lexer::Lexer,
    options::ScanOptions,
    scanner::{ContentScanner, ScanCx, Verdict},
    source::ByteSource,
    storage::ScanDir,
};

/// Extracts the OLE objects embedded in RTF documents and hands each one to a
/// [`ContentScanner`].
///
/// A scanner holds only its options; every call to [`scan`](Self::scan)
/// builds its own parser state and temporary directory, so one value may be
/// shared by scans on different threads.
///
/// ```rust
/// use rtfscan::{DiscardScanner, RtfScanner, ScanOptions, Verdict};
///
/// let rtf = br"{\rtf1{\object{\objdata 0105000002000000}}}";
/// let verdict = RtfScanner::new(ScanOptions::default()).scan_bytes(rtf, &mut DiscardScanner)?;
/// assert_eq!(verdict, Verdict::Clean);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RtfScanner {
    options: ScanOptions,
}

impl RtfScanner {
    /// Creates a scanner with the given options.
    #[must_use]
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// The options scans run with.
    #[must_use]
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Scans the document read from `source`.
    ///
    /// Returns the first non-clean verdict reported for an extracted object,
    /// or [`Verdict::Clean`] once the whole input has been read.
    ///
    /// # Errors
    ///
    /// Any [`ScanError`]. Malformed RTF is never an error. Whatever the
    /// outcome, every extracted file and the scan directory have been removed
    /// (unless retained) by the time this returns.
    pub fn scan<B, S>(&self, source: &mut B, scanner: &mut S) -> Result<Verdict, ScanError<S::Error>>
    where
        B: ByteSource + ?Sized,
        S: ContentScanner,
    {
        let span = debug_span!("rtf_scan");
        let _enter = span.enter();

        let root = self.options.temp_root();
        let dir = ScanDir::create(&root, self.options.keep_temp_files)
            .map_err(|source| ScanError::TempDir { path: root, source })?;

        let mut lexer = Lexer::new();
        let outcome = {
            let mut cx = ScanCx::new(scanner, dir.path(), self.options.keep_temp_files);
            let driven = self.drive(source, &mut lexer, &mut cx);
            let unwound = lexer.unwind(&mut cx);
            debug!("{} embedded objects handed to the scanner", cx.handed_off());

            match (driven, unwound) {
                (Ok(Verdict::Clean), unwound) => unwound,
                (driven, Err(err)) => {
                    warn!("discarding error while unwinding: {err}");
                    driven
                }
                (driven, Ok(_)) => driven,
            }
        };

        if let Err(err) = dir.close() {
            warn!("cannot remove scan directory: {err}");
        }
        outcome
    }

    /// Scans an in-memory document.
    ///
    /// # Errors
    ///
    /// As [`scan`](Self::scan), apart from read failures.
    pub fn scan_bytes<S: ContentScanner>(
        &self,
        data: &[u8],
        scanner: &mut S,
    ) -> Result<Verdict, ScanError<S::Error>> {
        let mut source = data;
        self.scan(&mut source, scanner)
    }

    fn drive<B, S>(
        &self,
        source: &mut B,
        lexer: &mut Lexer,
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>>
    where
        B: ByteSource + ?Sized,
        S: ContentScanner,
    {
        let chunk_size = self.options.effective_chunk_size();
        let mut buf = Vec::new();
        buf.try_reserve_exact(chunk_size)
            .map_err(|_| ScanError::OutOfMemory { what: "read buffer" })?;
        buf.resize(chunk_size, 0);

        let mut offset = 0u64;
        loop {
            let n = source
                .read_at(offset, &mut buf)
                .map_err(|source| ScanError::Read { offset, source })?;
            if n == 0 {
                return Ok(Verdict::Clean);
            }
            offset += n as u64;

            let verdict = lexer.feed(&buf[..n], cx)?;
            if !verdict.is_clean() {
                debug!("stopping at offset {offset}: {verdict:?}");
                return Ok(verdict);
            }
        }
    }
}
