//! Random-access byte input.

use std::io::{self, Read, Seek, SeekFrom};

/// Input the scanner reads the RTF document from.
///
/// Reads are positional: the scanner asks for bytes at an absolute offset and
/// never revisits one it has already consumed. A short read is fine, a read of
/// zero bytes means the end of the input.
pub trait ByteSource {
    /// Reads up to `buf.len()` bytes starting at `offset`, returning how many
    /// were read.
    ///
    /// # Errors
    ///
    /// Any I/O failure of the underlying input. The scan aborts with
    /// [`ScanError::Read`](crate::ScanError::Read).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

impl ByteSource for &[u8] {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let Ok(start) = usize::try_from(offset) else {
            return Ok(0);
        };
        let Some(rest) = self.get(start..) else {
            return Ok(0);
        };
        let n = rest.len().min(buf.len());
        buf[..n].copy_from_slice(&rest[..n]);
        Ok(n)
    }
}

impl<B: ByteSource + ?Sized> ByteSource for &mut B {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_at(offset, buf)
    }
}

/// Adapts any seekable reader, such as a [`std::fs::File`], into a
/// [`ByteSource`].
///
/// The reader is only repositioned when a read does not continue where the
/// previous one stopped.
///
/// ```rust,no_run
/// use std::fs::File;
///
/// use rtfscan::{DiscardScanner, ReaderSource, RtfScanner, ScanOptions};
///
/// let mut source = ReaderSource::new(File::open("document.rtf")?);
/// let verdict = RtfScanner::new(ScanOptions::default()).scan(&mut source, &mut DiscardScanner)?;
/// assert!(verdict.is_clean());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    position: Option<u64>,
}

impl<R: Read + Seek> ReaderSource<R> {
    /// Wraps `inner`. Its current position is not trusted; the first read
    /// seeks.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            position: None,
        }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        if self.position != Some(offset) {
            self.position = None;
            self.inner.seek(SeekFrom::Start(offset))?;
        }
        let n = loop {
            match self.inner.read(buf) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                Err(err) => {
                    self.position = None;
                    return Err(err);
                }
            }
        };
        self.position = Some(offset + n as u64);
        Ok(n)
    }
}
