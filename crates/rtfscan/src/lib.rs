//! Streaming extraction of OLE objects embedded in RTF documents.
//!
//! RTF carries embedded objects as hex text inside `{\object ... {\objdata
//! ...}}` groups. This crate reads a document in bounded chunks, tracks just
//! enough of the RTF group structure to find those payloads, decodes them to
//! temporary files and hands each file to a [`ContentScanner`]. The first
//! non-clean [`Verdict`] ends the scan.
//!
//! Memory use is bounded by the chunk size and the nesting depth of the
//! document, never by the size of an embedded object: payloads go straight
//! to disk.
//!
//! ```rust
//! use rtfscan::{ContentScanner, ExtractedObject, RtfScanner, ScanOptions, ScanPath, Verdict};
//!
//! #[derive(Default)]
//! struct Count(usize);
//!
//! impl ContentScanner for Count {
//!     type Error = std::io::Error;
//!
//!     fn scan(&mut self, _object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
//!         self.0 += 1;
//!         Ok(Verdict::Clean)
//!     }
//!
//!     fn scan_ole10(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
//!         assert_eq!(object.scan_path, ScanPath::Ole10);
//!         self.scan(object)
//!     }
//! }
//!
//! let rtf = br"{\object{\objdata 01050000 02000000 00000000 0000000000000000 02000000 D0CF}}";
//! let mut count = Count::default();
//! let verdict = RtfScanner::new(ScanOptions::default()).scan_bytes(rtf, &mut count)?;
//! assert_eq!(verdict, Verdict::Clean);
//! assert_eq!(count.0, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod actions;
mod error;
mod group_stack;
mod hex;
mod lexer;
mod object;
mod options;
mod scan;
mod scanner;
mod source;
mod state;
mod storage;

#[cfg(any(test, feature = "fuzzing"))]
#[doc(hidden)]
pub mod chunk_utils;

#[cfg(test)]
mod tests;

pub use error::ScanError;
pub use options::{DEFAULT_CHUNK_SIZE, ScanOptions};
pub use scan::RtfScanner;
pub use scanner::{ContentScanner, DiscardScanner, ExtractedObject, ScanPath, Verdict};
pub use source::{ByteSource, ReaderSource};
