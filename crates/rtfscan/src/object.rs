//! Decoder for the binary record carried by `\objdata`.
//!
//! Once hex-decoded, the payload is laid out as:
//!
//! | field       | size              |
//! |-------------|-------------------|
//! | magic       | 8                 |
//! | desc length | 4 (LE)            |
//! | description | desc length       |
//! | reserved    | 8                 |
//! | data length | 4 (LE)            |
//! | data        | data length       |
//!
//! Several records may follow each other in one group. Framing is trusted
//! even when the content looks wrong: a mismatched magic number is logged and
//! the expected number of bytes is consumed regardless.

use bstr::BStr;
use tracing::{debug, trace};

use crate::{
    error::ScanError,
    hex::HexDecoder,
    scanner::{ContentScanner, ScanCx, ScanPath, Verdict},
    storage::ExtractedFile,
};

const MAGIC: [u8; 8] = [0x01, 0x05, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
const LENGTH_FIELD: usize = 4;
const RESERVED: usize = 8;
/// Description bytes kept for diagnostics; the rest are skipped.
const MAX_DESCRIPTION: usize = 64;
const OLE2_SIGNATURE: [u8; 2] = [0xD0, 0xCF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ObjectState {
    WaitMagic,
    WaitDescLen,
    WaitDesc,
    WaitZero,
    WaitDataSize,
    DumpData,
    /// Drops everything; entered after a fatal error.
    DumpDiscard,
}

#[derive(Debug)]
pub(crate) struct ObjectDecoder {
    hex: HexDecoder,
    /// Scratch buffer for the bytes decoded from one text run.
    decoded: Vec<u8>,
    state: ObjectState,
    /// Bytes consumed in the current state.
    consumed: usize,
    desc_len: u32,
    description: Vec<u8>,
    data_len: u32,
    remaining: usize,
    /// Leading payload bytes held until the signature check can run.
    head: Vec<u8>,
    scan_path: Option<ScanPath>,
    output: Option<ExtractedFile>,
}

impl ObjectDecoder {
    pub(crate) fn new() -> Self {
        Self {
            hex: HexDecoder::new(),
            decoded: Vec::new(),
            state: ObjectState::WaitMagic,
            consumed: 0,
            desc_len: 0,
            description: Vec::new(),
            data_len: 0,
            remaining: 0,
            head: Vec::with_capacity(OLE2_SIGNATURE.len()),
            scan_path: None,
            output: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> ObjectState {
        self.state
    }

    /// Feeds one literal text run of hex digits.
    pub(crate) fn process<S: ContentScanner>(
        &mut self,
        run: &[u8],
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>> {
        if self.state == ObjectState::DumpDiscard {
            return Ok(Verdict::Clean);
        }

        let mut decoded = core::mem::take(&mut self.decoded);
        decoded.clear();
        self.hex.decode(run, &mut decoded);
        let result = self.consume(&decoded, cx);
        self.decoded = decoded;

        if result.is_err() {
            self.state = ObjectState::DumpDiscard;
        }
        result
    }

    /// Called when the group ends. An object still being written is handed
    /// to the scanner as it is.
    pub(crate) fn end<S: ContentScanner>(
        mut self: Box<Self>,
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>> {
        if self.output.is_none() {
            trace!("object data ended in {:?}", self.state);
            return Ok(Verdict::Clean);
        }

        debug!(
            "object data ended with {} of {} payload bytes missing",
            self.remaining, self.data_len
        );
        let head = core::mem::take(&mut self.head);
        self.write(&head)?;
        self.hand_off(cx, false)
    }

    fn consume<S: ContentScanner>(
        &mut self,
        mut input: &[u8],
        cx: &mut ScanCx<'_, S>,
    ) -> Result<Verdict, ScanError<S::Error>> {
        loop {
            if self.state == ObjectState::DumpData
                && self.scan_path.is_some()
                && self.remaining == 0
            {
                let verdict = self.hand_off(cx, true)?;
                if !verdict.is_clean() {
                    return Ok(verdict);
                }
            }
            if input.is_empty() {
                return Ok(Verdict::Clean);
            }

            let taken = match self.state {
                ObjectState::WaitMagic => self.wait_magic(input),
                ObjectState::WaitDescLen => self.wait_desc_len(input)?,
                ObjectState::WaitDesc => self.wait_desc(input),
                ObjectState::WaitZero => self.wait_zero(input),
                ObjectState::WaitDataSize => self.wait_data_size(input, cx)?,
                ObjectState::DumpData => self.dump_data(input)?,
                ObjectState::DumpDiscard => input.len(),
            };
            input = &input[taken..];
        }
    }

    fn advance(&mut self, next: ObjectState) {
        trace!("object state {:?} -> {:?}", self.state, next);
        self.state = next;
        self.consumed = 0;
    }

    fn wait_magic(&mut self, input: &[u8]) -> usize {
        let take = (MAGIC.len() - self.consumed).min(input.len());
        for (i, &byte) in input[..take].iter().enumerate() {
            let at = self.consumed + i;
            if byte != MAGIC[at] {
                debug!(
                    "objdata magic number not matched: expected {:#04x}, got {:#04x} at {}",
                    MAGIC[at], byte, at
                );
            }
        }
        self.consumed += take;
        if self.consumed == MAGIC.len() {
            self.advance(ObjectState::WaitDescLen);
        }
        take
    }

    /// Accumulates a little-endian `u32` across calls.
    fn read_length(field: &mut u32, consumed: &mut usize, input: &[u8]) -> usize {
        if *consumed == 0 {
            *field = 0;
        }
        let take = (LENGTH_FIELD - *consumed).min(input.len());
        for &byte in &input[..take] {
            *field |= u32::from(byte) << (8 * *consumed);
            *consumed += 1;
        }
        take
    }

    fn wait_desc_len<E>(&mut self, input: &[u8]) -> Result<usize, ScanError<E>> {
        let take = Self::read_length(&mut self.desc_len, &mut self.consumed, input);
        if self.consumed < LENGTH_FIELD {
            return Ok(take);
        }

        let desc_len = self.desc_len as usize;
        if desc_len > MAX_DESCRIPTION {
            debug!("description length too big ({desc_len}), keeping only {MAX_DESCRIPTION} bytes of it");
        } else {
            trace!("description length: {desc_len}");
        }
        self.description.clear();
        self.description
            .try_reserve_exact(desc_len.min(MAX_DESCRIPTION))
            .map_err(|_| ScanError::OutOfMemory {
                what: "object description",
            })?;

        self.advance(ObjectState::WaitDesc);
        if desc_len == 0 {
            self.finish_description();
        }
        Ok(take)
    }

    fn wait_desc(&mut self, input: &[u8]) -> usize {
        let desc_len = self.desc_len as usize;
        let take = (desc_len - self.consumed).min(input.len());
        let keep = MAX_DESCRIPTION.saturating_sub(self.consumed).min(take);
        self.description.extend_from_slice(&input[..keep]);
        self.consumed += take;
        if self.consumed == desc_len {
            self.finish_description();
        }
        take
    }

    fn finish_description(&mut self) {
        debug!(
            "preparing to dump rtf embedded object, description: {}",
            BStr::new(&self.description)
        );
        self.description = Vec::new();
        self.advance(ObjectState::WaitZero);
    }

    fn wait_zero(&mut self, input: &[u8]) -> usize {
        let take = (RESERVED - self.consumed).min(input.len());
        self.consumed += take;
        if self.consumed == RESERVED {
            self.advance(ObjectState::WaitDataSize);
        }
        take
    }

    fn wait_data_size<S: ContentScanner>(
        &mut self,
        input: &[u8],
        cx: &mut ScanCx<'_, S>,
    ) -> Result<usize, ScanError<S::Error>> {
        let take = Self::read_length(&mut self.data_len, &mut self.consumed, input);
        if self.consumed < LENGTH_FIELD {
            return Ok(take);
        }

        debug!("dumping rtf embedded object of size {}", self.data_len);
        let file = ExtractedFile::create(cx.dir()).map_err(|source| ScanError::TempFile {
            path: cx.dir().to_path_buf(),
            source,
        })?;
        self.output = Some(file);
        self.remaining = self.data_len as usize;
        self.head.clear();
        self.scan_path = None;
        self.advance(ObjectState::DumpData);
        // an empty payload has nothing to sniff
        self.select_scan_path()?;
        Ok(take)
    }

    fn dump_data<E>(&mut self, input: &[u8]) -> Result<usize, ScanError<E>> {
        let mut taken = 0;
        if self.scan_path.is_none() {
            let needed = self.sniff_len() - self.head.len();
            taken = needed.min(input.len());
            self.head.extend_from_slice(&input[..taken]);
            if !self.select_scan_path()? {
                return Ok(taken);
            }
        }

        let rest = &input[taken..];
        let want = rest.len().min(self.remaining);
        self.write(&rest[..want])?;
        self.remaining -= want;
        Ok(taken + want)
    }

    fn sniff_len(&self) -> usize {
        (self.data_len as usize).min(OLE2_SIGNATURE.len())
    }

    /// Picks the decode path once enough leading bytes are known, writing the
    /// OLE1 length header when needed. Returns `false` while still waiting.
    fn select_scan_path<E>(&mut self) -> Result<bool, ScanError<E>> {
        if self.head.len() < self.sniff_len() {
            return Ok(false);
        }

        let scan_path = if self.head == OLE2_SIGNATURE {
            ScanPath::Generic
        } else {
            // not an OLE2 document: some OLE1 stream to be decoded downstream
            let header = self.data_len.to_le_bytes();
            self.write(&header)?;
            ScanPath::Ole10
        };
        trace!("selected {scan_path:?} scan path");
        self.scan_path = Some(scan_path);

        let mut head = core::mem::take(&mut self.head);
        self.write(&head)?;
        self.remaining -= head.len();
        head.clear();
        self.head = head;
        Ok(true)
    }

    fn write<E>(&mut self, bytes: &[u8]) -> Result<(), ScanError<E>> {
        let Some(file) = self.output.as_mut() else {
            return Ok(());
        };
        file.write_all(bytes).map_err(|source| ScanError::Write {
            path: file.path().to_path_buf(),
            source,
        })
    }

    fn hand_off<S: ContentScanner>(
        &mut self,
        cx: &mut ScanCx<'_, S>,
        complete: bool,
    ) -> Result<Verdict, ScanError<S::Error>> {
        let Some(file) = self.output.take() else {
            return Ok(Verdict::Clean);
        };
        let scan_path = self.scan_path.take().unwrap_or(ScanPath::Generic);
        self.head.clear();
        self.remaining = 0;
        self.advance(ObjectState::WaitMagic);
        cx.hand_off(file, scan_path, self.data_len, complete)
    }
}
