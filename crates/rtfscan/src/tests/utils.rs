use std::{fmt::Write, fs, io};

use crate::{ByteSource, ContentScanner, ExtractedObject, ScanPath, Verdict};

/// What a [`RecordingScanner`] saw of one handed-over object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub scan_path: ScanPath,
    pub complete: bool,
    pub declared_len: u32,
    pub written: u64,
    pub contents: Vec<u8>,
}

/// Reads every handed-over file before it is deleted.
#[derive(Debug, Default)]
pub struct RecordingScanner {
    pub objects: Vec<Recorded>,
    marker: Option<u8>,
}

impl RecordingScanner {
    /// Reports `Infected` for any object containing `marker`.
    pub fn infected_by(marker: u8) -> Self {
        Self {
            objects: Vec::new(),
            marker: Some(marker),
        }
    }

    fn record(&mut self, object: &ExtractedObject<'_>) -> io::Result<Verdict> {
        let contents = fs::read(object.path)?;
        let infected = self.marker.is_some_and(|m| contents.contains(&m));
        self.objects.push(Recorded {
            scan_path: object.scan_path,
            complete: object.complete,
            declared_len: object.declared_len,
            written: object.written,
            contents,
        });
        Ok(if infected {
            Verdict::Infected {
                name: "Test.Marker".into(),
            }
        } else {
            Verdict::Clean
        })
    }
}

impl ContentScanner for RecordingScanner {
    type Error = io::Error;

    fn scan(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        assert_eq!(object.scan_path, ScanPath::Generic);
        self.record(object)
    }

    fn scan_ole10(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        assert_eq!(object.scan_path, ScanPath::Ole10);
        self.record(object)
    }
}

/// Hex text of one object record with the given description and payload.
pub fn object_record(description: &[u8], payload: &[u8]) -> String {
    let desc_len = u32::try_from(description.len()).unwrap();
    let data_len = u32::try_from(payload.len()).unwrap();

    let mut bytes = vec![0x01, 0x05, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
    bytes.extend_from_slice(&desc_len.to_le_bytes());
    bytes.extend_from_slice(description);
    bytes.extend_from_slice(&[0; 8]);
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.extend_from_slice(payload);

    hex(&bytes)
}

/// Uppercase hex text of `bytes`, as RTF writers emit it.
pub fn hex(bytes: &[u8]) -> String {
    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(hex, "{byte:02X}").unwrap();
    }
    hex
}

/// An RTF document embedding one object per record.
pub fn document(records: &[String]) -> String {
    let mut rtf = String::from("{\\rtf1\\ansi{\\fonttbl{\\f0 Arial;}}\\pard Hello ");
    for record in records {
        rtf.push_str("{\\object\\objemb{\\*\\objclass Package}{\\*\\objdata \n");
        // writers wrap the hex at a fixed width
        for line in record.as_bytes().chunks(64) {
            rtf.push_str(core::str::from_utf8(line).unwrap());
            rtf.push('\n');
        }
        rtf.push_str("}}");
    }
    rtf.push_str("\\par}");
    rtf
}

/// A source that returns at most one of `limits` bytes per read, cycling.
pub struct ShortReads<'a> {
    pub data: &'a [u8],
    pub limits: Vec<usize>,
    pub reads: usize,
}

impl ByteSource for ShortReads<'_> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let limit = if self.limits.is_empty() {
            buf.len()
        } else {
            1 + self.limits[self.reads % self.limits.len()] % buf.len()
        };
        self.reads += 1;
        let end = limit.min(buf.len());
        let mut data = self.data;
        data.read_at(offset, &mut buf[..end])
    }
}
