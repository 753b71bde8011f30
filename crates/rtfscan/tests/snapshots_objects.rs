//! Snapshots of what the content scanner receives for small documents.

use core::fmt::Write as _;
use std::{fs, io, io::Write as _};

use rtfscan::{
    ContentScanner, DiscardScanner, ExtractedObject, ReaderSource, RtfScanner, ScanOptions,
    Verdict,
};

#[derive(Default)]
struct Log(String);

impl Log {
    fn record(&mut self, object: &ExtractedObject<'_>) -> io::Result<Verdict> {
        let contents = fs::read(object.path)?;
        writeln!(
            self.0,
            "{:?} complete={} declared={} written={} {}",
            object.scan_path,
            object.complete,
            object.declared_len,
            object.written,
            hex(&contents)
        )
        .unwrap();
        Ok(Verdict::Clean)
    }
}

impl ContentScanner for Log {
    type Error = io::Error;

    fn scan(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        self.record(object)
    }

    fn scan_ole10(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        self.record(object)
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut out, b| {
        write!(out, "{b:02x}").unwrap();
        out
    })
}

fn record(description: &[u8], payload: &[u8]) -> String {
    let mut bytes = vec![0x01, 0x05, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
    bytes.extend_from_slice(&u32::try_from(description.len()).unwrap().to_le_bytes());
    bytes.extend_from_slice(description);
    bytes.extend_from_slice(&[0; 8]);
    bytes.extend_from_slice(&u32::try_from(payload.len()).unwrap().to_le_bytes());
    bytes.extend_from_slice(payload);
    hex(&bytes).to_uppercase()
}

fn render(rtf: &str) -> String {
    let mut log = Log::default();
    let verdict = RtfScanner::default()
        .scan_bytes(rtf.as_bytes(), &mut log)
        .expect("scan should succeed");
    writeln!(log.0, "verdict: {verdict:?}").unwrap();
    log.0
}

#[test]
fn snapshot_two_objects() {
    let rtf = format!(
        "{{\\rtf1{{\\object\\objemb{{\\*\\objclass Package}}{{\\*\\objdata {}}}}}{{\\object{{\\*\\objdata {}}}}}}}",
        record(b"Package\0", b"\x02\x00hi\0"),
        record(b"", &[0xD0, 0xCF, 0x11, 0xE0]),
    );

    insta::assert_snapshot!(render(&rtf), @r"
    Ole10 complete=true declared=5 written=9 050000000200686900
    Generic complete=true declared=4 written=4 d0cf11e0
    verdict: Clean
    ");
}

#[test]
fn snapshot_truncated_object() {
    let mut hex = record(b"", &[1, 2, 3, 4, 5, 6]);
    hex.truncate(hex.len() - 6);
    let rtf = format!("{{\\rtf1{{\\object{{\\objdata {hex}}}}}}}");

    insta::assert_snapshot!(render(&rtf), @r"
    Ole10 complete=false declared=6 written=7 06000000010203
    verdict: Clean
    ");
}

#[test]
fn snapshot_ignored_payloads() {
    let payload = record(b"", &[0xD0, 0xCF]);
    // no \object in scope, and a terminator other than a space
    let rtf = format!(
        "{{\\rtf1{{\\objdata {payload}}}{{\\object{{\\objdata\t{payload}}}}}}}"
    );

    insta::assert_snapshot!(render(&rtf), @"verdict: Clean");
}

#[test]
fn snapshot_object_flag_after_counted_group() {
    let payload = record(b"", &[0xD0, 0xCF]);
    let rtf = format!("{{\\rtf1{{\\object}}{{\\objdata {payload}}}}}");

    insta::assert_snapshot!(render(&rtf), @r"
    Generic complete=true declared=2 written=2 d0cf
    verdict: Clean
    ");
}

#[test]
fn scans_a_file_on_disk() {
    let mut file = tempfile::tempfile().unwrap();
    let rtf = format!(
        "{{\\rtf1{{\\object{{\\objdata {}}}}}}}",
        record(b"Excel.Sheet.8\0", &[0xD0, 0xCF, 0x00])
    );
    file.write_all(rtf.as_bytes()).unwrap();

    let mut source = ReaderSource::new(file);
    let verdict = RtfScanner::new(ScanOptions {
        chunk_size: 5,
        ..Default::default()
    })
    .scan(&mut source, &mut DiscardScanner)
    .unwrap();

    assert_eq!(verdict, Verdict::Clean);
}
