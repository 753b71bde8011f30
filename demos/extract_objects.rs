//! Scans an RTF file and lists the objects embedded in it.
//!
//! Every extracted object is reported with its decode path and size, and the
//! first bytes of its payload. Logging goes through `tracing`; set `RUST_LOG`
//! to see what the parser is doing:
//!
//! ```bash
//! RUST_LOG=rtfscan=debug cargo run -p rtfscan --example extract_objects -- document.rtf
//! ```
//!
//! Pass `--keep` to leave the extracted files on disk for inspection.

use std::{fs::File, io::Read, path::PathBuf, process::ExitCode};

use clap::Parser;
use rtfscan::{ContentScanner, ExtractedObject, ReaderSource, RtfScanner, ScanOptions, Verdict};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "extract_objects")]
#[command(about = "List the OLE objects embedded in an RTF document")]
struct Args {
    /// RTF document to scan
    path: PathBuf,

    /// Leave the extracted files on disk
    #[arg(short, long)]
    keep: bool,
}

/// Prints every object it is handed and reports all of them clean.
#[derive(Default)]
struct Lister {
    count: usize,
}

impl Lister {
    fn list(&mut self, object: &ExtractedObject<'_>) -> std::io::Result<Verdict> {
        let mut head = [0u8; 16];
        let n = File::open(object.path)?.read(&mut head)?;

        self.count += 1;
        println!(
            "#{} {:?}{} {} bytes at {}",
            self.count,
            object.scan_path,
            if object.complete { "" } else { " (incomplete)" },
            object.written,
            object.path.display()
        );
        println!("    {:02x?}", &head[..n]);
        Ok(Verdict::Clean)
    }
}

impl ContentScanner for Lister {
    type Error = std::io::Error;

    fn scan(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        self.list(object)
    }

    fn scan_ole10(&mut self, object: &ExtractedObject<'_>) -> Result<Verdict, Self::Error> {
        self.list(object)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let file = match File::open(&args.path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("cannot open {}: {err}", args.path.display());
            return ExitCode::FAILURE;
        }
    };

    let scanner = RtfScanner::new(ScanOptions {
        keep_temp_files: args.keep,
        ..Default::default()
    });
    let mut lister = Lister::default();
    match scanner.scan(&mut ReaderSource::new(file), &mut lister) {
        Ok(verdict) => {
            println!("{} objects, verdict: {verdict:?}", lister.count);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("scan failed: {err}");
            ExitCode::FAILURE
        }
    }
}
