#![no_main]
use std::{cell::RefCell, io};

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use rtfscan::{
    ByteSource, DiscardScanner, RtfScanner, ScanOptions, chunk_utils::split_with_seed,
};

const HEADER: usize = 9; // 1 flag + 8-byte split seed

thread_local! {
    static RNG: RefCell<SmallRng> = RefCell::new(SmallRng::from_os_rng());
}

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Structure-aware pieces of an RTF document.
#[derive(Debug, Arbitrary)]
enum Piece {
    Open,
    Close,
    Object,
    ObjData,
    Word(u8, Option<i32>),
    Symbol(u8),
    Hex(Vec<u8>),
    Record { description: Vec<u8>, payload: Vec<u8>, cut: u8 },
    Text(Vec<u8>),
}

impl Piece {
    fn render(&self, out: &mut Vec<u8>) {
        match self {
            Self::Open => out.push(b'{'),
            Self::Close => out.push(b'}'),
            Self::Object => out.extend_from_slice(b"\\object"),
            Self::ObjData => out.extend_from_slice(b"\\objdata "),
            Self::Word(len, param) => {
                out.push(b'\\');
                out.extend(std::iter::repeat_n(b'w', usize::from(*len % 48)));
                if let Some(param) = param {
                    out.extend_from_slice(param.to_string().as_bytes());
                }
            }
            Self::Symbol(byte) => out.extend_from_slice(&[b'\\', *byte]),
            Self::Hex(bytes) => out.extend(bytes.iter().flat_map(|b| hex_pair(*b))),
            Self::Record {
                description,
                payload,
                cut,
            } => {
                let mut bytes = vec![0x01, 0x05, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00];
                bytes.extend_from_slice(&(description.len() as u32).to_le_bytes());
                bytes.extend_from_slice(description);
                bytes.extend_from_slice(&[0; 8]);
                bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
                bytes.extend_from_slice(payload);
                let keep = bytes.len().saturating_sub(usize::from(*cut % 4));
                out.extend(bytes[..keep].iter().flat_map(|b| hex_pair(*b)));
            }
            Self::Text(bytes) => out.extend_from_slice(bytes),
        }
    }
}

fn hex_pair(byte: u8) -> [u8; 2] {
    const DIGITS: &[u8; 16] = b"0123456789ABCDEF";
    [DIGITS[usize::from(byte >> 4)], DIGITS[usize::from(byte & 0xF)]]
}

fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if max_size < HEADER {
        return fuzzer_mutate(data, size, max_size);
    }
    if size < HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8);
        data[1..HEADER].copy_from_slice(&with_rng(|rng| rng.next_u64().to_le_bytes()));

        let noise: Vec<u8> = with_rng(|rng| {
            let len = rng.random_range(0..=max_size.min(4_096));
            (0..len).map(|_| rng.random::<u8>()).collect()
        });
        let mut rendered = Vec::new();
        if let Ok(pieces) = Vec::<Piece>::arbitrary(&mut Unstructured::new(&noise)) {
            for piece in &pieces {
                piece.render(&mut rendered);
            }
        }

        let len = rendered.len().min(max_size - HEADER);
        data[HEADER..HEADER + len].copy_from_slice(&rendered[..len]);
        HEADER + len
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

/// Serves the input in the chunks chosen by the split seed.
struct Chunked<'a> {
    chunks: Vec<&'a [u8]>,
    next: usize,
    offset: u64,
}

impl ByteSource for Chunked<'_> {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        assert_eq!(offset, self.offset, "reads must be sequential");
        let Some(chunk) = self.chunks.get(self.next) else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n == chunk.len() {
            self.next += 1;
        } else {
            self.chunks[self.next] = &chunk[n..];
        }
        self.offset += n as u64;
        Ok(n)
    }
}

fn scan(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let split_seed = u64::from_le_bytes(data[1..HEADER].try_into().unwrap());
    let data = &data[HEADER..];

    let mut source = Chunked {
        chunks: split_with_seed(data, split_seed),
        next: 0,
        offset: 0,
    };
    let scanner = RtfScanner::new(ScanOptions {
        chunk_size: 1 + usize::from(flags & 0x7F),
        ..Default::default()
    });

    let verdict = scanner
        .scan(&mut source, &mut DiscardScanner)
        .expect("scanning untrusted input must not fail");
    assert!(verdict.is_clean());
}

fuzz_target!(|data: &[u8]| scan(data));
