//! Hex-pair decoding for `\objdata` payloads.
//!
//! RTF writes binary data as ASCII hex digits with line breaks and other
//! noise interleaved. Anything that is not a hex digit is skipped, and a digit
//! left unpaired at the end of one text run is carried into the next.

const INVALID: u8 = 0xFF;

const HEX_VALUES: [u8; 256] = {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < 10 {
        table[b'0' as usize + i] = i as u8;
        i += 1;
    }
    let mut i = 0;
    while i < 6 {
        table[b'a' as usize + i] = 10 + i as u8;
        table[b'A' as usize + i] = 10 + i as u8;
        i += 1;
    }
    table
};

/// Streaming hex decoder holding at most one pending nibble between calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct HexDecoder {
    /// High nibble of a byte whose low digit has not arrived yet, already
    /// shifted into place.
    pending: Option<u8>,
}

impl HexDecoder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends every byte completed by `input` to `out`.
    pub(crate) fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        out.reserve(input.len() / 2 + 1);
        for &byte in input {
            let value = HEX_VALUES[usize::from(byte)];
            if value == INVALID {
                continue;
            }
            match self.pending.take() {
                Some(high) => out.push(high | value),
                None => self.pending = Some(value << 4),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;

    use super::*;

    fn decode_all(parts: &[&[u8]]) -> Vec<u8> {
        let mut decoder = HexDecoder::new();
        let mut out = Vec::new();
        for part in parts {
            decoder.decode(part, &mut out);
        }
        out
    }

    #[test]
    fn decodes_mixed_case() {
        assert_eq!(decode_all(&[b"D0cf11E0"]), vec![0xD0, 0xCF, 0x11, 0xE0]);
    }

    #[test]
    fn skips_noise_between_digits() {
        assert_eq!(
            decode_all(&[b"D0CF11E0\nA1B1\r\n1 A E 1 zz"]),
            vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]
        );
    }

    #[test]
    fn carries_half_byte_across_runs() {
        let mut decoder = HexDecoder::new();
        let mut out = Vec::new();
        decoder.decode(b"0105 0", &mut out);
        assert_eq!(out, vec![0x01, 0x05]);
        assert!(decoder.has_pending());

        decoder.decode(b"\r\n", &mut out);
        assert!(decoder.has_pending());

        decoder.decode(b"2", &mut out);
        assert_eq!(out, vec![0x01, 0x05, 0x02]);
        assert!(!decoder.has_pending());
    }

    #[test]
    fn table_matches_std() {
        for byte in 0..=u8::MAX {
            let expected = char::from(byte).to_digit(16);
            let actual = HEX_VALUES[usize::from(byte)];
            assert_eq!(expected.map(|d| d as u8), (actual != INVALID).then_some(actual));
        }
    }

    /// Splitting the input anywhere yields the same decoded bytes.
    #[quickcheck]
    fn split_invariant(input: Vec<u8>, split: usize) -> bool {
        let at = if input.is_empty() { 0 } else { split % (input.len() + 1) };
        let (head, tail) = input.split_at(at);
        decode_all(&[&input]) == decode_all(&[head, tail])
    }
}
