//! UTF-8
//!
//! Decoding follows one structural rule for malformed input: a lead byte
//! declares a length, and a single fallback call covers the lead plus the
//! continuation bytes that actually follow it. The first byte that is not a
//! continuation ends the sequence and is then read as a fresh lead. Overlong
//! forms, surrogates and values above U+10FFFF can only be recognised once
//! the declared length is complete, so they blame the whole sequence.

use super::engine::{
    DecodeKernel, Decoded, EncodeKernel, Scratch, narrowing_fast_path, widening_fast_path,
};
use crate::simd;
use crate::unicode::{
    is_utf8_continuation, is_valid_scalar, utf8_declared_len, utf8_lead_bits, utf8_min_for_len,
    write_utf8,
};

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Utf8Encoder;

impl EncodeKernel for Utf8Encoder {
    fn fast_path(&self, chars: &[u16], out: Option<&mut [u8]>) -> (usize, usize) {
        narrowing_fast_path(chars, out, simd::ascii_run_len_utf16)
    }

    fn encode_one(self, code_point: u32, out: &mut Scratch<u8, 8>) -> Option<Self> {
        let mut buf = [0u8; 4];
        let len = write_utf8(code_point, &mut buf);
        out.extend(&buf[..len]);
        Some(self)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Utf8Decoder {
    seen: Scratch<u8, 4>,
    need: u8,
}

impl Utf8Decoder {
    fn complete(&self) -> Decoded {
        let bytes = self.seen.as_slice();
        let len = bytes.len();
        let value = bytes[1..]
            .iter()
            .fold(utf8_lead_bits(bytes[0], len), |acc, &b| {
                (acc << 6) | u32::from(b & 0x3F)
            });
        if value < utf8_min_for_len(len) || !is_valid_scalar(value) {
            Decoded::invalid(bytes)
        } else {
            Decoded::scalar(value)
        }
    }
}

impl DecodeKernel for Utf8Decoder {
    fn fast_path(&self, bytes: &[u8], out: Option<&mut [u16]>) -> (usize, usize) {
        widening_fast_path(bytes, out, simd::ascii_run_len)
    }

    fn step(self, byte: u8) -> (Self, Decoded) {
        if self.seen.is_empty() {
            return match utf8_declared_len(byte) {
                Some(1) => (self, Decoded::unit(u16::from(byte))),
                Some(len) => (
                    Utf8Decoder {
                        seen: Scratch::from_slice(&[byte]),
                        need: len as u8,
                    },
                    Decoded::Nothing,
                ),
                None => (self, Decoded::invalid(&[byte])),
            };
        }

        if !is_utf8_continuation(byte) {
            return (
                Utf8Decoder::default(),
                Decoded::invalid_reprocess(self.seen.as_slice(), 0),
            );
        }

        let mut next = self;
        next.seen.push(byte);
        if next.seen.len() < usize::from(next.need) {
            return (next, Decoded::Nothing);
        }
        (Utf8Decoder::default(), next.complete())
    }

    fn finish(self) -> (Self, Decoded) {
        if self.seen.is_empty() {
            (self, Decoded::Nothing)
        } else {
            (Utf8Decoder::default(), Decoded::invalid(self.seen.as_slice()))
        }
    }

    fn is_idle(&self) -> bool {
        self.seen.is_empty()
    }
}
