//! UTF-32 in either byte order

use super::engine::{DecodeKernel, Decoded, EncodeKernel, Scratch};
use crate::unicode::{is_surrogate, is_valid_scalar};

#[inline]
fn scalar_bytes(value: u32, big_endian: bool) -> [u8; 4] {
    if big_endian {
        value.to_be_bytes()
    } else {
        value.to_le_bytes()
    }
}

#[inline]
fn read_scalar(bytes: [u8; 4], big_endian: bool) -> u32 {
    if big_endian {
        u32::from_be_bytes(bytes)
    } else {
        u32::from_le_bytes(bytes)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Utf32Encoder {
    big_endian: bool,
}

impl Utf32Encoder {
    pub(crate) fn new(big_endian: bool) -> Self {
        Self { big_endian }
    }
}

impl EncodeKernel for Utf32Encoder {
    fn fast_path(&self, chars: &[u16], out: Option<&mut [u8]>) -> (usize, usize) {
        let run = chars
            .iter()
            .take_while(|&&unit| !is_surrogate(u32::from(unit)))
            .count();
        match out {
            None => (run, run.saturating_mul(4)),
            Some(out) => {
                let n = run.min(out.len() / 4);
                for (slot, &unit) in out.chunks_exact_mut(4).zip(&chars[..n]) {
                    slot.copy_from_slice(&scalar_bytes(u32::from(unit), self.big_endian));
                }
                (n, n * 4)
            }
        }
    }

    fn encode_one(self, code_point: u32, out: &mut Scratch<u8, 8>) -> Option<Self> {
        out.extend(&scalar_bytes(code_point, self.big_endian));
        Some(self)
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Utf32Decoder {
    big_endian: bool,
    seen: Scratch<u8, 4>,
}

impl Utf32Decoder {
    pub(crate) fn new(big_endian: bool) -> Self {
        Self {
            big_endian,
            seen: Scratch::new(),
        }
    }
}

impl DecodeKernel for Utf32Decoder {
    fn fast_path(&self, bytes: &[u8], mut out: Option<&mut [u16]>) -> (usize, usize) {
        let mut n = 0;
        for quad in bytes.chunks_exact(4) {
            let value = read_scalar([quad[0], quad[1], quad[2], quad[3]], self.big_endian);
            if value > 0xFFFF || is_surrogate(value) {
                break;
            }
            if let Some(out) = out.as_deref_mut() {
                match out.get_mut(n) {
                    Some(slot) => *slot = value as u16,
                    None => break,
                }
            }
            n += 1;
        }
        (n * 4, n)
    }

    fn step(self, byte: u8) -> (Self, Decoded) {
        let mut next = self;
        next.seen.push(byte);
        if next.seen.len() < 4 {
            return (next, Decoded::Nothing);
        }
        let quad = next.seen;
        next.seen.clear();
        let bytes = quad.as_slice();
        let value = read_scalar([bytes[0], bytes[1], bytes[2], bytes[3]], self.big_endian);
        if is_valid_scalar(value) {
            (next, Decoded::scalar(value))
        } else {
            (next, Decoded::invalid(bytes))
        }
    }

    fn finish(self) -> (Self, Decoded) {
        if self.seen.is_empty() {
            return (self, Decoded::Nothing);
        }
        let mut next = self;
        next.seen.clear();
        (next, Decoded::invalid(self.seen.as_slice()))
    }

    fn is_idle(&self) -> bool {
        self.seen.is_empty()
    }
}
