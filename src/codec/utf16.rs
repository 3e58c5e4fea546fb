//! UTF-16 in either byte order
//!
//! Encoding is a byte swap at most. Decoding has to pair surrogates that
//! may arrive one byte at a time, so the decoder tracks an odd byte and a
//! pending high surrogate separately.

use super::engine::{DecodeKernel, Decoded, EncodeKernel, Scratch};
use crate::unicode::{SUPPLEMENTARY_START, is_high_surrogate, is_low_surrogate, is_surrogate, split_surrogates};

#[inline]
fn unit_bytes(unit: u16, big_endian: bool) -> [u8; 2] {
    if big_endian {
        unit.to_be_bytes()
    } else {
        unit.to_le_bytes()
    }
}

#[inline]
fn read_unit(first: u8, second: u8, big_endian: bool) -> u16 {
    if big_endian {
        u16::from_be_bytes([first, second])
    } else {
        u16::from_le_bytes([first, second])
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Utf16Encoder {
    big_endian: bool,
}

impl Utf16Encoder {
    pub(crate) fn new(big_endian: bool) -> Self {
        Self { big_endian }
    }
}

impl EncodeKernel for Utf16Encoder {
    fn fast_path(&self, chars: &[u16], out: Option<&mut [u8]>) -> (usize, usize) {
        let run = chars
            .iter()
            .take_while(|&&unit| !is_surrogate(u32::from(unit)))
            .count();
        match out {
            None => (run, run.saturating_mul(2)),
            Some(out) => {
                let n = run.min(out.len() / 2);
                for (slot, &unit) in out.chunks_exact_mut(2).zip(&chars[..n]) {
                    slot.copy_from_slice(&unit_bytes(unit, self.big_endian));
                }
                (n, n * 2)
            }
        }
    }

    fn encode_one(self, code_point: u32, out: &mut Scratch<u8, 8>) -> Option<Self> {
        if code_point >= SUPPLEMENTARY_START {
            let (high, low) = split_surrogates(code_point);
            out.extend(&unit_bytes(high, self.big_endian));
            out.extend(&unit_bytes(low, self.big_endian));
        } else {
            out.extend(&unit_bytes(code_point as u16, self.big_endian));
        }
        Some(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Start,
    HaveByte(u8),
    High(u16),
    HighPlusByte(u16, u8),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Utf16Decoder {
    big_endian: bool,
    pending: Pending,
}

impl Utf16Decoder {
    pub(crate) fn new(big_endian: bool) -> Self {
        Self {
            big_endian,
            pending: Pending::Start,
        }
    }

    fn with(self, pending: Pending) -> Self {
        Self { pending, ..self }
    }
}

impl DecodeKernel for Utf16Decoder {
    fn fast_path(&self, bytes: &[u8], mut out: Option<&mut [u16]>) -> (usize, usize) {
        let mut n = 0;
        for pair in bytes.chunks_exact(2) {
            let unit = read_unit(pair[0], pair[1], self.big_endian);
            if is_surrogate(u32::from(unit)) {
                break;
            }
            if let Some(out) = out.as_deref_mut() {
                match out.get_mut(n) {
                    Some(slot) => *slot = unit,
                    None => break,
                }
            }
            n += 1;
        }
        (n * 2, n)
    }

    fn step(self, byte: u8) -> (Self, Decoded) {
        match self.pending {
            Pending::Start => (self.with(Pending::HaveByte(byte)), Decoded::Nothing),
            Pending::HaveByte(first) => {
                let unit = read_unit(first, byte, self.big_endian);
                let value = u32::from(unit);
                if is_high_surrogate(value) {
                    (self.with(Pending::High(unit)), Decoded::Nothing)
                } else if is_low_surrogate(value) {
                    (self.with(Pending::Start), Decoded::invalid(&[first, byte]))
                } else {
                    (self.with(Pending::Start), Decoded::unit(unit))
                }
            }
            Pending::High(high) => (self.with(Pending::HighPlusByte(high, byte)), Decoded::Nothing),
            Pending::HighPlusByte(high, first) => {
                let unit = read_unit(first, byte, self.big_endian);
                if is_low_surrogate(u32::from(unit)) {
                    (
                        self.with(Pending::Start),
                        Decoded::Units(Scratch::from_slice(&[high, unit])),
                    )
                } else {
                    // the high surrogate is orphaned; `first` stays buffered
                    // and the current byte is read again after it
                    (
                        self.with(Pending::HaveByte(first)),
                        Decoded::invalid_reprocess(&unit_bytes(high, self.big_endian), 1),
                    )
                }
            }
        }
    }

    fn finish(self) -> (Self, Decoded) {
        match self.pending {
            Pending::Start => (self, Decoded::Nothing),
            Pending::HaveByte(byte) => (self.with(Pending::Start), Decoded::invalid(&[byte])),
            Pending::High(high) => (
                self.with(Pending::Start),
                Decoded::invalid(&unit_bytes(high, self.big_endian)),
            ),
            Pending::HighPlusByte(high, byte) => (
                self.with(Pending::HaveByte(byte)),
                Decoded::Invalid {
                    bytes: Scratch::from_slice(&unit_bytes(high, self.big_endian)),
                    reprocess: false,
                    held: 1,
                },
            ),
        }
    }

    fn is_idle(&self) -> bool {
        self.pending == Pending::Start
    }
}
