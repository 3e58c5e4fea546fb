//! US-ASCII: bytes and code points below 0x80 map one to one

use super::engine::{
    DecodeKernel, Decoded, EncodeKernel, Scratch, narrowing_fast_path, widening_fast_path,
};
use crate::simd;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AsciiEncoder;

impl EncodeKernel for AsciiEncoder {
    fn fast_path(&self, chars: &[u16], out: Option<&mut [u8]>) -> (usize, usize) {
        narrowing_fast_path(chars, out, simd::ascii_run_len_utf16)
    }

    fn encode_one(self, code_point: u32, out: &mut Scratch<u8, 8>) -> Option<Self> {
        if code_point < 0x80 {
            out.push(code_point as u8);
            Some(self)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AsciiDecoder;

impl DecodeKernel for AsciiDecoder {
    fn fast_path(&self, bytes: &[u8], out: Option<&mut [u16]>) -> (usize, usize) {
        widening_fast_path(bytes, out, simd::ascii_run_len)
    }

    fn step(self, byte: u8) -> (Self, Decoded) {
        if byte < 0x80 {
            (self, Decoded::unit(u16::from(byte)))
        } else {
            (self, Decoded::invalid(&[byte]))
        }
    }
}
