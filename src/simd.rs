//! Bulk scanning and widening helpers behind the codec fast paths
//!
//! The default build uses word-at-a-time scalar loops. With the `simd`
//! feature (nightly) the same functions are backed by `std::simd`; both
//! must agree on every input.

/// Length of the leading run of bytes below 0x80
#[inline]
pub fn ascii_run_len(bytes: &[u8]) -> usize {
    #[cfg(feature = "simd")]
    {
        vector::ascii_run_len(bytes)
    }

    #[cfg(not(feature = "simd"))]
    {
        scalar::ascii_run_len(bytes)
    }
}

/// Length of the leading run of UTF-16 units below 0x80
#[inline]
pub fn ascii_run_len_utf16(units: &[u16]) -> usize {
    #[cfg(feature = "simd")]
    {
        vector::run_len_below_utf16(units, 0x80)
    }

    #[cfg(not(feature = "simd"))]
    {
        scalar::run_len_below_utf16(units, 0x80)
    }
}

/// Length of the leading run of UTF-16 units below 0x100
#[inline]
pub fn latin1_run_len_utf16(units: &[u16]) -> usize {
    #[cfg(feature = "simd")]
    {
        vector::run_len_below_utf16(units, 0x100)
    }

    #[cfg(not(feature = "simd"))]
    {
        scalar::run_len_below_utf16(units, 0x100)
    }
}

/// Zero-extends `src` into the front of `dst`, which must be at least as long
#[inline]
pub fn widen(src: &[u8], dst: &mut [u16]) {
    #[cfg(feature = "simd")]
    {
        vector::widen(src, dst)
    }

    #[cfg(not(feature = "simd"))]
    {
        scalar::widen(src, dst)
    }
}

/// Truncates `src` into the front of `dst`, which must be at least as long.
///
/// Callers pass only units below 0x100.
#[inline]
pub fn narrow(src: &[u16], dst: &mut [u8]) {
    #[cfg(feature = "simd")]
    {
        vector::narrow(src, dst)
    }

    #[cfg(not(feature = "simd"))]
    {
        scalar::narrow(src, dst)
    }
}

pub(crate) mod scalar {
    const HIGH_BITS: u64 = 0x8080_8080_8080_8080;

    pub(crate) fn ascii_run_len(bytes: &[u8]) -> usize {
        let mut chunks = bytes.chunks_exact(8);
        let mut offset = 0;
        for chunk in &mut chunks {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            let high = u64::from_le_bytes(word) & HIGH_BITS;
            if high != 0 {
                return offset + (high.trailing_zeros() / 8) as usize;
            }
            offset += 8;
        }
        offset
            + chunks
                .remainder()
                .iter()
                .take_while(|&&b| b < 0x80)
                .count()
    }

    pub(crate) fn run_len_below_utf16(units: &[u16], limit: u16) -> usize {
        let mut offset = 0;
        for chunk in units.chunks(8) {
            // OR-ing is exact because `limit` is a power of two
            let merged = chunk.iter().fold(0u16, |acc, &unit| acc | unit);
            if merged >= limit {
                return offset + chunk.iter().take_while(|&&unit| unit < limit).count();
            }
            offset += chunk.len();
        }
        offset
    }

    pub(crate) fn widen(src: &[u8], dst: &mut [u16]) {
        for (slot, &byte) in dst.iter_mut().zip(src) {
            *slot = u16::from(byte);
        }
    }

    pub(crate) fn narrow(src: &[u16], dst: &mut [u8]) {
        for (slot, &unit) in dst.iter_mut().zip(src) {
            *slot = unit as u8;
        }
    }
}

#[cfg(feature = "simd")]
mod vector {
    use std::simd::prelude::*;

    const LANES: usize = 16;

    pub(super) fn ascii_run_len(bytes: &[u8]) -> usize {
        let mut i = 0;
        while i + LANES <= bytes.len() {
            let v = u8x16::from_slice(&bytes[i..i + LANES]);
            let high = v.simd_ge(u8x16::splat(0x80));
            if high.any() {
                return i + high.to_bitmask().trailing_zeros() as usize;
            }
            i += LANES;
        }
        i + super::scalar::ascii_run_len(&bytes[i..])
    }

    pub(super) fn run_len_below_utf16(units: &[u16], limit: u16) -> usize {
        let mut i = 0;
        while i + LANES <= units.len() {
            let v = u16x16::from_slice(&units[i..i + LANES]);
            let over = v.simd_ge(u16x16::splat(limit));
            if over.any() {
                return i + over.to_bitmask().trailing_zeros() as usize;
            }
            i += LANES;
        }
        i + super::scalar::run_len_below_utf16(&units[i..], limit)
    }

    pub(super) fn widen(src: &[u8], dst: &mut [u16]) {
        let mut i = 0;
        while i + LANES <= src.len() {
            let wide: u16x16 = u8x16::from_slice(&src[i..i + LANES]).cast();
            wide.copy_to_slice(&mut dst[i..i + LANES]);
            i += LANES;
        }
        super::scalar::widen(&src[i..], &mut dst[i..]);
    }

    pub(super) fn narrow(src: &[u16], dst: &mut [u8]) {
        let mut i = 0;
        while i + LANES <= src.len() {
            let thin: u8x16 = u16x16::from_slice(&src[i..i + LANES]).cast();
            thin.copy_to_slice(&mut dst[i..i + LANES]);
            i += LANES;
        }
        super::scalar::narrow(&src[i..], &mut dst[i..]);
    }
}
