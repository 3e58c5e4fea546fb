//! Generic conversion drivers shared by every codec
//!
//! A codec contributes a small `Copy` state machine (a *kernel*): a bulk
//! fast path for the common case plus a per-code-point (encode) or
//! per-byte (decode) step. The drivers here own everything else: leftover
//! surrogates, fallback staging and draining, stream positions, output
//! accounting and the recursion guard.
//!
//! Kernel state is only committed once its output fits, so running out of
//! space never leaves a half-written sequence behind.

use crate::fallback::{DecoderFallbackBuffer, EncoderFallbackBuffer};
use crate::unicode::{
    SUPPLEMENTARY_START, combine_surrogates, is_high_surrogate, is_low_surrogate, is_surrogate,
    split_surrogates,
};
use crate::{Error, FallbackFault, Result};

/// Consecutive fallback invocations fed by fallback output before giving up
pub(crate) const MAX_FALLBACK_DEPTH: u32 = 250;

/// Largest count any operation may report
pub(crate) const COUNT_LIMIT: usize = isize::MAX as usize;

/// Fixed-capacity staging for the output of one kernel step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Scratch<T, const N: usize> {
    items: [T; N],
    len: usize,
}

impl<T: Copy + Default, const N: usize> Scratch<T, N> {
    pub(crate) fn new() -> Self {
        Self {
            items: [T::default(); N],
            len: 0,
        }
    }

    pub(crate) fn from_slice(items: &[T]) -> Self {
        let mut scratch = Self::new();
        scratch.extend(items);
        scratch
    }

    /// Kernels never stage more than `N` items per step
    #[inline]
    pub(crate) fn push(&mut self, item: T) {
        self.items[self.len] = item;
        self.len += 1;
    }

    pub(crate) fn extend(&mut self, items: &[T]) {
        for &item in items {
            self.push(item);
        }
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        &self.items[..self.len]
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub(crate) fn clear(&mut self) {
        self.len = 0;
    }
}

impl<T: Copy + Default, const N: usize> Default for Scratch<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Destination of a conversion: a caller buffer, or a bare counter
#[derive(Debug)]
pub(crate) struct Output<'a, T> {
    buf: Option<&'a mut [T]>,
    len: usize,
}

impl<'a, T: Copy> Output<'a, T> {
    pub(crate) fn counting() -> Self {
        Self { buf: None, len: 0 }
    }

    pub(crate) fn writing(buf: &'a mut [T]) -> Self {
        Self {
            buf: Some(buf),
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Appends all of `items` or nothing; `Ok(false)` when they do not fit
    #[inline]
    pub(crate) fn push(&mut self, items: &[T]) -> Result<bool> {
        if self.buf.is_none() {
            self.advance(items.len())?;
            return Ok(true);
        }
        let start = self.len;
        let end = start + items.len();
        match self.buf.as_deref_mut().and_then(|buf| buf.get_mut(start..end)) {
            Some(slot) => {
                slot.copy_from_slice(items);
                self.len = end;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Unwritten tail of the buffer, `None` when counting
    #[inline]
    pub(crate) fn spare(&mut self) -> Option<&mut [T]> {
        let len = self.len;
        self.buf.as_deref_mut().map(|buf| &mut buf[len..])
    }

    /// Records `n` items written directly into [`Output::spare`]
    #[inline]
    pub(crate) fn advance(&mut self, n: usize) -> Result<()> {
        self.len = self
            .len
            .checked_add(n)
            .filter(|&len| len <= COUNT_LIMIT)
            .ok_or(Error::ConversionOverflow)?;
        Ok(())
    }
}

/// UTF-16 to bytes state machine
pub(crate) trait EncodeKernel: Copy {
    /// Lone surrogates are ordinary code units for this encoding
    const ENCODES_LONE_SURROGATES: bool = false;

    /// Converts a leading run of trivially encodable units.
    ///
    /// Called only while [`EncodeKernel::is_idle`]. Returns units consumed
    /// and bytes produced; with `None` the bytes are only counted.
    fn fast_path(&self, chars: &[u16], out: Option<&mut [u8]>) -> (usize, usize);

    /// Encodes one code point, or `None` if the encoding cannot represent it
    fn encode_one(self, code_point: u32, out: &mut Scratch<u8, 8>) -> Option<Self>;

    /// Terminates any open sequence at end of stream
    fn finish(self, _out: &mut Scratch<u8, 8>) -> Self {
        self
    }

    /// No sequence is open
    fn is_idle(&self) -> bool {
        true
    }
}

/// Bytes to UTF-16 state machine
pub(crate) trait DecodeKernel: Copy {
    /// Converts a leading run of trivially decodable bytes.
    ///
    /// Called only while [`DecodeKernel::is_idle`]. Returns bytes consumed
    /// and units produced; with `None` the units are only counted.
    fn fast_path(&self, bytes: &[u8], out: Option<&mut [u16]>) -> (usize, usize);

    /// Feeds one byte
    fn step(self, byte: u8) -> (Self, Decoded);

    /// Resolves buffered bytes at end of stream; called until idle
    fn finish(self) -> (Self, Decoded) {
        (self, Decoded::Nothing)
    }

    /// No bytes are buffered
    fn is_idle(&self) -> bool {
        true
    }
}

/// Result of one decode step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decoded {
    /// Byte absorbed into the state
    Nothing,
    /// One or two code units completed
    Units(Scratch<u16, 2>),
    /// Malformed bytes for the fallback.
    ///
    /// With `reprocess` the current byte was not consumed and is fed again
    /// to the new state. `held` counts bytes after the malformed ones that
    /// the new state has already buffered.
    Invalid {
        bytes: Scratch<u8, 4>,
        reprocess: bool,
        held: u8,
    },
}

impl Decoded {
    #[inline]
    pub(crate) fn unit(unit: u16) -> Self {
        Decoded::Units(Scratch::from_slice(&[unit]))
    }

    /// Scalar as one unit or a surrogate pair
    #[inline]
    pub(crate) fn scalar(value: u32) -> Self {
        if value < SUPPLEMENTARY_START {
            Decoded::unit(value as u16)
        } else {
            let (high, low) = split_surrogates(value);
            Decoded::Units(Scratch::from_slice(&[high, low]))
        }
    }

    #[inline]
    pub(crate) fn invalid(bytes: &[u8]) -> Self {
        Decoded::Invalid {
            bytes: Scratch::from_slice(bytes),
            reprocess: false,
            held: 0,
        }
    }

    #[inline]
    pub(crate) fn invalid_reprocess(bytes: &[u8], held: u8) -> Self {
        Decoded::Invalid {
            bytes: Scratch::from_slice(bytes),
            reprocess: true,
            held,
        }
    }
}

/// Encoder state that does not depend on the encoding
#[derive(Debug, Clone)]
pub(crate) struct EncoderCore {
    pub(crate) high_surrogate: Option<u16>,
    pub(crate) fallback: Box<dyn EncoderFallbackBuffer>,
    /// Stream index of the input that staged the current fallback units
    pub(crate) fallback_origin: usize,
    /// Units consumed since creation or reset
    pub(crate) position: usize,
}

impl EncoderCore {
    pub(crate) fn new(fallback: Box<dyn EncoderFallbackBuffer>) -> Self {
        Self {
            high_surrogate: None,
            fallback,
            fallback_origin: 0,
            position: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.high_surrogate = None;
        self.fallback.reset();
        self.fallback_origin = 0;
        self.position = 0;
    }

    fn stage(&mut self, code_point: u32, index: usize) -> Result<()> {
        self.fallback_origin = index;
        if code_point >= SUPPLEMENTARY_START {
            let (high, low) = split_surrogates(code_point);
            self.fallback.fallback_pair(high, low, index)?;
        } else {
            self.fallback.fallback(code_point as u16, index)?;
        }
        Ok(())
    }
}

/// Decoder state that does not depend on the encoding
#[derive(Debug, Clone)]
pub(crate) struct DecoderCore {
    pub(crate) fallback: Box<dyn DecoderFallbackBuffer>,
    /// Bytes consumed since creation or reset
    pub(crate) position: usize,
}

impl DecoderCore {
    pub(crate) fn new(fallback: Box<dyn DecoderFallbackBuffer>) -> Self {
        Self {
            fallback,
            position: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.fallback.reset();
        self.position = 0;
    }
}

/// Pops one code point from a fallback buffer, joining a staged surrogate
/// pair. Returns the code point and how many units it took.
fn next_staged_code_point(buffer: &mut dyn EncoderFallbackBuffer) -> (u32, usize) {
    let unit = u32::from(buffer.next_unit());
    if is_high_surrogate(unit) && buffer.remaining() > 0 {
        let low = u32::from(buffer.next_unit());
        if is_low_surrogate(low) {
            return (combine_surrogates(unit, low), 2);
        }
        buffer.move_previous();
    }
    (unit, 1)
}

/// Encodes as much of `chars` as fits; returns units consumed.
///
/// `core.position` must still be the stream position of `chars[0]`; the
/// caller advances it afterwards.
pub(crate) fn run_encode<K: EncodeKernel>(
    kernel: &mut K,
    core: &mut EncoderCore,
    chars: &[u16],
    out: &mut Output<'_, u8>,
    flush: bool,
) -> Result<usize> {
    let mut i = 0;
    let mut depth = 0u32;
    let mut scratch = Scratch::<u8, 8>::new();

    loop {
        // staged replacement units go out before any further input
        if core.fallback.remaining() > 0 {
            let (code_point, taken) = next_staged_code_point(&mut *core.fallback);
            scratch.clear();
            let encoded = if is_surrogate(code_point) && !K::ENCODES_LONE_SURROGATES {
                None
            } else {
                kernel.encode_one(code_point, &mut scratch)
            };
            match encoded {
                Some(next) => {
                    if !out.push(scratch.as_slice())? {
                        for _ in 0..taken {
                            core.fallback.move_previous();
                        }
                        break;
                    }
                    *kernel = next;
                }
                None => {
                    depth += 1;
                    if depth > MAX_FALLBACK_DEPTH {
                        log::warn!(
                            "fallback output for index {} is itself unencodable, giving up after {} rounds",
                            core.fallback_origin,
                            MAX_FALLBACK_DEPTH
                        );
                        return Err(Error::IllegalFallbackState(FallbackFault::RecursionLimit));
                    }
                    let origin = core.fallback_origin;
                    core.stage(code_point, origin)?;
                }
            }
            continue;
        }
        depth = 0;

        if let Some(high) = core.high_surrogate {
            let high_index = core.position + i - 1;
            match chars.get(i).map(|&unit| u32::from(unit)) {
                Some(low) if is_low_surrogate(low) => {
                    let code_point = combine_surrogates(u32::from(high), low);
                    scratch.clear();
                    match kernel.encode_one(code_point, &mut scratch) {
                        Some(next) => {
                            if !out.push(scratch.as_slice())? {
                                break;
                            }
                            *kernel = next;
                        }
                        None => core.stage(code_point, high_index)?,
                    }
                    core.high_surrogate = None;
                    i += 1;
                }
                Some(_) => {
                    core.high_surrogate = None;
                    core.stage(u32::from(high), high_index)?;
                }
                None if flush => {
                    core.high_surrogate = None;
                    core.stage(u32::from(high), high_index)?;
                }
                None => break,
            }
            continue;
        }

        if i == chars.len() {
            if flush && !kernel.is_idle() {
                scratch.clear();
                let next = kernel.finish(&mut scratch);
                if out.push(scratch.as_slice())? {
                    *kernel = next;
                }
            }
            break;
        }

        if kernel.is_idle() {
            let (consumed, produced) = kernel.fast_path(&chars[i..], out.spare());
            out.advance(produced)?;
            i += consumed;
            if consumed > 0 {
                continue;
            }
        }

        let unit = chars[i];
        let value = u32::from(unit);
        let index = core.position + i;
        if is_surrogate(value) && !K::ENCODES_LONE_SURROGATES {
            if is_high_surrogate(value) {
                core.high_surrogate = Some(unit);
            } else {
                core.stage(value, index)?;
            }
            i += 1;
            continue;
        }

        scratch.clear();
        match kernel.encode_one(value, &mut scratch) {
            Some(next) => {
                if !out.push(scratch.as_slice())? {
                    break;
                }
                *kernel = next;
            }
            None => core.stage(value, index)?,
        }
        i += 1;
    }

    Ok(i)
}

/// Decodes as much of `bytes` as fits; returns bytes consumed.
///
/// `core.position` must still be the stream position of `bytes[0]`; the
/// caller advances it afterwards.
pub(crate) fn run_decode<K: DecodeKernel>(
    kernel: &mut K,
    core: &mut DecoderCore,
    bytes: &[u8],
    out: &mut Output<'_, u16>,
    flush: bool,
) -> Result<usize> {
    let mut i = 0;

    loop {
        if core.fallback.remaining() > 0 {
            let unit = core.fallback.next_unit();
            if !out.push(&[unit])? {
                core.fallback.move_previous();
                break;
            }
            continue;
        }

        if i == bytes.len() {
            if !flush || kernel.is_idle() {
                break;
            }
            let (next, decoded) = kernel.finish();
            match decoded {
                Decoded::Nothing => *kernel = next,
                Decoded::Units(units) => {
                    if !out.push(units.as_slice())? {
                        break;
                    }
                    *kernel = next;
                }
                Decoded::Invalid { bytes: bad, held, .. } => {
                    let end = core.position + i - usize::from(held);
                    core.fallback
                        .fallback(bad.as_slice(), end.saturating_sub(bad.len()))?;
                    *kernel = next;
                }
            }
            continue;
        }

        if kernel.is_idle() {
            let (consumed, produced) = kernel.fast_path(&bytes[i..], out.spare());
            out.advance(produced)?;
            i += consumed;
            if consumed > 0 {
                continue;
            }
        }

        let (next, decoded) = kernel.step(bytes[i]);
        match decoded {
            Decoded::Nothing => {
                *kernel = next;
                i += 1;
            }
            Decoded::Units(units) => {
                if !out.push(units.as_slice())? {
                    break;
                }
                *kernel = next;
                i += 1;
            }
            Decoded::Invalid {
                bytes: bad,
                reprocess,
                held,
            } => {
                let end = core.position + i + usize::from(!reprocess) - usize::from(held);
                core.fallback
                    .fallback(bad.as_slice(), end.saturating_sub(bad.len()))?;
                *kernel = next;
                if !reprocess {
                    i += 1;
                }
            }
        }
    }

    Ok(i)
}

/// Fast path for encoders whose trivially encodable units map to one byte
#[inline]
pub(crate) fn narrowing_fast_path(
    chars: &[u16],
    out: Option<&mut [u8]>,
    run_len: fn(&[u16]) -> usize,
) -> (usize, usize) {
    match out {
        None => {
            let n = run_len(chars);
            (n, n)
        }
        Some(out) => {
            let limit = chars.len().min(out.len());
            let n = run_len(&chars[..limit]);
            crate::simd::narrow(&chars[..n], &mut out[..n]);
            (n, n)
        }
    }
}

/// Fast path for decoders whose trivially decodable bytes map to one unit
#[inline]
pub(crate) fn widening_fast_path(
    bytes: &[u8],
    out: Option<&mut [u16]>,
    run_len: fn(&[u8]) -> usize,
) -> (usize, usize) {
    match out {
        None => {
            let n = run_len(bytes);
            (n, n)
        }
        Some(out) => {
            let limit = bytes.len().min(out.len());
            let n = run_len(&bytes[..limit]);
            crate::simd::widen(&bytes[..n], &mut out[..n]);
            (n, n)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_push_is_atomic() {
        let mut buf = [0u8; 3];
        let mut out = Output::writing(&mut buf);
        assert!(out.push(&[1, 2]).unwrap());
        assert!(!out.push(&[3, 4]).unwrap());
        assert_eq!(out.len(), 2);
        assert!(out.push(&[3]).unwrap());
        assert_eq!(out.spare().map(|s| s.len()), Some(0));
        assert_eq!(buf, [1, 2, 3]);
    }

    #[test]
    fn test_counting_output_overflows() {
        let mut out = Output::<u8>::counting();
        assert!(out.spare().is_none());
        out.advance(COUNT_LIMIT - 1).unwrap();
        assert!(out.push(&[0]).unwrap());
        assert_eq!(out.push(&[0]), Err(Error::ConversionOverflow));
        assert_eq!(out.len(), COUNT_LIMIT);
    }

    #[test]
    fn test_decoded_scalar_splits_supplementary() {
        assert_eq!(Decoded::scalar(0x41), Decoded::unit(0x41));
        let Decoded::Units(units) = Decoded::scalar(0x1F600) else {
            panic!("expected units");
        };
        assert_eq!(units.as_slice(), &[0xD83D, 0xDE00]);
    }

    #[test]
    fn test_scratch() {
        let mut scratch = Scratch::<u8, 4>::new();
        assert!(scratch.is_empty());
        scratch.extend(&[1, 2]);
        scratch.push(3);
        assert_eq!(scratch.len(), 3);
        assert_eq!(scratch.as_slice(), &[1, 2, 3]);
        scratch.clear();
        assert!(scratch.is_empty());
    }
}
