//! Codecs: configured encodings and the incremental encoders and decoders
//! they hand out
//!
//! A [`Codec`] is immutable configuration (encoding, fallbacks, preamble
//! and UTF-7 options) and is cheap to clone. Conversion state lives in the
//! [`Encoder`] / [`Decoder`] a codec creates, one per stream.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::fallback::{DecoderFallback, EncoderFallback, ExceptionFallback, ReplacementFallback};
use crate::{Encoding, Error, Result};

mod ascii;
pub(crate) mod engine;
mod latin1;
mod utf16;
mod utf32;
mod utf7;
mod utf8;

use ascii::{AsciiDecoder, AsciiEncoder};
use engine::{
    COUNT_LIMIT, DecodeKernel, DecoderCore, EncodeKernel, EncoderCore, Output, run_decode,
    run_encode,
};
use latin1::{Latin1Decoder, Latin1Encoder};
use utf7::{Utf7Decoder, Utf7Encoder};
use utf8::{Utf8Decoder, Utf8Encoder};
use utf16::{Utf16Decoder, Utf16Encoder};
use utf32::{Utf32Decoder, Utf32Encoder};

/// Smallest and largest chunk `encode_into`/`decode_into` reserve per round
const MIN_CHUNK: usize = 16;
const MAX_CHUNK: usize = 1 << 20;

/// Outcome of one [`Encoder::convert`] or [`Decoder::convert`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conversion {
    /// Input units or bytes consumed
    pub consumed: usize,
    /// Output bytes or units written
    pub written: usize,
    /// All input was consumed, no fallback output is pending, and on a
    /// flushing call no partial sequence is held back
    pub completed: bool,
}

/// A configured encoding
#[derive(Debug, Clone)]
pub struct Codec {
    encoding: Encoding,
    encoder_fallback: Arc<dyn EncoderFallback>,
    decoder_fallback: Arc<dyn DecoderFallback>,
    emit_preamble: bool,
    allow_optionals: bool,
}

impl Codec {
    /// Codec with the default fallbacks: `?` for ASCII and Latin-1, U+FFFD
    /// for the UTF encodings.
    pub fn new(encoding: Encoding) -> Self {
        let replacement = if encoding.is_single_byte() {
            ReplacementFallback::question_mark()
        } else {
            ReplacementFallback::replacement_character()
        };
        Self {
            encoding,
            encoder_fallback: Arc::new(replacement.clone()),
            decoder_fallback: Arc::new(replacement),
            emit_preamble: matches!(
                encoding,
                Encoding::UTF8
                    | Encoding::UTF16LE
                    | Encoding::UTF16BE
                    | Encoding::UTF32LE
                    | Encoding::UTF32BE
            ),
            allow_optionals: false,
        }
    }

    /// Start configuring a codec for `encoding` from the defaults
    pub fn builder(encoding: Encoding) -> CodecBuilder {
        CodecBuilder {
            codec: Codec::new(encoding),
        }
    }

    /// Start configuring a variant of this codec
    pub fn rebuild(&self) -> CodecBuilder {
        CodecBuilder {
            codec: self.clone(),
        }
    }

    /// Encoding this codec converts
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Numeric code-page identifier
    pub fn code_page(&self) -> u32 {
        self.encoding.code_page()
    }

    /// Canonical name
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// Every character is exactly one byte
    pub fn is_single_byte(&self) -> bool {
        self.encoding.is_single_byte()
    }

    /// Byte order mark writers should emit, empty when disabled or absent
    pub fn preamble(&self) -> &'static [u8] {
        match self.encoding.bom() {
            Some(bom) if self.emit_preamble => bom,
            _ => &[],
        }
    }

    /// Policy for text this encoding cannot represent
    pub fn encoder_fallback(&self) -> &Arc<dyn EncoderFallback> {
        &self.encoder_fallback
    }

    /// Policy for malformed bytes
    pub fn decoder_fallback(&self) -> &Arc<dyn DecoderFallback> {
        &self.decoder_fallback
    }

    /// UTF-7 writes the optional direct characters unshifted
    pub fn allow_optionals(&self) -> bool {
        self.allow_optionals
    }

    /// New incremental encoder
    pub fn encoder(&self) -> Encoder {
        Encoder::new(self.clone())
    }

    /// New incremental decoder
    pub fn decoder(&self) -> Decoder {
        Decoder::new(self.clone())
    }

    /// Exact number of bytes [`Codec::encode`] writes for `chars`
    pub fn byte_count(&self, chars: &[u16]) -> Result<usize> {
        self.encoder().byte_count(chars, true)
    }

    /// Encodes all of `chars` into `dest`; returns bytes written
    pub fn encode(&self, chars: &[u16], dest: &mut [u8]) -> Result<usize> {
        self.encoder().encode(chars, dest, true)
    }

    /// Exact number of code units [`Codec::decode`] writes for `bytes`
    pub fn char_count(&self, bytes: &[u8]) -> Result<usize> {
        self.decoder().char_count(bytes, true)
    }

    /// Decodes all of `bytes` into `dest`; returns code units written
    pub fn decode(&self, bytes: &[u8], dest: &mut [u16]) -> Result<usize> {
        self.decoder().decode(bytes, dest, true)
    }

    /// Upper bound on the bytes any `char_count` code units encode to
    pub fn max_byte_count(&self, char_count: usize) -> Result<usize> {
        let n = char_count as u128;
        let per_fallback = self.encoder_fallback.max_unit_count().max(1) as u128;
        let bytes_per_unit = match self.encoding {
            Encoding::ASCII | Encoding::ISO_8859_1 => 1,
            Encoding::UTF8 => 3,
            Encoding::UTF16LE | Encoding::UTF16BE => 2,
            Encoding::UTF32LE | Encoding::UTF32BE => 4,
            // UTF-7 never falls back
            Encoding::UTF7 => {
                return checked_count(n.checked_mul(3).and_then(|v| v.checked_add(2)));
            }
        };
        checked_count(
            (n + 1)
                .checked_mul(per_fallback)
                .and_then(|v| v.checked_mul(bytes_per_unit)),
        )
    }

    /// Upper bound on the code units any `byte_count` bytes decode to
    pub fn max_char_count(&self, byte_count: usize) -> Result<usize> {
        let n = byte_count as u128;
        let m = self.decoder_fallback.max_unit_count().max(1) as u128;
        let units = match self.encoding {
            Encoding::ASCII | Encoding::ISO_8859_1 => n.checked_mul(m),
            Encoding::UTF8 => (n + 1).checked_mul(m),
            Encoding::UTF16LE | Encoding::UTF16BE => (n.div_ceil(2) + 1).checked_mul(m),
            Encoding::UTF32LE | Encoding::UTF32BE if m > 2 => {
                (n / 2 + 2).checked_mul(m).map(|v| v / 2)
            }
            Encoding::UTF32LE | Encoding::UTF32BE => Some(n / 2 + 2),
            Encoding::UTF7 => n.max(1).checked_mul(m),
        };
        checked_count(units)
    }

    /// Encodes a Rust string
    pub fn encode_str(&self, text: &str) -> Result<Vec<u8>> {
        let chars: Vec<u16> = text.encode_utf16().collect();
        self.encode_to_vec(&chars)
    }

    /// Encodes `chars` into a vector of exactly the right size
    pub fn encode_to_vec(&self, chars: &[u16]) -> Result<Vec<u8>> {
        let mut encoder = self.encoder();
        let mut out = vec![0u8; encoder.byte_count(chars, true)?];
        let written = encoder.encode(chars, &mut out, true)?;
        out.truncate(written);
        Ok(out)
    }

    /// Decodes `bytes` into a vector of exactly the right size
    pub fn decode_to_vec(&self, bytes: &[u8]) -> Result<Vec<u16>> {
        let mut decoder = self.decoder();
        let mut out = vec![0u16; decoder.char_count(bytes, true)?];
        let written = decoder.decode(bytes, &mut out, true)?;
        out.truncate(written);
        Ok(out)
    }

    /// Decodes `bytes` into a `String`; unpaired surrogates become U+FFFD
    pub fn decode_to_string(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf16_lossy(&self.decode_to_vec(bytes)?))
    }
}

fn checked_count(count: Option<u128>) -> Result<usize> {
    count
        .filter(|&count| count <= COUNT_LIMIT as u128)
        .map(|count| count as usize)
        .ok_or(Error::ConversionOverflow)
}

/// Construction-time configuration for a [`Codec`]
#[derive(Debug, Clone)]
pub struct CodecBuilder {
    codec: Codec,
}

impl CodecBuilder {
    /// Policy for text the encoding cannot represent
    pub fn encoder_fallback(self, fallback: impl EncoderFallback + 'static) -> Self {
        self.shared_encoder_fallback(Arc::new(fallback))
    }

    /// Policy for malformed bytes
    pub fn decoder_fallback(self, fallback: impl DecoderFallback + 'static) -> Self {
        self.shared_decoder_fallback(Arc::new(fallback))
    }

    /// Encoder policy already shared with other codecs
    pub fn shared_encoder_fallback(mut self, fallback: Arc<dyn EncoderFallback>) -> Self {
        self.codec.encoder_fallback = fallback;
        self
    }

    /// Decoder policy already shared with other codecs
    pub fn shared_decoder_fallback(mut self, fallback: Arc<dyn DecoderFallback>) -> Self {
        self.codec.decoder_fallback = fallback;
        self
    }

    /// Fail on the first unencodable or malformed input in either direction
    pub fn strict(self) -> Self {
        self.encoder_fallback(ExceptionFallback)
            .decoder_fallback(ExceptionFallback)
    }

    /// Whether [`Codec::preamble`] reports the byte order mark
    pub fn emit_preamble(mut self, emit: bool) -> Self {
        self.codec.emit_preamble = emit;
        self
    }

    /// UTF-7 only: write `!"#$%&*;<=>@[]^_`{|}` without shifting
    pub fn allow_optionals(mut self, allow: bool) -> Self {
        self.codec.allow_optionals = allow;
        self
    }

    /// Finish configuration
    pub fn build(self) -> Codec {
        log::debug!(
            "built {} codec (encoder fallback {:?}, decoder fallback {:?}, preamble {}, optionals {})",
            self.codec.encoding,
            self.codec.encoder_fallback,
            self.codec.decoder_fallback,
            self.codec.emit_preamble,
            self.codec.allow_optionals
        );
        self.codec
    }
}

static ASCII: Lazy<Codec> = Lazy::new(|| Codec::new(Encoding::ASCII));
static LATIN1: Lazy<Codec> = Lazy::new(|| Codec::new(Encoding::ISO_8859_1));
static UTF7: Lazy<Codec> = Lazy::new(|| Codec::new(Encoding::UTF7));
static UTF8: Lazy<Codec> = Lazy::new(|| Codec::new(Encoding::UTF8));
static UTF16LE: Lazy<Codec> = Lazy::new(|| Codec::new(Encoding::UTF16LE));
static UTF16BE: Lazy<Codec> = Lazy::new(|| Codec::new(Encoding::UTF16BE));
static UTF32LE: Lazy<Codec> = Lazy::new(|| Codec::new(Encoding::UTF32LE));
static UTF32BE: Lazy<Codec> = Lazy::new(|| Codec::new(Encoding::UTF32BE));

pub(crate) fn shared(encoding: Encoding) -> &'static Codec {
    match encoding {
        Encoding::ASCII => &ASCII,
        Encoding::ISO_8859_1 => &LATIN1,
        Encoding::UTF7 => &UTF7,
        Encoding::UTF8 => &UTF8,
        Encoding::UTF16LE => &UTF16LE,
        Encoding::UTF16BE => &UTF16BE,
        Encoding::UTF32LE => &UTF32LE,
        Encoding::UTF32BE => &UTF32BE,
    }
}

macro_rules! dispatch {
    ($state:ident, $value:expr, $kernel:ident => $body:expr) => {
        match $value {
            $state::Ascii($kernel) => $body,
            $state::Latin1($kernel) => $body,
            $state::Utf7($kernel) => $body,
            $state::Utf8($kernel) => $body,
            $state::Utf16($kernel) => $body,
            $state::Utf32($kernel) => $body,
        }
    };
}

#[derive(Debug, Clone, Copy)]
enum EncodeState {
    Ascii(AsciiEncoder),
    Latin1(Latin1Encoder),
    Utf7(Utf7Encoder),
    Utf8(Utf8Encoder),
    Utf16(Utf16Encoder),
    Utf32(Utf32Encoder),
}

impl EncodeState {
    fn new(codec: &Codec) -> Self {
        match codec.encoding {
            Encoding::ASCII => EncodeState::Ascii(AsciiEncoder),
            Encoding::ISO_8859_1 => EncodeState::Latin1(Latin1Encoder),
            Encoding::UTF7 => EncodeState::Utf7(Utf7Encoder::new(codec.allow_optionals)),
            Encoding::UTF8 => EncodeState::Utf8(Utf8Encoder),
            Encoding::UTF16LE => EncodeState::Utf16(Utf16Encoder::new(false)),
            Encoding::UTF16BE => EncodeState::Utf16(Utf16Encoder::new(true)),
            Encoding::UTF32LE => EncodeState::Utf32(Utf32Encoder::new(false)),
            Encoding::UTF32BE => EncodeState::Utf32(Utf32Encoder::new(true)),
        }
    }

    fn run(
        &mut self,
        core: &mut EncoderCore,
        chars: &[u16],
        out: &mut Output<'_, u8>,
        flush: bool,
    ) -> Result<usize> {
        dispatch!(EncodeState, self, kernel => run_encode(kernel, core, chars, out, flush))
    }

    fn is_idle(&self) -> bool {
        dispatch!(EncodeState, self, kernel => kernel.is_idle())
    }
}

#[derive(Debug, Clone, Copy)]
enum DecodeState {
    Ascii(AsciiDecoder),
    Latin1(Latin1Decoder),
    Utf7(Utf7Decoder),
    Utf8(Utf8Decoder),
    Utf16(Utf16Decoder),
    Utf32(Utf32Decoder),
}

impl DecodeState {
    fn new(encoding: Encoding) -> Self {
        match encoding {
            Encoding::ASCII => DecodeState::Ascii(AsciiDecoder),
            Encoding::ISO_8859_1 => DecodeState::Latin1(Latin1Decoder),
            Encoding::UTF7 => DecodeState::Utf7(Utf7Decoder::default()),
            Encoding::UTF8 => DecodeState::Utf8(Utf8Decoder::default()),
            Encoding::UTF16LE => DecodeState::Utf16(Utf16Decoder::new(false)),
            Encoding::UTF16BE => DecodeState::Utf16(Utf16Decoder::new(true)),
            Encoding::UTF32LE => DecodeState::Utf32(Utf32Decoder::new(false)),
            Encoding::UTF32BE => DecodeState::Utf32(Utf32Decoder::new(true)),
        }
    }

    fn run(
        &mut self,
        core: &mut DecoderCore,
        bytes: &[u8],
        out: &mut Output<'_, u16>,
        flush: bool,
    ) -> Result<usize> {
        dispatch!(DecodeState, self, kernel => run_decode(kernel, core, bytes, out, flush))
    }

    fn is_idle(&self) -> bool {
        dispatch!(DecodeState, self, kernel => kernel.is_idle())
    }
}

/// Incremental UTF-16 to bytes converter for one stream.
///
/// Input may be split anywhere, including between the halves of a
/// surrogate pair: the output of successive calls (with `flush` set only
/// on the last) is identical to one call over the whole text.
#[derive(Debug, Clone)]
pub struct Encoder {
    codec: Codec,
    state: EncodeState,
    core: EncoderCore,
}

impl Encoder {
    fn new(codec: Codec) -> Self {
        let state = EncodeState::new(&codec);
        let core = EncoderCore::new(codec.encoder_fallback.create_buffer());
        Self { codec, state, core }
    }

    /// Codec this encoder was created from
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Forget held surrogates, open UTF-7 runs, pending fallback output and
    /// the stream position
    pub fn reset(&mut self) {
        self.state = EncodeState::new(&self.codec);
        self.core.reset();
    }

    fn step(&mut self, chars: &[u16], out: &mut Output<'_, u8>, flush: bool) -> Result<Conversion> {
        let consumed = self.state.run(&mut self.core, chars, out, flush)?;
        self.core.position += consumed;
        let completed = consumed == chars.len()
            && self.core.fallback.remaining() == 0
            && (!flush || (self.core.high_surrogate.is_none() && self.state.is_idle()));
        Ok(Conversion {
            consumed,
            written: out.len(),
            completed,
        })
    }

    /// Encodes as much of `chars` as fits in `dest`.
    ///
    /// Fails with [`Error::DestinationTooSmall`] only when not even one
    /// step fits; on any error the encoder is left as it was.
    pub fn convert(&mut self, chars: &[u16], dest: &mut [u8], flush: bool) -> Result<Conversion> {
        let snapshot = self.clone();
        let result = self.step(chars, &mut Output::writing(dest), flush);
        match result {
            Ok(c) if c.consumed > 0 || c.written > 0 || c.completed => Ok(c),
            Ok(_) => {
                *self = snapshot;
                Err(Error::DestinationTooSmall {
                    consumed: 0,
                    written: 0,
                })
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Encodes all of `chars` into `dest`; returns bytes written.
    ///
    /// All or nothing: if the output does not fit, nothing is committed and
    /// the error reports how far the attempt got.
    pub fn encode(&mut self, chars: &[u16], dest: &mut [u8], flush: bool) -> Result<usize> {
        let snapshot = self.clone();
        match self.step(chars, &mut Output::writing(dest), flush) {
            Ok(c) if c.completed => Ok(c.written),
            Ok(c) => {
                *self = snapshot;
                Err(Error::DestinationTooSmall {
                    consumed: c.consumed,
                    written: c.written,
                })
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Bytes [`Encoder::encode`] would write for `chars` from the current state
    pub fn byte_count(&self, chars: &[u16], flush: bool) -> Result<usize> {
        let mut probe = self.clone();
        Ok(probe.step(chars, &mut Output::counting(), flush)?.written)
    }

    /// Encodes all of `chars`, appending to `out`; returns bytes appended.
    ///
    /// On error `out` is restored to its original length.
    pub fn encode_into(&mut self, chars: &[u16], out: &mut Vec<u8>, flush: bool) -> Result<usize> {
        let start = out.len();
        let snapshot = self.clone();
        let mut rest = chars;
        loop {
            let room = self
                .codec
                .max_byte_count(rest.len())
                .unwrap_or(MAX_CHUNK)
                .clamp(MIN_CHUNK, MAX_CHUNK);
            let len = out.len();
            out.resize(len + room, 0);
            match self.convert(rest, &mut out[len..], flush) {
                Ok(c) => {
                    out.truncate(len + c.written);
                    rest = &rest[c.consumed..];
                    if c.completed {
                        return Ok(out.len() - start);
                    }
                }
                Err(err) => {
                    out.truncate(start);
                    *self = snapshot;
                    return Err(err);
                }
            }
        }
    }
}

/// Incremental bytes to UTF-16 converter for one stream.
///
/// Partial sequences at the end of one call are completed by the next; the
/// output of successive calls matches one call over the concatenated input.
#[derive(Debug, Clone)]
pub struct Decoder {
    codec: Codec,
    state: DecodeState,
    core: DecoderCore,
}

impl Decoder {
    fn new(codec: Codec) -> Self {
        let state = DecodeState::new(codec.encoding);
        let core = DecoderCore::new(codec.decoder_fallback.create_buffer());
        Self { codec, state, core }
    }

    /// Codec this decoder was created from
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// Forget buffered bytes, pending fallback output and the stream position
    pub fn reset(&mut self) {
        self.state = DecodeState::new(self.codec.encoding);
        self.core.reset();
    }

    fn step(&mut self, bytes: &[u8], out: &mut Output<'_, u16>, flush: bool) -> Result<Conversion> {
        let consumed = self.state.run(&mut self.core, bytes, out, flush)?;
        self.core.position += consumed;
        let completed = consumed == bytes.len()
            && self.core.fallback.remaining() == 0
            && (!flush || self.state.is_idle());
        Ok(Conversion {
            consumed,
            written: out.len(),
            completed,
        })
    }

    /// Decodes as much of `bytes` as fits in `dest`.
    ///
    /// Fails with [`Error::DestinationTooSmall`] only when not even one
    /// step fits; on any error the decoder is left as it was.
    pub fn convert(&mut self, bytes: &[u8], dest: &mut [u16], flush: bool) -> Result<Conversion> {
        let snapshot = self.clone();
        let result = self.step(bytes, &mut Output::writing(dest), flush);
        match result {
            Ok(c) if c.consumed > 0 || c.written > 0 || c.completed => Ok(c),
            Ok(_) => {
                *self = snapshot;
                Err(Error::DestinationTooSmall {
                    consumed: 0,
                    written: 0,
                })
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Decodes all of `bytes` into `dest`; returns code units written.
    ///
    /// All or nothing, like [`Encoder::encode`].
    pub fn decode(&mut self, bytes: &[u8], dest: &mut [u16], flush: bool) -> Result<usize> {
        let snapshot = self.clone();
        match self.step(bytes, &mut Output::writing(dest), flush) {
            Ok(c) if c.completed => Ok(c.written),
            Ok(c) => {
                *self = snapshot;
                Err(Error::DestinationTooSmall {
                    consumed: c.consumed,
                    written: c.written,
                })
            }
            Err(err) => {
                *self = snapshot;
                Err(err)
            }
        }
    }

    /// Code units [`Decoder::decode`] would write for `bytes` from the
    /// current state
    pub fn char_count(&self, bytes: &[u8], flush: bool) -> Result<usize> {
        let mut probe = self.clone();
        Ok(probe.step(bytes, &mut Output::counting(), flush)?.written)
    }

    /// Decodes all of `bytes`, appending to `out`; returns units appended.
    ///
    /// On error `out` is restored to its original length.
    pub fn decode_into(&mut self, bytes: &[u8], out: &mut Vec<u16>, flush: bool) -> Result<usize> {
        let start = out.len();
        let snapshot = self.clone();
        let mut rest = bytes;
        loop {
            let room = self
                .codec
                .max_char_count(rest.len())
                .unwrap_or(MAX_CHUNK)
                .clamp(MIN_CHUNK, MAX_CHUNK);
            let len = out.len();
            out.resize(len + room, 0);
            match self.convert(rest, &mut out[len..], flush) {
                Ok(c) => {
                    out.truncate(len + c.written);
                    rest = &rest[c.consumed..];
                    if c.completed {
                        return Ok(out.len() - start);
                    }
                }
                Err(err) => {
                    out.truncate(start);
                    *self = snapshot;
                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FallbackFault, InvalidSequence, PassThroughFallback};

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_default_fallbacks() {
        assert_eq!(Encoding::ASCII.codec().encode_str("\u{e9}").unwrap(), b"?");
        assert_eq!(
            Encoding::UTF8.codec().encode_to_vec(&[0xD800]).unwrap(),
            "\u{FFFD}".as_bytes()
        );
        assert_eq!(Encoding::ASCII.codec().decode_to_string(b"\x80").unwrap(), "?");
        assert_eq!(Encoding::UTF8.codec().decode_to_string(b"\x80").unwrap(), "\u{FFFD}");
    }

    #[test]
    fn test_shared_instances_are_reused() {
        assert!(std::ptr::eq(Encoding::UTF8.codec(), Encoding::UTF8.codec()));
        for &encoding in Encoding::all() {
            let codec = encoding.codec();
            assert_eq!(codec.encoding(), encoding);
            assert_eq!(codec.code_page(), encoding.code_page());
            assert_eq!(codec.name(), encoding.name());
            assert_eq!(codec.preamble(), encoding.bom().unwrap_or(&[]));
        }
    }

    #[test]
    fn test_convert_reports_partial_progress() {
        let chars = utf16("\u{20ac}\u{20ac}");
        let mut encoder = Encoding::UTF8.codec().encoder();
        let mut dest = [0u8; 4];

        let first = encoder.convert(&chars, &mut dest, true).unwrap();
        assert_eq!(
            first,
            Conversion {
                consumed: 1,
                written: 3,
                completed: false,
            }
        );
        assert_eq!(
            encoder.convert(&chars[1..], &mut dest[..2], true),
            Err(Error::DestinationTooSmall {
                consumed: 0,
                written: 0,
            })
        );
        let second = encoder.convert(&chars[1..], &mut dest, true).unwrap();
        assert!(second.completed);
        assert_eq!(&dest[..3], "\u{20ac}".as_bytes());
    }

    #[test]
    fn test_encode_is_all_or_nothing() {
        let chars = utf16("ab\u{1F600}");
        let mut encoder = Encoding::UTF8.codec().encoder();
        let mut small = [0u8; 4];
        assert_eq!(
            encoder.encode(&chars, &mut small, true),
            Err(Error::DestinationTooSmall {
                consumed: 3,
                written: 2,
            })
        );

        let mut dest = [0u8; 6];
        assert_eq!(encoder.encode(&chars, &mut dest, true), Ok(6));
        assert_eq!(&dest, "ab\u{1F600}".as_bytes());
    }

    #[test]
    fn test_failed_decode_keeps_state() {
        let codec = Codec::builder(Encoding::UTF8).strict().build();
        let mut decoder = codec.decoder();
        let mut out = [0u16; 4];
        assert_eq!(decoder.decode(b"\xE2\x82", &mut out, false), Ok(0));
        assert!(decoder.decode(b"\xFF", &mut out, true).is_err());
        // the held E2 82 is still there to be completed
        assert_eq!(decoder.decode(b"\xAC", &mut out, true), Ok(1));
        assert_eq!(out[0], 0x20AC);
    }

    #[test]
    fn test_counts_match_output_with_state() {
        let mut encoder = Encoding::UTF16LE.codec().encoder();
        let mut dest = [0u8; 8];
        assert_eq!(encoder.encode(&[0x41, 0xD83D], &mut dest, false), Ok(2));
        assert_eq!(encoder.byte_count(&[0xDE00], true), Ok(4));
        assert_eq!(encoder.byte_count(&[], true), Ok(2));
        assert_eq!(encoder.byte_count(&[], false), Ok(0));
    }

    #[test]
    fn test_reset_forgets_everything() {
        let codec = Codec::builder(Encoding::UTF8).strict().build();
        let mut decoder = codec.decoder();
        decoder.decode_into(b"abc\xE2", &mut Vec::new(), false).unwrap();
        decoder.reset();
        let mut text = Vec::new();
        assert_eq!(decoder.decode_into(b"x", &mut text, true), Ok(1));
        assert_eq!(
            decoder.decode_into(b"\x80", &mut text, true),
            Err(Error::InvalidCharacterSequence {
                sequence: InvalidSequence::Bytes(vec![0x80]),
                index: 1,
            })
        );
        assert_eq!(text, [0x78]);
    }

    #[test]
    fn test_into_grows_for_expanding_input() {
        let text = "\u{1F600}".repeat(5000);
        let mut out = Vec::new();
        let mut encoder = Encoding::UTF32BE.codec().encoder();
        assert_eq!(encoder.encode_into(&utf16(&text), &mut out, true), Ok(20000));
        let mut decoder = Encoding::UTF32BE.codec().decoder();
        let mut back = Vec::new();
        decoder.decode_into(&out, &mut back, true).unwrap();
        assert_eq!(String::from_utf16(&back).unwrap(), text);
    }

    #[test]
    fn test_max_counts() {
        let ascii = Encoding::ASCII.codec();
        assert_eq!(ascii.max_byte_count(10), Ok(11));
        assert_eq!(ascii.max_char_count(10), Ok(10));

        let utf8 = Encoding::UTF8.codec();
        assert_eq!(utf8.max_byte_count(10), Ok(33));
        assert_eq!(utf8.max_char_count(10), Ok(11));

        let utf16 = Encoding::UTF16LE.codec();
        assert_eq!(utf16.max_byte_count(10), Ok(22));
        assert_eq!(utf16.max_char_count(11), Ok(7));

        let utf32 = Encoding::UTF32LE.codec();
        assert_eq!(utf32.max_byte_count(10), Ok(44));
        assert_eq!(utf32.max_char_count(10), Ok(7));

        let wide = Codec::builder(Encoding::UTF32LE)
            .decoder_fallback(PassThroughFallback)
            .build();
        assert_eq!(wide.max_char_count(8), Ok(12));
    }

    #[test]
    fn test_max_counts_overflow() {
        for &encoding in Encoding::all() {
            assert_eq!(
                encoding.codec().max_byte_count(usize::MAX),
                Err(Error::ConversionOverflow)
            );
        }
        assert_eq!(
            Encoding::UTF8.codec().max_char_count(usize::MAX),
            Err(Error::ConversionOverflow)
        );
        assert!(Encoding::UTF32LE.codec().max_char_count(usize::MAX / 2).is_ok());
    }

    #[test]
    fn test_unencodable_replacement_hits_recursion_limit() {
        let codec = Codec::builder(Encoding::ASCII)
            .encoder_fallback(ReplacementFallback::new("\u{e9}").unwrap())
            .build();
        assert_eq!(
            codec.encode_str("\u{e9}"),
            Err(Error::IllegalFallbackState(FallbackFault::RecursionLimit))
        );

        let codec = Codec::builder(Encoding::ASCII)
            .encoder_fallback(ReplacementFallback::new("\u{e9}x").unwrap())
            .build();
        assert_eq!(
            codec.encode_str("\u{e9}"),
            Err(Error::IllegalFallbackState(FallbackFault::Recursive))
        );
    }

    #[test]
    fn test_shared_fallback_between_codecs() {
        let fallback: Arc<dyn EncoderFallback> = Arc::new(ReplacementFallback::new("*").unwrap());
        let ascii = Codec::builder(Encoding::ASCII)
            .shared_encoder_fallback(Arc::clone(&fallback))
            .build();
        let latin1 = Codec::builder(Encoding::ISO_8859_1)
            .shared_encoder_fallback(fallback)
            .build();
        assert_eq!(ascii.encode_str("\u{e9}\u{3b1}").unwrap(), b"**");
        assert_eq!(latin1.encode_str("\u{e9}\u{3b1}").unwrap(), b"\xE9*");
    }

    #[test]
    fn test_rebuild_keeps_configuration() {
        let strict = Codec::builder(Encoding::UTF7)
            .allow_optionals(true)
            .strict()
            .build();
        let relaxed = strict
            .rebuild()
            .decoder_fallback(ReplacementFallback::replacement_character())
            .build();
        assert!(relaxed.allow_optionals());
        assert_eq!(relaxed.encoder_fallback().max_unit_count(), 0);
        assert_eq!(relaxed.decode_to_string(b"a\xFF").unwrap(), "a\u{FFFD}");
    }
}
