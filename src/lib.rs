//! # FastTranscode - Incremental Text Transcoding Engine
//!
//! Converts between in-memory UTF-16 text and the byte forms of seven
//! encodings: US-ASCII, ISO-8859-1, UTF-7, UTF-8, UTF-16 (both byte orders)
//! and UTF-32 (both byte orders).
//!
//! ## Features
//!
//! - **Streaming conversion** through [`Encoder`] / [`Decoder`] that carry partial
//!   sequences between calls and produce byte-identical output to a one-shot call
//! - **Pluggable fallbacks** for unencodable or malformed input: replacement,
//!   exception and Latin-1 best-fit
//! - **Exact and worst-case sizing** (`byte_count`, `max_byte_count`, ...)
//! - **Vectorized fast paths** for ASCII-heavy text
//! - **`std::io` adapters** for transcoding readers and writers
//!
//! ## Quick Start
//!
//! ```rust
//! use fast_transcode::{Encoding, Translator};
//!
//! let translator = Translator::new(Encoding::UTF8, Encoding::UTF16BE);
//! let utf16 = translator.convert("Hi".as_bytes()).unwrap();
//! assert_eq!(utf16, [0x00, b'H', 0x00, b'i']);
//!
//! let ascii = Encoding::ASCII.codec();
//! let bytes = ascii.encode_str("A\u{e9}B").unwrap();
//! assert_eq!(bytes, b"A?B");
//! ```

#![cfg_attr(feature = "simd", feature(portable_simd))]
#![deny(missing_docs)]

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

pub mod codec;
pub mod detection;
pub mod fallback;
pub mod rune;
pub mod simd;
pub mod stream;
pub mod unicode;

#[cfg(test)]
mod tests;

pub use codec::{Codec, CodecBuilder, Conversion, Decoder, Encoder};
pub use fallback::{
    BestFitFallback, DecoderFallback, DecoderFallbackBuffer, EncoderFallback,
    EncoderFallbackBuffer, ExceptionFallback, PassThroughFallback, ReplacementFallback,
};
pub use rune::{Category, OperationStatus, Rune};
pub use stream::{TranscodingReader, TranscodingWriter};

/// Result type for transcoding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during transcoding operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Numeric value is not a Unicode scalar value
    #[error("0x{value:X} is not a Unicode scalar value")]
    InvalidScalar {
        /// The rejected value
        value: u32,
    },
    /// Input the active fallback refused to substitute
    #[error("invalid sequence {sequence} at index {index}")]
    InvalidCharacterSequence {
        /// Offending bytes (decoding) or code units (encoding)
        sequence: InvalidSequence,
        /// Absolute position of the sequence in the stream
        index: usize,
    },
    /// Output buffer cannot hold the next piece of output
    #[error("destination too small after consuming {consumed} and writing {written}")]
    DestinationTooSmall {
        /// Input units or bytes consumed before stopping
        consumed: usize,
        /// Output units or bytes written before stopping
        written: usize,
    },
    /// Accumulated output count exceeded the representable range
    #[error("conversion output count overflowed")]
    ConversionOverflow,
    /// A fallback buffer was driven outside its contract
    #[error("illegal fallback state: {0}")]
    IllegalFallbackState(FallbackFault),
    /// Code page or name not known to the registry
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
    /// Replacement text that cannot be staged by a fallback buffer
    #[error("invalid replacement text at unit {index}")]
    InvalidReplacement {
        /// Offset of the offending code unit within the replacement
        index: usize,
    },
}

/// Data attached to [`Error::InvalidCharacterSequence`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidSequence {
    /// Undecodable bytes
    Bytes(Vec<u8>),
    /// Unencodable UTF-16 code units
    Units(Vec<u16>),
}

impl fmt::Display for InvalidSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidSequence::Bytes(bytes) => {
                write!(f, "[")?;
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{byte:02X}")?;
                }
                write!(f, "]")
            }
            InvalidSequence::Units(units) => {
                for (i, unit) in units.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "\\u{unit:04X}")?;
                }
                Ok(())
            }
        }
    }
}

/// Ways a fallback buffer can be misused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackFault {
    /// Asked to stage a replacement while the previous one is undrained
    Recursive,
    /// Fallback output kept triggering the fallback past the depth limit
    RecursionLimit,
}

impl fmt::Display for FallbackFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackFault::Recursive => write!(f, "recursive fallback, buffer not empty"),
            FallbackFault::RecursionLimit => write!(f, "fallback recursion limit exceeded"),
        }
    }
}

/// Supported character encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(non_camel_case_types)]
pub enum Encoding {
    /// US-ASCII (7-bit, 0-127)
    ASCII,
    /// ISO-8859-1 (Latin-1), every byte maps to U+0000..U+00FF
    ISO_8859_1,
    /// UTF-7 (RFC 2152)
    UTF7,
    /// UTF-8 (variable length, 1-4 bytes)
    UTF8,
    /// UTF-16 little endian
    UTF16LE,
    /// UTF-16 big endian
    UTF16BE,
    /// UTF-32 little endian
    UTF32LE,
    /// UTF-32 big endian
    UTF32BE,
}

const ALIASES: &[(&str, Encoding)] = &[
    ("us-ascii", Encoding::ASCII),
    ("ascii", Encoding::ASCII),
    ("us", Encoding::ASCII),
    ("ansi_x3.4-1968", Encoding::ASCII),
    ("ansi_x3.4-1986", Encoding::ASCII),
    ("cp367", Encoding::ASCII),
    ("csascii", Encoding::ASCII),
    ("ibm367", Encoding::ASCII),
    ("iso-ir-6", Encoding::ASCII),
    ("iso646-us", Encoding::ASCII),
    ("iso_646.irv:1991", Encoding::ASCII),
    ("iso-8859-1", Encoding::ISO_8859_1),
    ("iso8859-1", Encoding::ISO_8859_1),
    ("iso_8859-1", Encoding::ISO_8859_1),
    ("iso_8859-1:1987", Encoding::ISO_8859_1),
    ("latin1", Encoding::ISO_8859_1),
    ("latin-1", Encoding::ISO_8859_1),
    ("l1", Encoding::ISO_8859_1),
    ("cp819", Encoding::ISO_8859_1),
    ("ibm819", Encoding::ISO_8859_1),
    ("iso-ir-100", Encoding::ISO_8859_1),
    ("csisolatin1", Encoding::ISO_8859_1),
    ("utf-7", Encoding::UTF7),
    ("utf7", Encoding::UTF7),
    ("unicode-1-1-utf-7", Encoding::UTF7),
    ("unicode-2-0-utf-7", Encoding::UTF7),
    ("x-unicode-1-1-utf-7", Encoding::UTF7),
    ("x-unicode-2-0-utf-7", Encoding::UTF7),
    ("csunicode11utf7", Encoding::UTF7),
    ("utf-8", Encoding::UTF8),
    ("utf8", Encoding::UTF8),
    ("unicode-1-1-utf-8", Encoding::UTF8),
    ("unicode-2-0-utf-8", Encoding::UTF8),
    ("x-unicode20utf8", Encoding::UTF8),
    ("utf-16", Encoding::UTF16LE),
    ("utf-16le", Encoding::UTF16LE),
    ("utf16", Encoding::UTF16LE),
    ("utf16le", Encoding::UTF16LE),
    ("unicode", Encoding::UTF16LE),
    ("ucs-2", Encoding::UTF16LE),
    ("iso-10646-ucs-2", Encoding::UTF16LE),
    ("csunicode", Encoding::UTF16LE),
    ("utf-16be", Encoding::UTF16BE),
    ("utf16be", Encoding::UTF16BE),
    ("unicodefffe", Encoding::UTF16BE),
    ("utf-32", Encoding::UTF32LE),
    ("utf-32le", Encoding::UTF32LE),
    ("utf32", Encoding::UTF32LE),
    ("utf32le", Encoding::UTF32LE),
    ("utf-32be", Encoding::UTF32BE),
    ("utf32be", Encoding::UTF32BE),
];

impl Encoding {
    /// Get the canonical display name of this encoding
    pub fn name(self) -> &'static str {
        match self {
            Encoding::ASCII => "US-ASCII",
            Encoding::ISO_8859_1 => "ISO-8859-1",
            Encoding::UTF7 => "UTF-7",
            Encoding::UTF8 => "UTF-8",
            Encoding::UTF16LE => "UTF-16LE",
            Encoding::UTF16BE => "UTF-16BE",
            Encoding::UTF32LE => "UTF-32LE",
            Encoding::UTF32BE => "UTF-32BE",
        }
    }

    /// Name used in web and mail headers (IANA preferred MIME name)
    pub fn web_name(self) -> &'static str {
        match self {
            Encoding::ASCII => "us-ascii",
            Encoding::ISO_8859_1 => "iso-8859-1",
            Encoding::UTF7 => "utf-7",
            Encoding::UTF8 => "utf-8",
            Encoding::UTF16LE => "utf-16",
            Encoding::UTF16BE => "utf-16BE",
            Encoding::UTF32LE => "utf-32",
            Encoding::UTF32BE => "utf-32BE",
        }
    }

    /// Numeric code-page identifier
    pub fn code_page(self) -> u32 {
        match self {
            Encoding::ASCII => 20127,
            Encoding::ISO_8859_1 => 28591,
            Encoding::UTF7 => 65000,
            Encoding::UTF8 => 65001,
            Encoding::UTF16LE => 1200,
            Encoding::UTF16BE => 1201,
            Encoding::UTF32LE => 12000,
            Encoding::UTF32BE => 12001,
        }
    }

    /// Look up an encoding by code-page identifier
    pub fn from_code_page(code_page: u32) -> Result<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|encoding| encoding.code_page() == code_page)
            .ok_or_else(|| {
                log::debug!("no encoding registered for code page {code_page}");
                Error::UnsupportedEncoding(code_page.to_string())
            })
    }

    /// Look up an encoding by name or alias, ignoring ASCII case
    pub fn from_name(name: &str) -> Result<Self> {
        let trimmed = name.trim();
        ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
            .map(|&(_, encoding)| encoding)
            .ok_or_else(|| {
                log::debug!("no encoding registered under the name {trimmed:?}");
                Error::UnsupportedEncoding(trimmed.to_string())
            })
    }

    /// Every supported encoding, ordered by [`Ord`]
    pub fn all() -> &'static [Encoding] {
        &[
            Encoding::ASCII,
            Encoding::ISO_8859_1,
            Encoding::UTF7,
            Encoding::UTF8,
            Encoding::UTF16LE,
            Encoding::UTF16BE,
            Encoding::UTF32LE,
            Encoding::UTF32BE,
        ]
    }

    /// Check if this encoding is ASCII-compatible (ASCII bytes 0-127 have same meaning)
    pub fn is_ascii_compatible(self) -> bool {
        matches!(
            self,
            Encoding::ASCII | Encoding::ISO_8859_1 | Encoding::UTF8
        )
    }

    /// Check if every character occupies exactly one byte
    pub fn is_single_byte(self) -> bool {
        matches!(self, Encoding::ASCII | Encoding::ISO_8859_1)
    }

    /// Get the byte order mark (BOM) for this encoding if it has one
    pub fn bom(self) -> Option<&'static [u8]> {
        match self {
            Encoding::UTF8 => Some(&[0xEF, 0xBB, 0xBF]),
            Encoding::UTF16LE => Some(&[0xFF, 0xFE]),
            Encoding::UTF16BE => Some(&[0xFE, 0xFF]),
            Encoding::UTF32LE => Some(&[0xFF, 0xFE, 0x00, 0x00]),
            Encoding::UTF32BE => Some(&[0x00, 0x00, 0xFE, 0xFF]),
            Encoding::ASCII | Encoding::ISO_8859_1 | Encoding::UTF7 => None,
        }
    }

    /// Shared default codec for this encoding
    ///
    /// The instance is built once per process and is safe to use from any
    /// thread; call [`Codec::builder`] for a differently configured codec.
    pub fn codec(self) -> &'static Codec {
        codec::shared(self)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Encoding::from_name(s)
    }
}

impl Serialize for Encoding {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// One-shot converter between two encodings, pivoting through UTF-16
#[derive(Debug, Clone)]
pub struct Translator {
    from: Codec,
    to: Codec,
}

impl Translator {
    /// Create a translator using the default codecs of both encodings
    pub fn new(from: Encoding, to: Encoding) -> Self {
        Self::with_codecs(from.codec().clone(), to.codec().clone())
    }

    /// Create a translator from explicitly configured codecs
    pub fn with_codecs(from: Codec, to: Codec) -> Self {
        Self { from, to }
    }

    /// Get source encoding
    pub fn from_encoding(&self) -> Encoding {
        self.from.encoding()
    }

    /// Get target encoding
    pub fn to_encoding(&self) -> Encoding {
        self.to.encoding()
    }

    /// Convert data from source to target encoding
    ///
    /// Malformed or unrepresentable data is handled by the codecs' fallbacks,
    /// so this only fails when one of them is an exception fallback.
    pub fn convert(&self, input: &[u8]) -> Result<Vec<u8>> {
        let text = self.from.decode_to_vec(input)?;
        self.to.encode_to_vec(&text)
    }

    /// Convert, substituting `replacement` for anything either side rejects
    ///
    /// `replacement` is read as the code point of the same value. When the
    /// target cannot encode it, `?` is substituted instead.
    pub fn convert_lossy(&self, input: &[u8], replacement: u8) -> Result<Vec<u8>> {
        match self.convert(input) {
            Err(Error::InvalidCharacterSequence { .. }) => {
                let lossy_from = self
                    .from
                    .rebuild()
                    .decoder_fallback(ReplacementFallback::replacement_character())
                    .build();
                let lossy_to = self
                    .to
                    .rebuild()
                    .encoder_fallback(self.substitute(replacement))
                    .build();
                Translator::with_codecs(lossy_from, lossy_to).convert(input)
            }
            other => other,
        }
    }

    fn substitute(&self, replacement: u8) -> ReplacementFallback {
        let unit = [u16::from(replacement)];
        let encodable = self
            .to
            .rebuild()
            .strict()
            .build()
            .byte_count(&unit)
            .is_ok();
        match ReplacementFallback::from_utf16(&unit) {
            Ok(fallback) if encodable => fallback,
            _ => {
                log::debug!(
                    "{} cannot encode replacement 0x{replacement:02X}, substituting '?'",
                    self.to.name()
                );
                ReplacementFallback::question_mark()
            }
        }
    }
}

/// Chunk-at-a-time converter that carries partial sequences between chunks
#[derive(Debug, Clone)]
pub struct StreamingTranslator {
    decoder: Decoder,
    encoder: Encoder,
    /// Intermediate UTF-16 buffer
    pivot: Vec<u16>,
}

impl StreamingTranslator {
    /// Create a new streaming translator with the given pivot capacity in code units
    pub fn new(from: Encoding, to: Encoding, buffer_size: usize) -> Self {
        Self {
            decoder: from.codec().decoder(),
            encoder: to.codec().encoder(),
            pivot: Vec::with_capacity(buffer_size),
        }
    }

    /// Create with default 64K-unit buffer
    pub fn with_default_buffer(from: Encoding, to: Encoding) -> Self {
        Self::new(from, to, 64 * 1024)
    }

    /// Process a chunk of data, holding back any incomplete trailing sequence
    pub fn process_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        self.pump(input, false)
    }

    /// Flush held-back state at end of stream
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        self.pump(&[], true)
    }

    fn pump(&mut self, input: &[u8], flush: bool) -> Result<Vec<u8>> {
        self.pivot.clear();
        self.decoder.decode_into(input, &mut self.pivot, flush)?;
        let mut output = Vec::new();
        self.encoder.encode_into(&self.pivot, &mut output, flush)?;
        Ok(output)
    }
}

#[cfg(test)]
mod translator_tests {
    use super::*;

    #[test]
    fn test_utf8_to_utf16le() {
        let translator = Translator::new(Encoding::UTF8, Encoding::UTF16LE);
        let output = translator.convert("Hé😀".as_bytes()).unwrap();
        assert_eq!(output, [0x48, 0x00, 0xE9, 0x00, 0x3D, 0xD8, 0x00, 0xDE]);
    }

    #[test]
    fn test_utf16_endianness_conversion() {
        let le_to_be = Translator::new(Encoding::UTF16LE, Encoding::UTF16BE);

        // "Hi" in UTF-16LE (0x0048, 0x0069)
        let le_input = &[0x48, 0x00, 0x69, 0x00];
        let be_output = le_to_be.convert(le_input).unwrap();
        assert_eq!(be_output, [0x00, 0x48, 0x00, 0x69]);

        let be_to_le = Translator::new(Encoding::UTF16BE, Encoding::UTF16LE);
        assert_eq!(be_to_le.convert(&be_output).unwrap(), le_input);
    }

    #[test]
    fn test_latin1_to_utf8_and_back() {
        let original = b"Caf\xE9 \xA9";
        let forward = Translator::new(Encoding::ISO_8859_1, Encoding::UTF8)
            .convert(original)
            .unwrap();
        assert_eq!(std::str::from_utf8(&forward).unwrap(), "Café ©");

        let back = Translator::new(Encoding::UTF8, Encoding::ISO_8859_1)
            .convert(&forward)
            .unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_utf8_to_ascii_substitutes() {
        let translator = Translator::new(Encoding::UTF8, Encoding::ASCII);
        assert_eq!(translator.convert("naïve".as_bytes()).unwrap(), b"na?ve");
    }

    #[test]
    fn test_strict_translator_fails_then_lossy_recovers() {
        let from = Codec::builder(Encoding::UTF8).strict().build();
        let to = Codec::builder(Encoding::ASCII).strict().build();
        let translator = Translator::with_codecs(from, to);

        let err = translator.convert(b"ok\xFFok").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidCharacterSequence {
                sequence: InvalidSequence::Bytes(vec![0xFF]),
                index: 2,
            }
        );

        assert_eq!(translator.convert_lossy("ok\u{e9}".as_bytes(), b'*').unwrap(), b"ok*");
        // the decoder side falls back to U+FFFD, which ASCII then replaces
        assert_eq!(translator.convert_lossy(b"ok\xFF", b'*').unwrap(), b"ok*");
    }

    #[test]
    fn test_lossy_replacement_the_target_cannot_encode() {
        let from = Codec::builder(Encoding::UTF8).strict().build();
        let to = Codec::builder(Encoding::ASCII).strict().build();
        let translator = Translator::with_codecs(from, to);

        assert_eq!(
            translator.convert_lossy("hello \u{e9}".as_bytes(), 0xE9).unwrap(),
            b"hello ?"
        );
        assert_eq!(translator.convert_lossy(b"a\xFFb", 0).unwrap(), b"a?b");
    }

    #[test]
    fn test_lossy_keeps_target_encodable_replacement() {
        let to = Codec::builder(Encoding::ISO_8859_1).strict().build();
        let translator = Translator::with_codecs(Encoding::UTF8.codec().clone(), to);
        assert_eq!(
            translator.convert_lossy("\u{20ac}5".as_bytes(), 0xA4).unwrap(),
            [0xA4, b'5']
        );
    }

    #[test]
    fn test_streaming_translator_split_sequence() {
        let mut stream = StreamingTranslator::with_default_buffer(Encoding::UTF8, Encoding::UTF16BE);
        let bytes = "a€".as_bytes(); // 61 E2 82 AC

        let mut combined = stream.process_chunk(&bytes[..2]).unwrap();
        combined.extend(stream.process_chunk(&bytes[2..]).unwrap());
        combined.extend(stream.finish().unwrap());

        assert_eq!(combined, [0x00, 0x61, 0x20, 0xAC]);
    }

    #[test]
    fn test_streaming_translator_truncated_tail() {
        let mut stream = StreamingTranslator::new(Encoding::UTF8, Encoding::UTF8, 16);
        let first = stream.process_chunk(b"ab\xE2\x82").unwrap();
        assert_eq!(first, b"ab");
        assert_eq!(stream.finish().unwrap(), "\u{FFFD}".as_bytes());
    }

    #[test]
    fn test_encoding_properties() {
        assert_eq!(Encoding::UTF8.name(), "UTF-8");
        assert_eq!(Encoding::UTF16LE.web_name(), "utf-16");
        assert!(Encoding::UTF8.is_ascii_compatible());
        assert!(!Encoding::UTF16BE.is_ascii_compatible());
        assert!(!Encoding::UTF7.is_ascii_compatible());
        assert!(Encoding::ISO_8859_1.is_single_byte());
        assert!(!Encoding::UTF8.is_single_byte());

        assert_eq!(Encoding::UTF8.bom(), Some([0xEF, 0xBB, 0xBF].as_slice()));
        assert_eq!(Encoding::UTF32LE.bom(), Some([0xFF, 0xFE, 0x00, 0x00].as_slice()));
        assert_eq!(Encoding::UTF32BE.bom(), Some([0x00, 0x00, 0xFE, 0xFF].as_slice()));
        assert_eq!(Encoding::UTF7.bom(), None);
    }

    #[test]
    fn test_code_page_registry() {
        for &encoding in Encoding::all() {
            assert_eq!(Encoding::from_code_page(encoding.code_page()), Ok(encoding));
            assert_eq!(encoding.name().parse::<Encoding>(), Ok(encoding));
            assert_eq!(Encoding::from_name(encoding.web_name()), Ok(encoding));
        }
        assert_eq!(Encoding::UTF7.code_page(), 65000);
        assert_eq!(Encoding::UTF32BE.code_page(), 12001);
        assert_eq!(
            Encoding::from_code_page(1252),
            Err(Error::UnsupportedEncoding("1252".into()))
        );
    }

    #[test]
    fn test_name_aliases() {
        assert_eq!("latin1".parse::<Encoding>(), Ok(Encoding::ISO_8859_1));
        assert_eq!("UnicodeFFFE".parse::<Encoding>(), Ok(Encoding::UTF16BE));
        assert_eq!(" UTF8 ".parse::<Encoding>(), Ok(Encoding::UTF8));
        assert_eq!(
            "unicode-1-1-utf-7".parse::<Encoding>(),
            Ok(Encoding::UTF7)
        );
        assert!(matches!(
            "ebcdic".parse::<Encoding>(),
            Err(Error::UnsupportedEncoding(name)) if name == "ebcdic"
        ));
    }

    #[test]
    fn test_error_display() {
        let err = Error::InvalidCharacterSequence {
            sequence: InvalidSequence::Bytes(vec![0xC0, 0x80]),
            index: 7,
        };
        assert_eq!(err.to_string(), "invalid sequence [C0 80] at index 7");

        let err = Error::InvalidCharacterSequence {
            sequence: InvalidSequence::Units(vec![0xD800]),
            index: 0,
        };
        assert_eq!(err.to_string(), "invalid sequence \\uD800 at index 0");
        assert_eq!(
            Error::IllegalFallbackState(FallbackFault::Recursive).to_string(),
            "illegal fallback state: recursive fallback, buffer not empty"
        );
    }
}
