//! UTF-7 (RFC 2152)
//!
//! Characters from the direct set are written as themselves. Everything
//! else goes into a modified-base64 run that starts with `+` and is closed
//! with `-`. The encoder always writes the closing `-`, and a literal `+`
//! outside a run is written as `+-`.
//!
//! Code units are shifted through base64 as they are, so lone surrogates
//! round-trip and the encoder never needs a fallback.

use super::engine::{DecodeKernel, Decoded, EncodeKernel, Scratch, narrowing_fast_path, widening_fast_path};
use crate::unicode::{SUPPLEMENTARY_START, split_surrogates};

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const DIRECT: u8 = 1;
const OPTIONAL: u8 = 2;

static CLASSES: [u8; 128] = build_classes();

const fn mark(mut table: [u8; 128], chars: &[u8], class: u8) -> [u8; 128] {
    let mut i = 0;
    while i < chars.len() {
        table[chars[i] as usize] = class;
        i += 1;
    }
    table
}

const fn build_classes() -> [u8; 128] {
    let mut table = mark([0; 128], b"\t\n\r '(),-./:?", DIRECT);
    table = mark(table, b"0123456789", DIRECT);
    table = mark(table, b"ABCDEFGHIJKLMNOPQRSTUVWXYZ", DIRECT);
    table = mark(table, b"abcdefghijklmnopqrstuvwxyz", DIRECT);
    mark(table, b"!\"#$%&*;<=>@[]^_`{|}", OPTIONAL)
}

#[inline]
fn is_direct(unit: u16) -> bool {
    unit < 0x80 && CLASSES[unit as usize] == DIRECT
}

#[inline]
fn is_direct_or_optional(unit: u16) -> bool {
    unit < 0x80 && CLASSES[unit as usize] != 0
}

fn direct_run_len(chars: &[u16]) -> usize {
    chars.iter().take_while(|&&unit| is_direct(unit)).count()
}

fn direct_or_optional_run_len(chars: &[u16]) -> usize {
    chars
        .iter()
        .take_while(|&&unit| is_direct_or_optional(unit))
        .count()
}

#[inline]
fn base64_value(byte: u8) -> Option<u32> {
    let value = match byte {
        b'A'..=b'Z' => byte - b'A',
        b'a'..=b'z' => byte - b'a' + 26,
        b'0'..=b'9' => byte - b'0' + 52,
        b'+' => 62,
        b'/' => 63,
        _ => return None,
    };
    Some(u32::from(value))
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Utf7Encoder {
    allow_optionals: bool,
    shifted: bool,
    bits: u32,
    bit_count: u32,
}

impl Utf7Encoder {
    pub(crate) fn new(allow_optionals: bool) -> Self {
        Self {
            allow_optionals,
            shifted: false,
            bits: 0,
            bit_count: 0,
        }
    }

    fn writes_directly(&self, unit: u16) -> bool {
        if self.allow_optionals {
            is_direct_or_optional(unit)
        } else {
            is_direct(unit)
        }
    }

    /// Pads and writes the bits left over from the last unit
    fn flush_bits(&mut self, out: &mut Scratch<u8, 8>) {
        if self.bit_count > 0 {
            let sextet = (self.bits << (6 - self.bit_count)) & 0x3F;
            out.push(BASE64[sextet as usize]);
        }
        self.bits = 0;
        self.bit_count = 0;
    }

    fn encode_unit(mut self, unit: u16, out: &mut Scratch<u8, 8>) -> Self {
        if self.writes_directly(unit) {
            if self.shifted {
                self.flush_bits(out);
                out.push(b'-');
                self.shifted = false;
            }
            out.push(unit as u8);
            return self;
        }

        if !self.shifted {
            if unit == u16::from(b'+') {
                out.extend(b"+-");
                return self;
            }
            out.push(b'+');
            self.shifted = true;
        }

        self.bits = (self.bits << 16) | u32::from(unit);
        self.bit_count += 16;
        while self.bit_count >= 6 {
            self.bit_count -= 6;
            out.push(BASE64[((self.bits >> self.bit_count) & 0x3F) as usize]);
        }
        self.bits &= (1 << self.bit_count) - 1;
        self
    }
}

impl EncodeKernel for Utf7Encoder {
    const ENCODES_LONE_SURROGATES: bool = true;

    fn fast_path(&self, chars: &[u16], out: Option<&mut [u8]>) -> (usize, usize) {
        if self.allow_optionals {
            narrowing_fast_path(chars, out, direct_or_optional_run_len)
        } else {
            narrowing_fast_path(chars, out, direct_run_len)
        }
    }

    fn encode_one(self, code_point: u32, out: &mut Scratch<u8, 8>) -> Option<Self> {
        if code_point >= SUPPLEMENTARY_START {
            let (high, low) = split_surrogates(code_point);
            Some(self.encode_unit(high, out).encode_unit(low, out))
        } else {
            Some(self.encode_unit(code_point as u16, out))
        }
    }

    fn finish(mut self, out: &mut Scratch<u8, 8>) -> Self {
        if self.shifted {
            self.flush_bits(out);
            out.push(b'-');
            self.shifted = false;
        }
        self
    }

    fn is_idle(&self) -> bool {
        !self.shifted
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Utf7Decoder {
    shifted: bool,
    /// Nothing has been read since the `+`
    first_byte: bool,
    bits: u32,
    bit_count: u32,
}

fn literal_run_len(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|&&byte| byte < 0x80 && byte != b'+')
        .count()
}

impl DecodeKernel for Utf7Decoder {
    fn fast_path(&self, bytes: &[u8], out: Option<&mut [u16]>) -> (usize, usize) {
        widening_fast_path(bytes, out, literal_run_len)
    }

    fn step(self, byte: u8) -> (Self, Decoded) {
        if !self.shifted {
            return match byte {
                b'+' => (
                    Utf7Decoder {
                        shifted: true,
                        first_byte: true,
                        ..Utf7Decoder::default()
                    },
                    Decoded::Nothing,
                ),
                0..=0x7F => (self, Decoded::unit(u16::from(byte))),
                _ => (self, Decoded::invalid(&[byte])),
            };
        }

        if let Some(value) = base64_value(byte) {
            let mut next = self;
            next.first_byte = false;
            next.bits = (next.bits << 6) | value;
            next.bit_count += 6;
            if next.bit_count < 16 {
                return (next, Decoded::Nothing);
            }
            next.bit_count -= 16;
            let unit = (next.bits >> next.bit_count) as u16;
            next.bits &= (1 << next.bit_count) - 1;
            return (next, Decoded::unit(unit));
        }

        // any other byte ends the run
        let direct = Utf7Decoder::default();
        match byte {
            b'-' if self.first_byte => (direct, Decoded::unit(u16::from(b'+'))),
            b'-' => (direct, Decoded::Nothing),
            0..=0x7F => (direct, Decoded::unit(u16::from(byte))),
            _ => (direct, Decoded::invalid(&[byte])),
        }
    }

    fn finish(self) -> (Self, Decoded) {
        // leftover bits short of a full unit are padding
        (Utf7Decoder::default(), Decoded::Nothing)
    }

    fn is_idle(&self) -> bool {
        !self.shifted
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::{Codec, Encoding, PassThroughFallback};

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[rstest]
    #[case::escaped_plus("1 + 1", b"1 +- 1")]
    #[case::rfc_example("Hi Mom -\u{263a}-!", b"Hi Mom -+Jjo--+ACE-")]
    #[case::japanese("\u{65e5}\u{672c}\u{8a9e}", b"+ZeVnLIqe-")]
    #[case::trailing_shift("A\u{2262}\u{391}.", b"A+ImIDkQ-.")]
    #[case::empty("", b"")]
    fn test_encode(#[case] text: &str, #[case] expected: &[u8]) {
        let codec = Encoding::UTF7.codec();
        assert_eq!(codec.encode_str(text).unwrap(), expected);
        assert_eq!(codec.byte_count(&utf16(text)).unwrap(), expected.len());
        assert_eq!(codec.decode_to_string(expected).unwrap(), text);
    }

    #[test]
    fn test_optionals_written_directly() {
        let codec = Codec::builder(Encoding::UTF7).allow_optionals(true).build();
        assert_eq!(codec.encode_str("Hi Mom -\u{263a}-!").unwrap(), b"Hi Mom -+Jjo--!");
        assert_eq!(codec.encode_str("a~b").unwrap(), b"a+AH4-b");
    }

    #[rstest]
    #[case::plus_minus(b"+-", "+")]
    #[case::unterminated_run(b"+AGEAYgBj", "abc")]
    #[case::direct_byte_ends_run(b"+AGE.", "a.")]
    #[case::leftover_bits_dropped(b"+AGEA", "a")]
    #[case::plus_then_direct(b"+!", "!")]
    fn test_decode(#[case] bytes: &[u8], #[case] expected: &str) {
        let codec = Encoding::UTF7.codec();
        assert_eq!(codec.decode_to_string(bytes).unwrap(), expected);
    }

    #[test]
    fn test_high_bytes_use_fallback() {
        assert_eq!(
            Encoding::UTF7.codec().decode_to_vec(b"a\xE9b").unwrap(),
            [0x61, 0xFFFD, 0x62]
        );
        let codec = Codec::builder(Encoding::UTF7)
            .decoder_fallback(PassThroughFallback)
            .build();
        assert_eq!(codec.decode_to_vec(b"a\xE9b").unwrap(), [0x61, 0xE9, 0x62]);
    }

    #[test]
    fn test_lone_surrogates_round_trip() {
        let codec = Encoding::UTF7.codec();
        let units = [0x41, 0xD800, 0x42];
        let bytes = codec.encode_to_vec(&units).unwrap();
        assert_eq!(bytes, b"A+2AA-B");
        assert_eq!(codec.decode_to_vec(&bytes).unwrap(), units);
        assert_eq!(codec.decode_to_string(&bytes).unwrap(), "A\u{FFFD}B");
    }

    #[test]
    fn test_run_closed_only_on_flush() {
        let mut encoder = Encoding::UTF7.codec().encoder();
        let mut out = Vec::new();
        encoder.encode_into(&utf16("\u{e9}"), &mut out, false).unwrap();
        assert_eq!(out, b"+AO");
        encoder.encode_into(&[], &mut out, true).unwrap();
        assert_eq!(out, b"+AOk-");
    }

    #[test]
    fn test_max_counts() {
        let codec = Encoding::UTF7.codec();
        assert_eq!(codec.max_byte_count(0).unwrap(), 2);
        assert_eq!(codec.max_byte_count(10).unwrap(), 32);
        assert_eq!(codec.max_char_count(0).unwrap(), 1);
        assert_eq!(codec.max_char_count(10).unwrap(), 10);
    }
}
