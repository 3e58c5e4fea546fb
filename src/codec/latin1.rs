//! ISO-8859-1: every byte is the code point of the same value

use super::engine::{
    DecodeKernel, Decoded, EncodeKernel, Scratch, narrowing_fast_path, widening_fast_path,
};
use crate::simd;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Latin1Encoder;

impl EncodeKernel for Latin1Encoder {
    fn fast_path(&self, chars: &[u16], out: Option<&mut [u8]>) -> (usize, usize) {
        narrowing_fast_path(chars, out, simd::latin1_run_len_utf16)
    }

    fn encode_one(self, code_point: u32, out: &mut Scratch<u8, 8>) -> Option<Self> {
        if code_point <= 0xFF {
            out.push(code_point as u8);
            Some(self)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Latin1Decoder;

impl DecodeKernel for Latin1Decoder {
    fn fast_path(&self, bytes: &[u8], out: Option<&mut [u16]>) -> (usize, usize) {
        widening_fast_path(bytes, out, <[u8]>::len)
    }

    fn step(self, byte: u8) -> (Self, Decoded) {
        (self, Decoded::unit(u16::from(byte)))
    }
}

#[cfg(test)]
mod tests {
    use crate::{BestFitFallback, Codec, Encoding, ReplacementFallback};

    #[test]
    fn test_every_byte_round_trips() {
        let codec = Encoding::ISO_8859_1.codec();
        let bytes: Vec<u8> = (0..=255).collect();
        let units = codec.decode_to_vec(&bytes).unwrap();
        assert_eq!(units, (0..=255u16).collect::<Vec<_>>());
        assert_eq!(codec.encode_to_vec(&units).unwrap(), bytes);
    }

    #[test]
    fn test_default_replaces_outside_latin1() {
        let codec = Encoding::ISO_8859_1.codec();
        assert_eq!(codec.encode_str("caf\u{e9} \u{20ac}5").unwrap(), b"caf\xE9 ?5");
    }

    #[test]
    fn test_best_fit() {
        let codec = Codec::builder(Encoding::ISO_8859_1)
            .encoder_fallback(BestFitFallback)
            .build();
        assert_eq!(
            codec.encode_str("\u{141}\u{f3}d\u{17a} \u{2014} \u{201c}ok\u{201d}").unwrap(),
            b"L\xF3dz - \"ok\""
        );
        assert_eq!(codec.encode_str("\u{ff21}\u{ff42}").unwrap(), b"Ab");
        assert_eq!(codec.encode_str("\u{4e2d}\u{1F600}!").unwrap(), b"??!");
        assert_eq!(codec.byte_count(&[0x4E2D, 0xD83D, 0xDE00]).unwrap(), 2);
    }

    #[test]
    fn test_multi_unit_replacement() {
        let codec = Codec::builder(Encoding::ISO_8859_1)
            .encoder_fallback(ReplacementFallback::new("[?]").unwrap())
            .build();
        assert_eq!(codec.encode_str("a\u{3b1}b").unwrap(), b"a[?]b");
        assert_eq!(codec.max_byte_count(2).unwrap(), 9);
    }
}
