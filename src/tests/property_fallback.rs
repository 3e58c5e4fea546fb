use quickcheck::QuickCheck;
use quickcheck_macros::quickcheck;

use super::support::{TESTS, pick};
use crate::{Codec, Encoding, Error, InvalidSequence};

/// Property: with the default replacement fallbacks nothing is ever rejected.
#[test]
fn replacement_absorbs_everything_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(index: u8, chars: Vec<u16>, bytes: Vec<u8>) -> bool {
        let codec = pick(index).codec();
        codec.encode_to_vec(&chars).is_ok() && codec.decode_to_vec(&bytes).is_ok()
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(u8, Vec<u16>, Vec<u8>) -> bool);
}

/// Property: a strict UTF-8 decoder rejects exactly what `std` rejects, at
/// the same offset.
#[test]
fn strict_utf8_agrees_with_std_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(bytes: Vec<u8>) -> bool {
        let strict = Codec::builder(Encoding::UTF8).strict().build();
        match (std::str::from_utf8(&bytes), strict.char_count(&bytes)) {
            (Ok(text), Ok(count)) => count == text.encode_utf16().count(),
            (Err(e), Err(Error::InvalidCharacterSequence { index, sequence })) => {
                index == e.valid_up_to() && matches!(sequence, InvalidSequence::Bytes(_))
            }
            _ => false,
        }
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(Vec<u8>) -> bool);
}

#[quickcheck]
fn strict_ascii_reports_first_unencodable(chars: Vec<u16>) -> bool {
    let strict = Codec::builder(Encoding::ASCII).strict().build();
    let first = chars.iter().position(|&unit| unit >= 0x80);
    match (first, strict.encode_to_vec(&chars)) {
        (None, Ok(bytes)) => bytes.iter().map(|&b| u16::from(b)).eq(chars.iter().copied()),
        (Some(position), Err(Error::InvalidCharacterSequence { index, .. })) => index == position,
        _ => false,
    }
}

/// Property: `reset` returns a decoder to its freshly created state, so
/// positions in errors count from the reset.
#[test]
fn reset_forgets_state_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(index: u8, junk: Vec<u8>, bytes: Vec<u8>) -> bool {
        let codec = pick(index).codec();
        let strict = codec.rebuild().strict().build();

        let mut decoder = strict.decoder();
        let _ = decoder.decode_into(&junk, &mut Vec::new(), false);
        decoder.reset();
        let mut after_reset = Vec::new();
        let reused = decoder.decode_into(&bytes, &mut after_reset, true);

        let mut fresh = strict.decoder();
        let mut from_fresh = Vec::new();
        let expected = fresh.decode_into(&bytes, &mut from_fresh, true);

        reused == expected && after_reset == from_fresh
    }

    QuickCheck::new()
        .tests(TESTS)
        .quickcheck(prop as fn(u8, Vec<u8>, Vec<u8>) -> bool);
}

#[quickcheck]
fn encoder_reset_forgets_state(index: u8, junk: Vec<u16>, chars: Vec<u16>) -> bool {
    let codec = pick(index).codec();
    let mut encoder = codec.encoder();
    let _ = encoder.encode_into(&junk, &mut Vec::new(), false);
    encoder.reset();
    let mut out = Vec::new();
    encoder.encode_into(&chars, &mut out, true).is_ok()
        && codec.encode_to_vec(&chars).ok() == Some(out)
}
