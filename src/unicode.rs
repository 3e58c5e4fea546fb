//! Code point arithmetic shared by every codec
//!
//! Pure range tests and sequence-length formulas. Nothing here allocates,
//! fails or keeps state; callers are expected to have validated their input
//! where a function documents a precondition.

/// First UTF-16 high (leading) surrogate
pub const HIGH_SURROGATE_START: u32 = 0xD800;
/// Last UTF-16 high (leading) surrogate
pub const HIGH_SURROGATE_END: u32 = 0xDBFF;
/// First UTF-16 low (trailing) surrogate
pub const LOW_SURROGATE_START: u32 = 0xDC00;
/// Last UTF-16 low (trailing) surrogate
pub const LOW_SURROGATE_END: u32 = 0xDFFF;
/// Largest Unicode code point
pub const MAX_CODE_POINT: u32 = 0x10_FFFF;
/// First code point outside the Basic Multilingual Plane
pub const SUPPLEMENTARY_START: u32 = 0x1_0000;

/// True for any value in `0xD800..=0xDFFF`.
#[inline]
pub const fn is_surrogate(value: u32) -> bool {
    value.wrapping_sub(HIGH_SURROGATE_START) <= LOW_SURROGATE_END - HIGH_SURROGATE_START
}

/// True for values in `0xD800..=0xDBFF`.
#[inline]
pub const fn is_high_surrogate(value: u32) -> bool {
    value.wrapping_sub(HIGH_SURROGATE_START) <= HIGH_SURROGATE_END - HIGH_SURROGATE_START
}

/// True for values in `0xDC00..=0xDFFF`.
#[inline]
pub const fn is_low_surrogate(value: u32) -> bool {
    value.wrapping_sub(LOW_SURROGATE_START) <= LOW_SURROGATE_END - LOW_SURROGATE_START
}

/// True iff `value` is a Unicode scalar value: at most U+10FFFF and not a surrogate.
#[inline]
pub const fn is_valid_scalar(value: u32) -> bool {
    value <= MAX_CODE_POINT && !is_surrogate(value)
}

/// True for code points below U+0080.
#[inline]
pub const fn is_ascii(value: u32) -> bool {
    value < 0x80
}

/// True for code points in the Basic Multilingual Plane.
#[inline]
pub const fn is_bmp(value: u32) -> bool {
    value < SUPPLEMENTARY_START
}

/// Combines a surrogate pair into the supplementary code point it encodes.
///
/// `high` must be a high surrogate and `low` a low surrogate. Other inputs
/// produce a meaningless (but non-panicking) result.
#[inline]
pub const fn combine_surrogates(high: u32, low: u32) -> u32 {
    (high.wrapping_sub(HIGH_SURROGATE_START) << 10)
        .wrapping_add(low.wrapping_sub(LOW_SURROGATE_START))
        .wrapping_add(SUPPLEMENTARY_START)
}

/// Splits a supplementary scalar into its `(high, low)` surrogate pair.
///
/// `scalar` must lie in `0x10000..=0x10FFFF`.
#[inline]
pub const fn split_surrogates(scalar: u32) -> (u16, u16) {
    let offset = scalar.wrapping_sub(SUPPLEMENTARY_START);
    (
        (HIGH_SURROGATE_START + ((offset >> 10) & 0x3FF)) as u16,
        (LOW_SURROGATE_START + (offset & 0x3FF)) as u16,
    )
}

/// Number of UTF-16 code units (1 or 2) needed for `scalar`.
///
/// Subtracting 0x10000 leaves a wrapped, huge value for BMP scalars and a
/// small one for supplementary scalars; the top byte after adding `2 << 24`
/// is then exactly the unit count.
#[inline]
pub const fn utf16_len(scalar: u32) -> usize {
    (scalar
        .wrapping_sub(SUPPLEMENTARY_START)
        .wrapping_add(2 << 24)
        >> 24) as usize
}

/// Number of UTF-8 bytes (1 to 4) needed for `scalar`.
#[inline]
pub const fn utf8_len(scalar: u32) -> usize {
    if scalar < 0x80 {
        1
    } else if scalar < 0x800 {
        2
    } else if scalar < SUPPLEMENTARY_START {
        3
    } else {
        4
    }
}

/// Packs `scalar` into `out` using the standard UTF-8 bit layout.
///
/// `out` must hold at least [`utf8_len`] bytes. Returns the number written.
#[inline]
pub(crate) fn write_utf8(scalar: u32, out: &mut [u8]) -> usize {
    if scalar < 0x80 {
        out[0] = scalar as u8;
        1
    } else if scalar < 0x800 {
        out[0] = 0xC0 | (scalar >> 6) as u8;
        out[1] = 0x80 | (scalar & 0x3F) as u8;
        2
    } else if scalar < SUPPLEMENTARY_START {
        out[0] = 0xE0 | (scalar >> 12) as u8;
        out[1] = 0x80 | ((scalar >> 6) & 0x3F) as u8;
        out[2] = 0x80 | (scalar & 0x3F) as u8;
        3
    } else {
        out[0] = 0xF0 | (scalar >> 18) as u8;
        out[1] = 0x80 | ((scalar >> 12) & 0x3F) as u8;
        out[2] = 0x80 | ((scalar >> 6) & 0x3F) as u8;
        out[3] = 0x80 | (scalar & 0x3F) as u8;
        4
    }
}

/// Sequence length declared by a UTF-8 lead byte, or `None` for bytes that
/// can never start a sequence (`80..=BF`, `F8..=FF`).
#[inline]
pub(crate) const fn utf8_declared_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC0..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF7 => Some(4),
        _ => None,
    }
}

/// True for bytes of the form `10xxxxxx`.
#[inline]
pub(crate) const fn is_utf8_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Smallest scalar that legitimately needs a `len`-byte UTF-8 sequence.
#[inline]
pub(crate) const fn utf8_min_for_len(len: usize) -> u32 {
    match len {
        2 => 0x80,
        3 => 0x800,
        4 => SUPPLEMENTARY_START,
        _ => 0,
    }
}

/// Payload bits carried by a lead byte of a `len`-byte sequence.
#[inline]
pub(crate) const fn utf8_lead_bits(lead: u8, len: usize) -> u32 {
    if len <= 1 {
        lead as u32
    } else {
        (lead as u32) & (0x7F >> len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surrogate_ranges() {
        assert!(!is_surrogate(0xD7FF));
        assert!(is_surrogate(0xD800));
        assert!(is_surrogate(0xDFFF));
        assert!(!is_surrogate(0xE000));

        assert!(is_high_surrogate(0xDBFF));
        assert!(!is_high_surrogate(0xDC00));
        assert!(is_low_surrogate(0xDC00));
        assert!(!is_low_surrogate(0xDBFF));
        assert!(!is_low_surrogate(0));
    }

    #[test]
    fn test_valid_scalar() {
        assert!(is_valid_scalar(0));
        assert!(is_valid_scalar(0xD7FF));
        assert!(!is_valid_scalar(0xD800));
        assert!(!is_valid_scalar(0xDFFF));
        assert!(is_valid_scalar(0xE000));
        assert!(is_valid_scalar(0x10FFFF));
        assert!(!is_valid_scalar(0x110000));
        assert!(!is_valid_scalar(u32::MAX));
    }

    #[test]
    fn test_combine_and_split() {
        assert_eq!(combine_surrogates(0xD800, 0xDC00), 0x10000);
        assert_eq!(combine_surrogates(0xDBFF, 0xDFFF), 0x10FFFF);
        assert_eq!(combine_surrogates(0xD83D, 0xDE00), 0x1F600);
        assert_eq!(split_surrogates(0x1F600), (0xD83D, 0xDE00));
        assert_eq!(split_surrogates(0x10000), (0xD800, 0xDC00));
    }

    #[test]
    fn test_sequence_lengths_at_boundaries() {
        for (scalar, utf16, utf8) in [
            (0u32, 1, 1),
            (0x7F, 1, 1),
            (0x80, 1, 2),
            (0x7FF, 1, 2),
            (0x800, 1, 3),
            (0xFFFF, 1, 3),
            (0x10000, 2, 4),
            (0x10FFFF, 2, 4),
        ] {
            assert_eq!(utf16_len(scalar), utf16, "utf16_len({scalar:#X})");
            assert_eq!(utf8_len(scalar), utf8, "utf8_len({scalar:#X})");
        }
    }

    #[test]
    fn test_lengths_agree_with_char() {
        for value in (0..=MAX_CODE_POINT).step_by(97) {
            if let Some(ch) = char::from_u32(value) {
                assert_eq!(utf16_len(value), ch.len_utf16());
                assert_eq!(utf8_len(value), ch.len_utf8());
                let mut buf = [0u8; 4];
                let n = write_utf8(value, &mut buf);
                assert_eq!(&buf[..n], ch.encode_utf8(&mut [0u8; 4]).as_bytes());
            }
        }
    }

    #[test]
    fn test_declared_lengths() {
        assert_eq!(utf8_declared_len(b'A'), Some(1));
        assert_eq!(utf8_declared_len(0x80), None);
        assert_eq!(utf8_declared_len(0xBF), None);
        assert_eq!(utf8_declared_len(0xC0), Some(2));
        assert_eq!(utf8_declared_len(0xEF), Some(3));
        assert_eq!(utf8_declared_len(0xF7), Some(4));
        assert_eq!(utf8_declared_len(0xF8), None);
    }
}
