//! Unicode scalar values
//!
//! [`Rune`] is a validated scalar (any code point except surrogates) with
//! first/last decoding over UTF-16 and UTF-8 slices, non-panicking encoders
//! and a small classification API. ASCII is answered from a lookup table,
//! everything else from the Unicode general category tables.

use std::fmt;

use unicode_general_category::{GeneralCategory, get_general_category};

use crate::unicode::{
    self, is_high_surrogate, is_low_surrogate, is_utf8_continuation, utf8_declared_len,
};
use crate::{Error, Result};

/// Outcome of a slice decoding step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    /// A complete scalar was read
    Done,
    /// The slice ends inside a sequence that more data could complete
    NeedMoreData,
    /// The slice starts (or ends) with a malformed sequence
    InvalidData,
    /// Output space ran out
    DestinationTooSmall,
}

/// Simplified general category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Lu
    UppercaseLetter,
    /// Ll
    LowercaseLetter,
    /// Lt, Lm, Lo
    OtherLetter,
    /// Nd, Nl, No
    Number,
    /// Zs, Zl, Zp
    Separator,
    /// Cc
    Control,
    /// All P* categories
    Punctuation,
    /// All S* categories
    Symbol,
    /// Marks, format, private use, unassigned
    Other,
}

/// A Unicode scalar value: `0..=0xD7FF` or `0xE000..=0x10FFFF`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rune(u32);

impl Rune {
    /// U+FFFD REPLACEMENT CHARACTER
    pub const REPLACEMENT_CHAR: Rune = Rune(0xFFFD);

    /// Validates a numeric scalar
    pub fn from_u32(value: u32) -> Result<Self> {
        if unicode::is_valid_scalar(value) {
            Ok(Rune(value))
        } else {
            Err(Error::InvalidScalar { value })
        }
    }

    /// Builds a rune from a single UTF-16 unit, rejecting surrogates
    pub fn from_char16(unit: u16) -> Result<Self> {
        Self::from_u32(u32::from(unit))
    }

    /// Builds a rune from a high/low surrogate pair
    pub fn from_surrogate_pair(high: u16, low: u16) -> Result<Self> {
        let (high, low) = (u32::from(high), u32::from(low));
        if !is_high_surrogate(high) {
            return Err(Error::InvalidScalar { value: high });
        }
        if !is_low_surrogate(low) {
            return Err(Error::InvalidScalar { value: low });
        }
        Ok(Rune(unicode::combine_surrogates(high, low)))
    }

    /// Numeric value
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Same scalar as a `char`
    pub fn to_char(self) -> char {
        char::from_u32(self.0).unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    /// True below U+0080
    #[inline]
    pub const fn is_ascii(self) -> bool {
        unicode::is_ascii(self.0)
    }

    /// True below U+10000
    #[inline]
    pub const fn is_bmp(self) -> bool {
        unicode::is_bmp(self.0)
    }

    /// UTF-16 units needed (1 or 2)
    #[inline]
    pub const fn utf16_len(self) -> usize {
        unicode::utf16_len(self.0)
    }

    /// UTF-8 bytes needed (1 to 4)
    #[inline]
    pub const fn utf8_len(self) -> usize {
        unicode::utf8_len(self.0)
    }

    /// Decodes the scalar at the start of `source`.
    ///
    /// Returns the rune (or [`Rune::REPLACEMENT_CHAR`] on failure), the
    /// number of units it occupies and the status. A high surrogate that is
    /// the last unit yields `NeedMoreData`; a lone low surrogate or a high
    /// surrogate followed by anything but a low surrogate consumes one unit
    /// and yields `InvalidData`.
    pub fn decode_first_utf16(source: &[u16]) -> (Rune, usize, OperationStatus) {
        let Some(&first) = source.first() else {
            return (Self::REPLACEMENT_CHAR, 0, OperationStatus::NeedMoreData);
        };
        let first = u32::from(first);
        if !unicode::is_surrogate(first) {
            return (Rune(first), 1, OperationStatus::Done);
        }
        if is_high_surrogate(first) {
            match source.get(1).map(|&unit| u32::from(unit)) {
                None => return (Self::REPLACEMENT_CHAR, 1, OperationStatus::NeedMoreData),
                Some(low) if is_low_surrogate(low) => {
                    return (
                        Rune(unicode::combine_surrogates(first, low)),
                        2,
                        OperationStatus::Done,
                    );
                }
                Some(_) => {}
            }
        }
        (Self::REPLACEMENT_CHAR, 1, OperationStatus::InvalidData)
    }

    /// Decodes the scalar that ends `source`, for reverse iteration.
    ///
    /// A trailing high surrogate can never be completed by earlier data and
    /// is reported as `InvalidData`.
    pub fn decode_last_utf16(source: &[u16]) -> (Rune, usize, OperationStatus) {
        let Some(&last) = source.last() else {
            return (Self::REPLACEMENT_CHAR, 0, OperationStatus::NeedMoreData);
        };
        let last = u32::from(last);
        if !unicode::is_surrogate(last) {
            return (Rune(last), 1, OperationStatus::Done);
        }
        if is_low_surrogate(last) && source.len() >= 2 {
            let high = u32::from(source[source.len() - 2]);
            if is_high_surrogate(high) {
                return (
                    Rune(unicode::combine_surrogates(high, last)),
                    2,
                    OperationStatus::Done,
                );
            }
        }
        (Self::REPLACEMENT_CHAR, 1, OperationStatus::InvalidData)
    }

    /// Decodes the scalar at the start of a UTF-8 slice.
    ///
    /// Malformed input consumes the lead byte plus every continuation byte
    /// that follows it, up to the declared length. Overlong forms, surrogates
    /// and values above U+10FFFF consume the whole declared sequence.
    /// A sequence cut short by the end of `source` yields `NeedMoreData` and
    /// reports the bytes present.
    pub fn decode_first_utf8(source: &[u8]) -> (Rune, usize, OperationStatus) {
        let Some(&lead) = source.first() else {
            return (Self::REPLACEMENT_CHAR, 0, OperationStatus::NeedMoreData);
        };
        let Some(len) = utf8_declared_len(lead) else {
            return (Self::REPLACEMENT_CHAR, 1, OperationStatus::InvalidData);
        };
        let mut value = unicode::utf8_lead_bits(lead, len);
        for k in 1..len {
            match source.get(k) {
                None => return (Self::REPLACEMENT_CHAR, k, OperationStatus::NeedMoreData),
                Some(&byte) if is_utf8_continuation(byte) => {
                    value = (value << 6) | u32::from(byte & 0x3F);
                }
                Some(_) => return (Self::REPLACEMENT_CHAR, k, OperationStatus::InvalidData),
            }
        }
        if value < unicode::utf8_min_for_len(len) || !unicode::is_valid_scalar(value) {
            return (Self::REPLACEMENT_CHAR, len, OperationStatus::InvalidData);
        }
        (Rune(value), len, OperationStatus::Done)
    }

    /// Decodes the scalar that ends a UTF-8 slice.
    ///
    /// An incomplete trailing sequence reports `InvalidData` and covers the
    /// bytes of that sequence. A complete but overlong, surrogate or
    /// out-of-range sequence covers the whole sequence, as in forward
    /// decoding. A stray continuation byte covers one byte.
    pub fn decode_last_utf8(source: &[u8]) -> (Rune, usize, OperationStatus) {
        if source.is_empty() {
            return (Self::REPLACEMENT_CHAR, 0, OperationStatus::NeedMoreData);
        }
        let end = source.len();
        let floor = end.saturating_sub(4);
        let mut start = end - 1;
        while start > floor && is_utf8_continuation(source[start]) {
            start -= 1;
        }
        let (rune, consumed, status) = Self::decode_first_utf8(&source[start..]);
        match status {
            OperationStatus::Done if start + consumed == end => (rune, consumed, status),
            OperationStatus::NeedMoreData => {
                (Self::REPLACEMENT_CHAR, end - start, OperationStatus::InvalidData)
            }
            OperationStatus::InvalidData if start + consumed == end => {
                (Self::REPLACEMENT_CHAR, consumed, OperationStatus::InvalidData)
            }
            _ => (Self::REPLACEMENT_CHAR, 1, OperationStatus::InvalidData),
        }
    }

    /// Writes the rune as UTF-16; `None` if `dest` is too short (nothing written)
    pub fn try_encode_utf16(self, dest: &mut [u16]) -> Option<usize> {
        if self.is_bmp() {
            *dest.first_mut()? = self.0 as u16;
            Some(1)
        } else {
            let [high_slot, low_slot, ..] = dest else {
                return None;
            };
            let (high, low) = unicode::split_surrogates(self.0);
            *high_slot = high;
            *low_slot = low;
            Some(2)
        }
    }

    /// Writes the rune as UTF-8; `None` if `dest` is too short (nothing written)
    pub fn try_encode_utf8(self, dest: &mut [u8]) -> Option<usize> {
        if dest.len() < self.utf8_len() {
            return None;
        }
        Some(unicode::write_utf8(self.0, dest))
    }

    /// Letter test: general category L* (Lu, Ll, Lt, Lm, Lo)
    pub fn is_letter(self) -> bool {
        match ascii_flags(self.0) {
            Some(flags) => flags & LETTER != 0,
            None => matches!(
                self.general_category(),
                GeneralCategory::UppercaseLetter
                    | GeneralCategory::LowercaseLetter
                    | GeneralCategory::TitlecaseLetter
                    | GeneralCategory::ModifierLetter
                    | GeneralCategory::OtherLetter
            ),
        }
    }

    /// Digit test: general category Nd only, so `½` and `Ⅻ` are not digits
    pub fn is_digit(self) -> bool {
        match ascii_flags(self.0) {
            Some(flags) => flags & DIGIT != 0,
            None => matches!(self.general_category(), GeneralCategory::DecimalNumber),
        }
    }

    /// Unicode `White_Space` property
    pub fn is_whitespace(self) -> bool {
        match ascii_flags(self.0) {
            Some(flags) => flags & WHITESPACE != 0,
            None => self.to_char().is_whitespace(),
        }
    }

    /// Simplified general category
    pub fn category(self) -> Category {
        if let Some(flags) = ascii_flags(self.0) {
            return if flags & UPPER != 0 {
                Category::UppercaseLetter
            } else if flags & LOWER != 0 {
                Category::LowercaseLetter
            } else if flags & DIGIT != 0 {
                Category::Number
            } else if flags & CONTROL != 0 {
                Category::Control
            } else if flags & PUNCTUATION != 0 {
                Category::Punctuation
            } else if flags & SYMBOL != 0 {
                Category::Symbol
            } else {
                // only U+0020 is left
                Category::Separator
            };
        }
        match self.general_category() {
            GeneralCategory::UppercaseLetter => Category::UppercaseLetter,
            GeneralCategory::LowercaseLetter => Category::LowercaseLetter,
            GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter => Category::OtherLetter,
            GeneralCategory::DecimalNumber
            | GeneralCategory::LetterNumber
            | GeneralCategory::OtherNumber => Category::Number,
            GeneralCategory::SpaceSeparator
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator => Category::Separator,
            GeneralCategory::Control => Category::Control,
            GeneralCategory::ConnectorPunctuation
            | GeneralCategory::DashPunctuation
            | GeneralCategory::OpenPunctuation
            | GeneralCategory::ClosePunctuation
            | GeneralCategory::InitialPunctuation
            | GeneralCategory::FinalPunctuation
            | GeneralCategory::OtherPunctuation => Category::Punctuation,
            GeneralCategory::MathSymbol
            | GeneralCategory::CurrencySymbol
            | GeneralCategory::ModifierSymbol
            | GeneralCategory::OtherSymbol => Category::Symbol,
            _ => Category::Other,
        }
    }

    fn general_category(self) -> GeneralCategory {
        get_general_category(self.to_char())
    }
}

impl From<char> for Rune {
    fn from(ch: char) -> Self {
        Rune(u32::from(ch))
    }
}

impl From<Rune> for char {
    fn from(rune: Rune) -> Self {
        rune.to_char()
    }
}

impl TryFrom<u32> for Rune {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        Rune::from_u32(value)
    }
}

impl fmt::Display for Rune {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_char(), f)
    }
}

const LETTER: u8 = 1 << 0;
const UPPER: u8 = 1 << 1;
const LOWER: u8 = 1 << 2;
const DIGIT: u8 = 1 << 3;
const WHITESPACE: u8 = 1 << 4;
const CONTROL: u8 = 1 << 5;
const PUNCTUATION: u8 = 1 << 6;
const SYMBOL: u8 = 1 << 7;

static ASCII_TABLE: [u8; 128] = build_ascii_table();

const fn build_ascii_table() -> [u8; 128] {
    let mut table = [0u8; 128];
    let mut i = 0;
    while i < 128 {
        let b = i as u8;
        table[i] = match b {
            b'A'..=b'Z' => LETTER | UPPER,
            b'a'..=b'z' => LETTER | LOWER,
            b'0'..=b'9' => DIGIT,
            b'\t'..=b'\r' => CONTROL | WHITESPACE,
            b' ' => WHITESPACE,
            0x00..=0x1F | 0x7F => CONTROL,
            b'$' | b'+' | b'<' | b'=' | b'>' | b'^' | b'`' | b'|' | b'~' => SYMBOL,
            _ => PUNCTUATION,
        };
        i += 1;
    }
    table
}

#[inline]
fn ascii_flags(value: u32) -> Option<u8> {
    ASCII_TABLE.get(value as usize).copied()
}
