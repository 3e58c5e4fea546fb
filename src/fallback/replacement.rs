use std::sync::Arc;

use super::{
    DecoderFallback, DecoderFallbackBuffer, EncoderFallback, EncoderFallbackBuffer, StagedUnits,
    delegate_cursor,
};
use crate::unicode::{is_high_surrogate, is_low_surrogate};
use crate::{Error, Result};

/// Substitutes a fixed string for every offending input
///
/// The same policy works in both directions: the encoder re-encodes the
/// string with the target encoding, the decoder emits it as UTF-16.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementFallback {
    units: Arc<[u16]>,
}

impl ReplacementFallback {
    /// Replacement from a `&str`; fails if it contains U+0000
    pub fn new(replacement: &str) -> Result<Self> {
        let units: Vec<u16> = replacement.encode_utf16().collect();
        Self::from_utf16(&units)
    }

    /// Replacement from raw UTF-16; rejects unpaired surrogates and U+0000
    pub fn from_utf16(units: &[u16]) -> Result<Self> {
        let mut i = 0;
        while i < units.len() {
            let unit = u32::from(units[i]);
            if unit == 0 || is_low_surrogate(unit) {
                return Err(Error::InvalidReplacement { index: i });
            }
            if is_high_surrogate(unit) {
                match units.get(i + 1) {
                    Some(&low) if is_low_surrogate(u32::from(low)) => i += 1,
                    _ => return Err(Error::InvalidReplacement { index: i }),
                }
            }
            i += 1;
        }
        Ok(Self {
            units: Arc::from(units),
        })
    }

    /// `"?"`, the single-byte encodings' default
    pub fn question_mark() -> Self {
        Self {
            units: Arc::from([u16::from(b'?')].as_slice()),
        }
    }

    /// U+FFFD, the Unicode encodings' default
    pub fn replacement_character() -> Self {
        Self {
            units: Arc::from([0xFFFD_u16].as_slice()),
        }
    }

    /// The replacement as UTF-16
    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// The replacement as a `String`
    pub fn to_string_lossy(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }
}

impl Default for ReplacementFallback {
    fn default() -> Self {
        Self::question_mark()
    }
}

impl EncoderFallback for ReplacementFallback {
    fn max_unit_count(&self) -> usize {
        self.units.len()
    }

    fn create_buffer(&self) -> Box<dyn EncoderFallbackBuffer> {
        Box::new(ReplacementBuffer::new(self.units.clone()))
    }
}

impl DecoderFallback for ReplacementFallback {
    fn max_unit_count(&self) -> usize {
        self.units.len()
    }

    fn create_buffer(&self) -> Box<dyn DecoderFallbackBuffer> {
        Box::new(ReplacementBuffer::new(self.units.clone()))
    }
}

#[derive(Debug, Clone)]
struct ReplacementBuffer {
    replacement: Arc<[u16]>,
    staged: StagedUnits,
}

impl ReplacementBuffer {
    fn new(replacement: Arc<[u16]>) -> Self {
        Self {
            replacement,
            staged: StagedUnits::default(),
        }
    }
}

impl EncoderFallbackBuffer for ReplacementBuffer {
    fn fallback(&mut self, _unit: u16, _index: usize) -> Result<bool> {
        self.staged.stage(&self.replacement)
    }

    fn fallback_pair(&mut self, _high: u16, _low: u16, _index: usize) -> Result<bool> {
        self.staged.stage(&self.replacement)
    }

    delegate_cursor!(EncoderFallbackBuffer);
}

impl DecoderFallbackBuffer for ReplacementBuffer {
    fn fallback(&mut self, _bytes: &[u8], _index: usize) -> Result<bool> {
        self.staged.stage(&self.replacement)
    }

    delegate_cursor!(DecoderFallbackBuffer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unpaired_surrogates_and_nul() {
        assert_eq!(
            ReplacementFallback::from_utf16(&[0x41, 0xD800]),
            Err(Error::InvalidReplacement { index: 1 })
        );
        assert_eq!(
            ReplacementFallback::from_utf16(&[0xDC00, 0x41]),
            Err(Error::InvalidReplacement { index: 0 })
        );
        assert_eq!(
            ReplacementFallback::from_utf16(&[0xD800, 0x41]),
            Err(Error::InvalidReplacement { index: 0 })
        );
        assert_eq!(
            ReplacementFallback::new("a\0"),
            Err(Error::InvalidReplacement { index: 1 })
        );

        let pair = ReplacementFallback::new("<😀>").unwrap();
        assert_eq!(pair.units(), &[0x3C, 0xD83D, 0xDE00, 0x3E]);
        assert_eq!(EncoderFallback::max_unit_count(&pair), 4);
    }

    #[test]
    fn test_encoder_buffer_stages_each_time() {
        let policy = ReplacementFallback::new("[?]").unwrap();
        let mut buffer = EncoderFallback::create_buffer(&policy);

        assert!(buffer.fallback(0xE9, 0).unwrap());
        assert_eq!(buffer.remaining(), 3);
        let drained: Vec<u16> = (0..3).map(|_| buffer.next_unit()).collect();
        assert_eq!(String::from_utf16(&drained).unwrap(), "[?]");
        assert_eq!(buffer.next_unit(), 0);

        assert!(buffer.fallback_pair(0xD83D, 0xDE00, 5).unwrap());
        assert_eq!(buffer.remaining(), 3);
    }

    #[test]
    fn test_buffer_refuses_recursive_staging() {
        let policy = ReplacementFallback::replacement_character();
        let mut buffer = DecoderFallback::create_buffer(&policy);
        assert!(buffer.fallback(&[0xFF], 0).unwrap());
        assert_eq!(
            buffer.fallback(&[0xFE], 1),
            Err(Error::IllegalFallbackState(crate::FallbackFault::Recursive))
        );
    }

    #[test]
    fn test_empty_replacement_declines() {
        let policy = ReplacementFallback::new("").unwrap();
        let mut buffer = DecoderFallback::create_buffer(&policy);
        assert!(!buffer.fallback(&[0x80], 0).unwrap());
        assert_eq!(buffer.remaining(), 0);
        assert_eq!(DecoderFallback::max_unit_count(&policy), 0);
    }

    #[test]
    fn test_clone_keeps_cursor() {
        let policy = ReplacementFallback::new("ab").unwrap();
        let mut buffer = DecoderFallback::create_buffer(&policy);
        buffer.fallback(&[0x80], 0).unwrap();
        buffer.next_unit();

        let mut copy = buffer.clone();
        assert_eq!(copy.next_unit(), u16::from(b'b'));
        assert_eq!(buffer.remaining(), 1);
        buffer.reset();
        assert_eq!(buffer.remaining(), 0);
        assert_eq!(copy.remaining(), 0);
    }
}
