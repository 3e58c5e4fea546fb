use super::{DecoderFallback, DecoderFallbackBuffer, StagedUnits, delegate_cursor};
use crate::Result;

/// Decoder fallback that widens each rejected byte to the code unit of the
/// same value, the classic recovery for stray 8-bit bytes in UTF-7.
///
/// A NUL byte cannot be staged and is dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassThroughFallback;

impl DecoderFallback for PassThroughFallback {
    fn max_unit_count(&self) -> usize {
        // one unit per byte of the longest sequence a decoder rejects at once
        4
    }

    fn create_buffer(&self) -> Box<dyn DecoderFallbackBuffer> {
        Box::new(PassThroughBuffer::default())
    }
}

#[derive(Debug, Clone, Default)]
struct PassThroughBuffer {
    staged: StagedUnits,
    scratch: Vec<u16>,
}

impl DecoderFallbackBuffer for PassThroughBuffer {
    fn fallback(&mut self, bytes: &[u8], _index: usize) -> Result<bool> {
        self.scratch.clear();
        self.scratch
            .extend(bytes.iter().filter(|&&b| b != 0).map(|&b| u16::from(b)));
        self.staged.stage(&self.scratch)
    }

    delegate_cursor!(DecoderFallbackBuffer);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widens_bytes() {
        let mut buffer = PassThroughFallback.create_buffer();
        assert!(buffer.fallback(&[0xE9, 0x80], 0).unwrap());
        assert_eq!(buffer.next_unit(), 0x00E9);
        assert_eq!(buffer.next_unit(), 0x0080);
        assert_eq!(buffer.next_unit(), 0);
    }

    #[test]
    fn test_declines_nul() {
        let mut buffer = PassThroughFallback.create_buffer();
        assert!(!buffer.fallback(&[0x00], 4).unwrap());
        assert_eq!(buffer.remaining(), 0);
    }
}
