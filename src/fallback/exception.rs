use super::{DecoderFallback, DecoderFallbackBuffer, EncoderFallback, EncoderFallbackBuffer};
use crate::{Error, InvalidSequence, Result};

/// Fails the conversion on the first offending input
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExceptionFallback;

impl EncoderFallback for ExceptionFallback {
    fn max_unit_count(&self) -> usize {
        0
    }

    fn create_buffer(&self) -> Box<dyn EncoderFallbackBuffer> {
        Box::new(ExceptionBuffer)
    }
}

impl DecoderFallback for ExceptionFallback {
    fn max_unit_count(&self) -> usize {
        0
    }

    fn create_buffer(&self) -> Box<dyn DecoderFallbackBuffer> {
        Box::new(ExceptionBuffer)
    }
}

#[derive(Debug, Clone, Copy)]
struct ExceptionBuffer;

impl EncoderFallbackBuffer for ExceptionBuffer {
    fn fallback(&mut self, unit: u16, index: usize) -> Result<bool> {
        Err(Error::InvalidCharacterSequence {
            sequence: InvalidSequence::Units(vec![unit]),
            index,
        })
    }

    fn fallback_pair(&mut self, high: u16, low: u16, index: usize) -> Result<bool> {
        Err(Error::InvalidCharacterSequence {
            sequence: InvalidSequence::Units(vec![high, low]),
            index,
        })
    }

    fn next_unit(&mut self) -> u16 {
        0
    }

    fn move_previous(&mut self) -> bool {
        false
    }

    fn remaining(&self) -> usize {
        0
    }

    fn reset(&mut self) {}

    fn boxed_clone(&self) -> Box<dyn EncoderFallbackBuffer> {
        Box::new(*self)
    }
}

impl DecoderFallbackBuffer for ExceptionBuffer {
    fn fallback(&mut self, bytes: &[u8], index: usize) -> Result<bool> {
        Err(Error::InvalidCharacterSequence {
            sequence: InvalidSequence::Bytes(bytes.to_vec()),
            index,
        })
    }

    fn next_unit(&mut self) -> u16 {
        0
    }

    fn move_previous(&mut self) -> bool {
        false
    }

    fn remaining(&self) -> usize {
        0
    }

    fn reset(&mut self) {}

    fn boxed_clone(&self) -> Box<dyn DecoderFallbackBuffer> {
        Box::new(*self)
    }
}
