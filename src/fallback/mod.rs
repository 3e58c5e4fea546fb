//! Substitution policies for unencodable text and undecodable bytes
//!
//! A policy ([`EncoderFallback`] / [`DecoderFallback`]) is an immutable,
//! shareable description. Each encoder or decoder asks it for a fresh
//! buffer ([`EncoderFallbackBuffer`] / [`DecoderFallbackBuffer`]) that
//! stages replacement code units for one offending input at a time and is
//! then drained unit by unit.
//!
//! A drained unit value of `0` means "empty", which is why no policy may
//! stage U+0000.

use std::fmt;

use crate::{Error, FallbackFault, Result};

mod best_fit;
mod exception;
mod pass_through;
mod replacement;

pub use best_fit::BestFitFallback;
pub use exception::ExceptionFallback;
pub use pass_through::PassThroughFallback;
pub use replacement::ReplacementFallback;

/// Policy for UTF-16 input the target encoding cannot represent
pub trait EncoderFallback: fmt::Debug + Send + Sync {
    /// Most code units a single `fallback` call can stage
    fn max_unit_count(&self) -> usize;

    /// New per-stream buffer
    fn create_buffer(&self) -> Box<dyn EncoderFallbackBuffer>;
}

/// Policy for bytes that do not form a valid sequence
pub trait DecoderFallback: fmt::Debug + Send + Sync {
    /// Most code units a single `fallback` call can stage
    fn max_unit_count(&self) -> usize;

    /// New per-stream buffer
    fn create_buffer(&self) -> Box<dyn DecoderFallbackBuffer>;
}

/// Per-stream cursor over staged replacement units for the encoder
pub trait EncoderFallbackBuffer: fmt::Debug + Send {
    /// Stage a replacement for one unencodable unit at stream position `index`.
    ///
    /// Returns `Ok(false)` when the policy declines and nothing is staged.
    fn fallback(&mut self, unit: u16, index: usize) -> Result<bool>;

    /// Stage a replacement for a valid surrogate pair the encoding cannot hold
    fn fallback_pair(&mut self, high: u16, low: u16, index: usize) -> Result<bool>;

    /// Pop the next staged unit, or `0` once drained
    fn next_unit(&mut self) -> u16;

    /// Step back over the last popped unit; `false` if nothing to undo
    fn move_previous(&mut self) -> bool;

    /// Units still to be drained
    fn remaining(&self) -> usize;

    /// Forget anything staged
    fn reset(&mut self);

    /// Independent copy including the cursor position
    fn boxed_clone(&self) -> Box<dyn EncoderFallbackBuffer>;
}

/// Per-stream cursor over staged replacement units for the decoder
pub trait DecoderFallbackBuffer: fmt::Debug + Send {
    /// Stage a replacement for the malformed `bytes` at stream position `index`.
    ///
    /// Returns `Ok(false)` when the policy declines and nothing is staged.
    fn fallback(&mut self, bytes: &[u8], index: usize) -> Result<bool>;

    /// Pop the next staged unit, or `0` once drained
    fn next_unit(&mut self) -> u16;

    /// Step back over the last popped unit; `false` if nothing to undo
    fn move_previous(&mut self) -> bool;

    /// Units still to be drained
    fn remaining(&self) -> usize;

    /// Forget anything staged
    fn reset(&mut self);

    /// Independent copy including the cursor position
    fn boxed_clone(&self) -> Box<dyn DecoderFallbackBuffer>;
}

impl Clone for Box<dyn EncoderFallbackBuffer> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

impl Clone for Box<dyn DecoderFallbackBuffer> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// Staging area shared by the concrete buffers
#[derive(Debug, Clone, Default)]
pub(crate) struct StagedUnits {
    units: Vec<u16>,
    cursor: usize,
}

impl StagedUnits {
    /// Replace the staged units; refuses while the previous ones are undrained
    pub(crate) fn stage(&mut self, units: &[u16]) -> Result<bool> {
        if self.remaining() > 0 {
            return Err(Error::IllegalFallbackState(FallbackFault::Recursive));
        }
        self.units.clear();
        self.units.extend_from_slice(units);
        self.cursor = 0;
        Ok(!units.is_empty())
    }

    pub(crate) fn next_unit(&mut self) -> u16 {
        match self.units.get(self.cursor) {
            Some(&unit) => {
                self.cursor += 1;
                unit
            }
            None => 0,
        }
    }

    pub(crate) fn move_previous(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub(crate) fn remaining(&self) -> usize {
        self.units.len() - self.cursor
    }

    pub(crate) fn reset(&mut self) {
        self.units.clear();
        self.cursor = 0;
    }
}

/// Forwards the cursor half of a buffer trait to a `staged: StagedUnits` field
macro_rules! delegate_cursor {
    ($trait_object:ident) => {
        fn next_unit(&mut self) -> u16 {
            self.staged.next_unit()
        }

        fn move_previous(&mut self) -> bool {
            self.staged.move_previous()
        }

        fn remaining(&self) -> usize {
            self.staged.remaining()
        }

        fn reset(&mut self) {
            self.staged.reset()
        }

        fn boxed_clone(&self) -> Box<dyn $trait_object> {
            Box::new(self.clone())
        }
    };
}

pub(crate) use delegate_cursor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_units_drain_and_rewind() {
        let mut staged = StagedUnits::default();
        assert_eq!(staged.next_unit(), 0);
        assert!(!staged.move_previous());

        assert!(staged.stage(&[0x61, 0x62]).unwrap());
        assert_eq!(staged.remaining(), 2);
        assert_eq!(staged.next_unit(), 0x61);
        assert!(staged.move_previous());
        assert_eq!(staged.next_unit(), 0x61);
        assert_eq!(staged.next_unit(), 0x62);
        assert_eq!(staged.remaining(), 0);
        assert_eq!(staged.next_unit(), 0);
    }

    #[test]
    fn test_staging_over_undrained_units_is_recursive() {
        let mut staged = StagedUnits::default();
        staged.stage(&[0x3F, 0x3F]).unwrap();
        staged.next_unit();
        assert_eq!(
            staged.stage(&[0x3F]),
            Err(Error::IllegalFallbackState(FallbackFault::Recursive))
        );

        staged.reset();
        assert_eq!(staged.remaining(), 0);
        assert!(staged.stage(&[0x3F]).unwrap());
    }

    #[test]
    fn test_empty_stage_declines() {
        let mut staged = StagedUnits::default();
        assert!(!staged.stage(&[]).unwrap());
        assert_eq!(staged.remaining(), 0);
    }
}
