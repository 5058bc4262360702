//! Send sequence counter (SSC) shared by both ends of a secure channel.

use std::fmt;

use crate::error::{SmartcardError, SmartcardResult};

/// 8-byte big-endian counter, incremented before every MAC computation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SequenceCounter(u64);

impl SequenceCounter {
    pub fn new(initial: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(initial))
    }

    pub fn value(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Advance the counter and return the new value.
    ///
    /// Wrapping back to zero would reuse MAC inputs, so it is refused.
    pub fn increment(&mut self) -> SmartcardResult<[u8; 8]> {
        self.0 = self.0.checked_add(1).ok_or(SmartcardError::CounterExhausted)?;
        Ok(self.value())
    }
}

impl fmt::Debug for SequenceCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceCounter({})", hex::encode(self.value()))
    }
}
