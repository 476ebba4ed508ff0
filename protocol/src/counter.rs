//! # Public Counters
//!
//! Ordinary, globally visible integers that live next to the note ledger:
//! a token's total supply, the router's payment sequence number. They are
//! not part of the selection algorithm, but the facades update them in the
//! same atomic operation as note issuance so that aggregate invariants
//! (live note value vs. declared supply) hold at every commit point.
//!
//! All arithmetic is checked. Wrapping arithmetic and money do not mix.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from public counter arithmetic.
#[derive(Debug, Error)]
pub enum CounterError {
    /// An addition would exceed `u128::MAX`.
    #[error("counter overflow: current {current}, tried to add {delta}")]
    Overflow {
        /// Value before the failed operation.
        current: u128,
        /// The delta that caused the overflow.
        delta: u128,
    },

    /// A subtraction would go below zero.
    #[error("counter underflow: current {current}, tried to subtract {delta}")]
    Underflow {
        /// Value before the failed operation.
        current: u128,
        /// The delta that caused the underflow.
        delta: u128,
    },
}

/// A checked, publicly visible `u128` counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicCounter(u128);

impl PublicCounter {
    /// Creates a counter starting at zero.
    pub fn new() -> Self {
        Self(0)
    }

    /// Creates a counter with an explicit initial value.
    pub fn with_value(value: u128) -> Self {
        Self(value)
    }

    /// Current value.
    pub fn get(&self) -> u128 {
        self.0
    }

    /// Adds `delta`, failing on overflow. Returns the new value.
    pub fn checked_add(&mut self, delta: u128) -> Result<u128, CounterError> {
        let next = self.0.checked_add(delta).ok_or(CounterError::Overflow {
            current: self.0,
            delta,
        })?;
        self.0 = next;
        Ok(next)
    }

    /// Subtracts `delta`, failing on underflow. Returns the new value.
    pub fn checked_sub(&mut self, delta: u128) -> Result<u128, CounterError> {
        let next = self.0.checked_sub(delta).ok_or(CounterError::Underflow {
            current: self.0,
            delta,
        })?;
        self.0 = next;
        Ok(next)
    }

    /// Increments by one. The sequence-number operation.
    pub fn increment(&mut self) -> Result<u128, CounterError> {
        self.checked_add(1)
    }
}
