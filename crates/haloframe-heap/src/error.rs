//! Heap-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during heap operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeapError {
    /// Every frame is in use; no frame can be allocated.
    Exhausted {
        /// Total number of frames in the heap.
        capacity: u32,
    },
    /// The heap configuration failed validation.
    InvalidConfig {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted { capacity } => {
                write!(f, "frame heap exhausted: all {capacity} frames in use")
            }
            Self::InvalidConfig { reason } => write!(f, "invalid heap config: {reason}"),
        }
    }
}

impl Error for HeapError {}
