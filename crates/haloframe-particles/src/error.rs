//! Runtime errors surfaced through [`Event::wait`](crate::Event::wait).

use std::error::Error;
use std::fmt;

use haloframe_heap::HeapError;

/// Errors a dispatched kernel can complete with.
///
/// Precondition violations (stride below 3, multi-hop migration, dispatch
/// while an event is outstanding, ...) are not errors: they panic, and the
/// panic is re-raised on the thread that waits on the event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParticleError {
    /// A frame could not be allocated. Particles not yet moved stay where
    /// they were (source slot or exchange stage); the buffer is poisoned.
    Heap(HeapError),
    /// An earlier dispatch ran out of frames. Call `reset` before dispatching
    /// again.
    Poisoned,
    /// The dispatch coordinator thread could not be started.
    DispatchFailed {
        /// OS error text.
        reason: String,
    },
    /// The worker pool shut down while a pass was in flight.
    WorkerLost,
}

impl fmt::Display for ParticleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heap(e) => write!(f, "heap: {e}"),
            Self::Poisoned => write!(f, "particle buffer poisoned by an earlier heap exhaustion"),
            Self::DispatchFailed { reason } => write!(f, "dispatch failed: {reason}"),
            Self::WorkerLost => write!(f, "worker pool shut down during a pass"),
        }
    }
}

impl Error for ParticleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Heap(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HeapError> for ParticleError {
    fn from(e: HeapError) -> Self {
        Self::Heap(e)
    }
}
