//! Heap configuration parameters.

use crate::error::HeapError;

/// Configuration for the bounded frame heap.
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapConfig {
    /// Maximum number of frames the heap can hand out.
    ///
    /// Default: 65_536. Must be at least 1 and below `u32::MAX`.
    pub max_frames: u32,
}

impl HeapConfig {
    /// Default frame budget.
    pub const DEFAULT_MAX_FRAMES: u32 = 65_536;

    /// Create a config with an explicit frame budget.
    pub fn new(max_frames: u32) -> Self {
        Self { max_frames }
    }

    /// Size the heap for `particles` live particles with `frame_capacity`
    /// slots per frame, spread over `supercells` supercells.
    ///
    /// Every supercell can hold one partially filled frame, so the budget is
    /// the dense frame count plus one frame per supercell.
    pub fn for_particles(particles: u64, frame_capacity: u32, supercells: u32) -> Self {
        let dense = particles.div_ceil(frame_capacity.max(1) as u64);
        let frames = dense.saturating_add(supercells as u64);
        Self::new(frames.min(u32::MAX as u64 - 1) as u32)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), HeapError> {
        if self.max_frames == 0 {
            return Err(HeapError::InvalidConfig {
                reason: "max_frames must be at least 1".into(),
            });
        }
        if self.max_frames == u32::MAX {
            return Err(HeapError::InvalidConfig {
                reason: "max_frames must be below u32::MAX".into(),
            });
        }
        Ok(())
    }
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_FRAMES)
    }
}
