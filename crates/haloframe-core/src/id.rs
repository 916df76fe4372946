//! Strongly-typed identifiers.

use std::fmt;

/// Identifies a frame slot in the bounded frame heap.
///
/// Frame ids are dense indices in `0..capacity` and are recycled through the
/// heap's free list, so an id is only meaningful while the frame is owned by
/// a supercell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u32);

impl FrameId {
    /// The id as a slice index.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FrameId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Grid coordinate of a supercell, in supercells, guards included.
///
/// Always three components; the z component is 0 for 2D partitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SupercellCoord(pub [u32; 3]);

impl SupercellCoord {
    /// Construct from per-axis components.
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self([x, y, z])
    }

    /// Component along `axis`.
    pub fn get(self, axis: usize) -> u32 {
        self.0[axis]
    }

    /// Apply a signed per-axis offset. Returns `None` if any component would
    /// become negative.
    pub fn offset(self, delta: [i32; 3]) -> Option<Self> {
        let mut out = [0u32; 3];
        for axis in 0..3 {
            out[axis] = self.0[axis].checked_add_signed(delta[axis])?;
        }
        Some(Self(out))
    }
}

impl fmt::Display for SupercellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0[0], self.0[1], self.0[2])
    }
}

impl From<[u32; 3]> for SupercellCoord {
    fn from(v: [u32; 3]) -> Self {
        Self(v)
    }
}
