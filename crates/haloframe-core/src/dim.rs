//! Partition dimensionality.

use std::fmt;

/// Number of spatial dimensions of a partition.
///
/// Storage is always three-dimensional; a 2D partition keeps the z axis at
/// extent 1 with no guard layer, so per-axis arithmetic is shared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimensionality {
    /// x and y are active.
    Two,
    /// x, y and z are active.
    Three,
}

impl Dimensionality {
    /// Number of active axes.
    pub fn axes(self) -> usize {
        match self {
            Self::Two => 2,
            Self::Three => 3,
        }
    }

    /// Whether `axis` (0 = x, 1 = y, 2 = z) participates in partitioning.
    pub fn is_active(self, axis: usize) -> bool {
        axis < self.axes()
    }

    /// Number of exchange slots, `3^axes`, including the unused slot 0.
    ///
    /// The number of real neighbour directions is one less (8 in 2D, 26 in 3D).
    pub fn exchange_count(self) -> u32 {
        3u32.pow(self.axes() as u32)
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.axes())
    }
}
