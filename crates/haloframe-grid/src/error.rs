//! Error types for grid construction.

use std::fmt;

/// Errors arising from grid configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// An axis has zero extent (cells per supercell or supercells).
    ZeroExtent {
        /// Which quantity was zero.
        what: &'static str,
        /// Axis index (0 = x).
        axis: usize,
    },
    /// An inactive axis of a 2D grid is not collapsed to extent 1.
    InactiveAxisNotCollapsed {
        /// Which quantity was not 1.
        what: &'static str,
    },
    /// The local grid is too small to hold a border layer on both sides.
    LocalTooSmall {
        /// Axis index (0 = x).
        axis: usize,
        /// Configured local supercells on that axis.
        local: u32,
        /// Minimum required (`2 * guard`).
        required: u32,
    },
    /// Total supercell count or tile volume does not fit in `u32`.
    Overflow {
        /// Which quantity overflowed.
        what: &'static str,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroExtent { what, axis } => write!(f, "{what} is zero on axis {axis}"),
            Self::InactiveAxisNotCollapsed { what } => {
                write!(f, "{what} must be 1 on the z axis of a 2D grid")
            }
            Self::LocalTooSmall {
                axis,
                local,
                required,
            } => write!(
                f,
                "axis {axis} has {local} local supercells, need at least {required} for two border layers"
            ),
            Self::Overflow { what } => write!(f, "{what} exceeds u32::MAX"),
        }
    }
}

impl std::error::Error for GridError {}
