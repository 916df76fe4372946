//! Grid configuration.

use haloframe_core::Dimensionality;

use crate::error::GridError;

/// Startup description of a partition's supercell grid.
///
/// All quantities are per axis (x, y, z). For a 2D grid the z entries of
/// `supercell_size` and `local_supercells` must be 1; the guard width only
/// applies to active axes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridConfig {
    /// Number of active axes.
    pub dim: Dimensionality,
    /// Cells per supercell along each axis. The tile volume (product) is the
    /// frame capacity.
    pub supercell_size: [u32; 3],
    /// Supercells owned by this partition (CORE + BORDER) along each axis.
    pub local_supercells: [u32; 3],
    /// Guard width in supercells on each side of every active axis. The
    /// border layer has the same width.
    pub guard_supercells: u32,
}

impl GridConfig {
    /// Default guard width.
    pub const DEFAULT_GUARD: u32 = 1;

    /// A 2D grid with the default guard width.
    pub fn new_2d(supercell_size: [u32; 2], local_supercells: [u32; 2]) -> Self {
        Self {
            dim: Dimensionality::Two,
            supercell_size: [supercell_size[0], supercell_size[1], 1],
            local_supercells: [local_supercells[0], local_supercells[1], 1],
            guard_supercells: Self::DEFAULT_GUARD,
        }
    }

    /// A 3D grid with the default guard width.
    pub fn new_3d(supercell_size: [u32; 3], local_supercells: [u32; 3]) -> Self {
        Self {
            dim: Dimensionality::Three,
            supercell_size,
            local_supercells,
            guard_supercells: Self::DEFAULT_GUARD,
        }
    }

    /// Builder-style guard width setter.
    pub fn with_guard(mut self, guard_supercells: u32) -> Self {
        self.guard_supercells = guard_supercells;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), GridError> {
        for axis in 0..3 {
            if self.supercell_size[axis] == 0 {
                return Err(GridError::ZeroExtent {
                    what: "supercell size",
                    axis,
                });
            }
            if self.local_supercells[axis] == 0 {
                return Err(GridError::ZeroExtent {
                    what: "local supercells",
                    axis,
                });
            }
            if !self.dim.is_active(axis) {
                if self.supercell_size[axis] != 1 {
                    return Err(GridError::InactiveAxisNotCollapsed {
                        what: "supercell size",
                    });
                }
                if self.local_supercells[axis] != 1 {
                    return Err(GridError::InactiveAxisNotCollapsed {
                        what: "local supercells",
                    });
                }
                continue;
            }
            let required = self.guard_supercells.saturating_mul(2);
            if self.local_supercells[axis] < required {
                return Err(GridError::LocalTooSmall {
                    axis,
                    local: self.local_supercells[axis],
                    required,
                });
            }
        }
        self.supercell_size
            .iter()
            .try_fold(1u32, |acc, &s| acc.checked_mul(s))
            .ok_or(GridError::Overflow {
                what: "tile volume",
            })?;
        (0..3)
            .try_fold(1u32, |acc, axis| {
                let guard = if self.dim.is_active(axis) {
                    self.guard_supercells.checked_mul(2)?
                } else {
                    0
                };
                acc.checked_mul(self.local_supercells[axis].checked_add(guard)?)
            })
            .ok_or(GridError::Overflow {
                what: "supercell count",
            })?;
        Ok(())
    }
}
