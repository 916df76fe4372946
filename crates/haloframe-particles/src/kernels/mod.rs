//! Per-supercell kernels run by the worker pool.
//!
//! Each kernel touches one supercell (plus, for shift, its direct
//! neighbours). Which supercells may run concurrently is decided by the
//! dispatcher, not here.

pub(crate) mod fill_gaps;
pub(crate) mod guard;
pub(crate) mod shift;

use haloframe_core::{ExchangeType, SupercellCoord};
use haloframe_heap::HeapError;

use crate::buffer::ParticlesBuffer;
use crate::metrics::{KernelCounts, KernelKind};

pub(crate) use guard::InsertGroup;

/// One work item: a chunk of a pass.
pub(crate) enum KernelOp {
    Shift(Vec<SupercellCoord>),
    FillGaps(Vec<SupercellCoord>),
    Delete(Vec<SupercellCoord>),
    CopyGuard(ExchangeType, Vec<SupercellCoord>),
    Insert(ExchangeType, Vec<InsertGroup>),
}

/// A kernel that runs once per supercell of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SupercellKernel {
    Shift,
    FillGaps,
    Delete,
    CopyGuard(ExchangeType),
}

impl SupercellKernel {
    pub fn kind(self) -> KernelKind {
        match self {
            Self::Shift => KernelKind::Shift,
            Self::FillGaps => KernelKind::FillGaps,
            Self::Delete => KernelKind::Delete,
            Self::CopyGuard(_) => KernelKind::CopyGuard,
        }
    }

    pub fn direction(self) -> Option<ExchangeType> {
        match self {
            Self::CopyGuard(d) => Some(d),
            _ => None,
        }
    }

    /// Work item for a chunk of supercells.
    pub fn op(self, supercells: Vec<SupercellCoord>) -> KernelOp {
        match self {
            Self::Shift => KernelOp::Shift(supercells),
            Self::FillGaps => KernelOp::FillGaps(supercells),
            Self::Delete => KernelOp::Delete(supercells),
            Self::CopyGuard(d) => KernelOp::CopyGuard(d, supercells),
        }
    }
}

impl KernelOp {
    /// Run the work item to completion or first heap failure.
    pub fn execute(self, buffer: &ParticlesBuffer) -> Result<KernelCounts, HeapError> {
        let mut counts = KernelCounts::default();
        match self {
            Self::Shift(cells) => {
                for c in cells {
                    counts.merge(&shift::shift_supercell(buffer, c)?);
                }
            }
            Self::FillGaps(cells) => {
                for c in cells {
                    counts.merge(&fill_gaps::fill_supercell(buffer, c));
                }
            }
            Self::Delete(cells) => {
                for c in cells {
                    counts.merge(&guard::delete_supercell(buffer, c));
                }
            }
            Self::CopyGuard(direction, cells) => {
                for c in cells {
                    counts.merge(&guard::copy_guard_supercell(buffer, c, direction));
                }
            }
            Self::Insert(direction, groups) => {
                counts = guard::insert_groups(buffer, direction, groups)?;
            }
        }
        Ok(counts)
    }
}
