//! Per-dispatch counters.
//!
//! Every completed [`Event`](crate::Event) yields a [`DispatchReport`]
//! summarising what the kernel did, for telemetry and tests.

use std::fmt;

use haloframe_core::ExchangeType;

/// Which kernel a dispatch ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KernelKind {
    /// Relocation of out-of-place particles.
    Shift,
    /// Compaction of frame lists.
    FillGaps,
    /// Removal of every particle of a region.
    Delete,
    /// Guard-to-exchange copy-out.
    CopyGuard,
    /// Exchange-to-border insertion.
    Insert,
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Shift => "shift",
            Self::FillGaps => "fill_gaps",
            Self::Delete => "delete",
            Self::CopyGuard => "copy_guard",
            Self::Insert => "insert",
        })
    }
}

/// Counters produced by one work item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct KernelCounts {
    pub supercells: u64,
    pub moved: u64,
    pub copied: u64,
    pub remaining: u64,
    pub inserted: u64,
    pub removed: u64,
    pub frames_freed: u64,
}

impl KernelCounts {
    pub fn merge(&mut self, other: &KernelCounts) {
        self.supercells += other.supercells;
        self.moved += other.moved;
        self.copied += other.copied;
        self.remaining += other.remaining;
        self.inserted += other.inserted;
        self.removed += other.removed;
        self.frames_freed += other.frames_freed;
    }
}

/// Summary of one completed dispatch.
///
/// Counters that do not apply to the kernel stay zero.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    /// Kernel that ran.
    pub kernel: KernelKind,
    /// Exchange direction, for the guard kernels.
    pub direction: Option<ExchangeType>,
    /// Non-empty passes executed.
    pub passes: u32,
    /// Supercells processed.
    pub supercells: u64,
    /// Particles relocated to a neighbour supercell (shift).
    pub particles_moved: u64,
    /// Particles staged into the exchange buffer (copy-out).
    pub particles_copied: u64,
    /// Particles left in place because the exchange buffer was full.
    pub particles_remaining: u64,
    /// Particles appended from the exchange buffer (insert).
    pub particles_inserted: u64,
    /// Particles discarded (delete).
    pub particles_removed: u64,
    /// Frames returned to the heap.
    pub frames_freed: u64,
    /// Wall-clock time from first pass start to last pass end, in microseconds.
    pub elapsed_us: u64,
}

impl DispatchReport {
    /// An empty report for `kernel`.
    pub fn new(kernel: KernelKind, direction: Option<ExchangeType>) -> Self {
        Self {
            kernel,
            direction,
            passes: 0,
            supercells: 0,
            particles_moved: 0,
            particles_copied: 0,
            particles_remaining: 0,
            particles_inserted: 0,
            particles_removed: 0,
            frames_freed: 0,
            elapsed_us: 0,
        }
    }

    pub(crate) fn absorb(&mut self, counts: &KernelCounts) {
        self.supercells += counts.supercells;
        self.particles_moved += counts.moved;
        self.particles_copied += counts.copied;
        self.particles_remaining += counts.remaining;
        self.particles_inserted += counts.inserted;
        self.particles_removed += counts.removed;
        self.frames_freed += counts.frames_freed;
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kernel)?;
        if let Some(d) = self.direction {
            write!(f, "[{d}]")?;
        }
        write!(
            f,
            ": {} passes, {} supercells, moved {}, copied {} (+{} left), inserted {}, removed {}, freed {} frames in {}us",
            self.passes,
            self.supercells,
            self.particles_moved,
            self.particles_copied,
            self.particles_remaining,
            self.particles_inserted,
            self.particles_removed,
            self.frames_freed,
            self.elapsed_us
        )
    }
}
