//! Supercell headers and frame-list maintenance.

use std::sync::{Mutex, MutexGuard};

use haloframe_core::{FrameId, Particle};
use haloframe_heap::{FrameHeap, HeapError};
use smallvec::SmallVec;

/// Frame ids of one supercell in list order.
pub(crate) type FrameList = SmallVec<[FrameId; 8]>;

/// Bookkeeping of one supercell's frame list.
///
/// `first`/`last` are both `None` or both `Some`. Slots of the last frame at
/// or beyond `size_last_frame` are always holes, so appends never overwrite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SupercellHeader {
    /// Head of the frame list.
    pub first: Option<FrameId>,
    /// Tail of the frame list.
    pub last: Option<FrameId>,
    /// Append cursor in the last frame.
    pub size_last_frame: u32,
    /// Live particle count. Exact after a gap fill; zeroed by copy-out.
    pub num_particles: u32,
}

impl SupercellHeader {
    /// Whether the supercell owns at least one frame.
    pub fn has_frames(&self) -> bool {
        self.first.is_some()
    }

    /// Append a particle, allocating a new tail frame if the last one is full.
    /// Returns where the particle landed.
    pub(crate) fn append(
        &mut self,
        heap: &FrameHeap,
        particle: Particle,
    ) -> Result<(FrameId, usize), HeapError> {
        let capacity = heap.frame_capacity();
        let target = match self.last {
            Some(last) if self.size_last_frame < capacity => last,
            _ => {
                let id = heap.allocate()?;
                match self.last {
                    Some(last) => {
                        heap.lock(last).set_next(Some(id));
                        heap.lock(id).set_prev(Some(last));
                    }
                    None => self.first = Some(id),
                }
                self.last = Some(id);
                self.size_last_frame = 0;
                id
            }
        };
        let slot = self.size_last_frame as usize;
        heap.lock(target).put(slot, particle);
        self.size_last_frame += 1;
        self.num_particles += 1;
        Ok((target, slot))
    }

    /// Frame ids from head to tail.
    pub(crate) fn frames(&self, heap: &FrameHeap) -> FrameList {
        let mut out = FrameList::new();
        let mut cursor = self.first;
        while let Some(id) = cursor {
            out.push(id);
            cursor = heap.lock(id).next();
        }
        out
    }

    /// Discard every particle, return every frame, and empty the header.
    /// Returns `(particles removed, frames freed)`.
    pub(crate) fn release(&mut self, heap: &FrameHeap) -> (u64, u64) {
        let frames = self.frames(heap);
        let mut removed = 0u64;
        for &id in &frames {
            let mut frame = heap.lock(id);
            removed += frame.valid_count() as u64;
            frame.clear();
        }
        for &id in &frames {
            heap.free(id);
        }
        *self = Self::default();
        (removed, frames.len() as u64)
    }
}

/// One header per supercell of the grid, guard included.
pub(crate) struct SupercellTable {
    headers: Box<[Mutex<SupercellHeader>]>,
}

impl SupercellTable {
    pub fn new(count: usize) -> Self {
        Self {
            headers: (0..count)
                .map(|_| Mutex::new(SupercellHeader::default()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Exclusive access to a header. Poison is recovered like the heap's
    /// frame locks.
    pub fn lock(&self, index: usize) -> MutexGuard<'_, SupercellHeader> {
        self.headers[index]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
