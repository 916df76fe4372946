//! Non-owning accessor over a particle buffer.

use std::sync::{Arc, MutexGuard};

use haloframe_core::{FrameId, Particle, SupercellCoord};
use haloframe_grid::GridLayout;
use haloframe_heap::{Frame, HeapError};

use crate::buffer::ParticlesBuffer;
use crate::supercell::SupercellHeader;

/// Which memory space a view was created for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemorySpace {
    /// The view kernels run against.
    Device,
    /// Host readback view, with the caller's memory offset.
    Host {
        /// Byte offset between host and device mappings.
        offset: i64,
    },
}

/// Shared handle onto a buffer's supercells and frames.
///
/// Cheap to clone. Never moves particles between supercells; that is the
/// shift kernel's job. Each call takes and releases the locks it needs, so a
/// view must not be used on supercells a running dispatch is processing.
#[derive(Clone)]
pub struct ParticleBox {
    buffer: Arc<ParticlesBuffer>,
    space: MemorySpace,
}

impl ParticleBox {
    pub(crate) fn new(buffer: Arc<ParticlesBuffer>, space: MemorySpace) -> Self {
        Self { buffer, space }
    }

    /// Memory space this view addresses.
    pub fn memory_space(&self) -> MemorySpace {
        self.space
    }

    /// Grid geometry.
    pub fn layout(&self) -> &GridLayout {
        self.buffer.layout()
    }

    /// Dense index of a supercell.
    pub fn supercell_index(&self, coord: SupercellCoord) -> usize {
        self.buffer.layout().index(coord)
    }

    /// Snapshot of a supercell's header.
    pub fn header(&self, coord: SupercellCoord) -> SupercellHeader {
        self.buffer.header(self.supercell_index(coord))
    }

    /// Head of a supercell's frame list.
    pub fn first_frame(&self, coord: SupercellCoord) -> Option<FrameId> {
        self.header(coord).first
    }

    /// Tail of a supercell's frame list.
    pub fn last_frame(&self, coord: SupercellCoord) -> Option<FrameId> {
        self.header(coord).last
    }

    /// Successor of `frame` in its list.
    pub fn next_frame(&self, frame: FrameId) -> Option<FrameId> {
        self.buffer.heap().lock(frame).next()
    }

    /// Predecessor of `frame` in its list.
    pub fn previous_frame(&self, frame: FrameId) -> Option<FrameId> {
        self.buffer.heap().lock(frame).prev()
    }

    /// Locked access to a frame's slots.
    pub fn frame(&self, frame: FrameId) -> MutexGuard<'_, Frame> {
        self.buffer.heap().lock(frame)
    }

    /// Live count of a supercell.
    pub fn particle_count(&self, coord: SupercellCoord) -> u32 {
        self.header(coord).num_particles
    }

    /// Copies of a supercell's valid particles, in list order.
    pub fn particles(&self, coord: SupercellCoord) -> Vec<Particle> {
        let heap = self.buffer.heap();
        let header = self.buffer.supercells().lock(self.supercell_index(coord));
        let mut out = Vec::with_capacity(header.num_particles as usize);
        for id in header.frames(heap) {
            out.extend(heap.lock(id).slots().iter().filter(|p| p.valid).copied());
        }
        out
    }

    /// Number of frames in a supercell's list.
    pub fn frame_count(&self, coord: SupercellCoord) -> usize {
        let header = self.buffer.supercells().lock(self.supercell_index(coord));
        header.frames(self.buffer.heap()).len()
    }

    /// Append a particle, taking a new frame from the heap when the tail is
    /// full.
    pub fn append(&self, coord: SupercellCoord, particle: Particle) -> Result<(), HeapError> {
        let mut header = self.buffer.supercells().lock(self.supercell_index(coord));
        header.append(self.buffer.heap(), particle).map(|_| ())
    }

    /// Turn a slot into a hole and decrement the live count. Returns whether
    /// the slot held a live particle.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is outside the frame.
    pub fn invalidate(&self, coord: SupercellCoord, frame: FrameId, slot: usize) -> bool {
        let mut header = self.buffer.supercells().lock(self.supercell_index(coord));
        let mut f = self.buffer.heap().lock(frame);
        if !f.get(slot).valid {
            return false;
        }
        f.invalidate(slot);
        header.num_particles = header.num_particles.saturating_sub(1);
        true
    }

    /// Run `f` on every valid particle of a supercell. The validity bit is
    /// preserved; use [`invalidate`](Self::invalidate) to remove particles.
    pub fn for_each_particle_mut(&self, coord: SupercellCoord, mut f: impl FnMut(&mut Particle)) {
        let heap = self.buffer.heap();
        let header = self.buffer.supercells().lock(self.supercell_index(coord));
        for id in header.frames(heap) {
            let mut frame = heap.lock(id);
            for p in frame.slots_mut().iter_mut().filter(|p| p.valid) {
                f(p);
                p.valid = true;
            }
        }
    }
}
