//! Fixed-capacity particle frames.

use haloframe_core::{FrameId, Particle};

/// A fixed-capacity block of particle slots with list links.
///
/// A frame handed out by [`FrameHeap::allocate`](crate::FrameHeap::allocate)
/// has every slot invalid and no links. The owning supercell chains frames
/// through [`set_next`](Self::set_next) / [`set_prev`](Self::set_prev).
#[derive(Debug)]
pub struct Frame {
    /// Slot storage. Empty until the frame is first allocated, then exactly
    /// `capacity` long for the rest of the heap's lifetime.
    slots: Vec<Particle>,
    prev: Option<FrameId>,
    next: Option<FrameId>,
}

impl Frame {
    pub(crate) fn unmaterialised() -> Self {
        Self {
            slots: Vec::new(),
            prev: None,
            next: None,
        }
    }

    /// Prepare a frame coming off the free list.
    pub(crate) fn materialise(&mut self, capacity: usize) {
        if self.slots.len() != capacity {
            self.slots = vec![Particle::INVALID; capacity];
        }
        self.prev = None;
        self.next = None;
    }

    pub(crate) fn unlink(&mut self) {
        self.prev = None;
        self.next = None;
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// All slots, valid or not.
    pub fn slots(&self) -> &[Particle] {
        &self.slots
    }

    /// Mutable access to all slots.
    ///
    /// Writers must keep the owning supercell's live count consistent.
    pub fn slots_mut(&mut self) -> &mut [Particle] {
        &mut self.slots
    }

    /// The particle in `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= capacity`.
    pub fn get(&self, slot: usize) -> &Particle {
        &self.slots[slot]
    }

    /// Write a live particle into `slot`, forcing its validity bit.
    ///
    /// # Panics
    ///
    /// Panics if `slot >= capacity`.
    pub fn put(&mut self, slot: usize, particle: Particle) {
        self.slots[slot] = Particle {
            valid: true,
            ..particle
        };
    }

    /// Turn `slot` into a hole.
    pub fn invalidate(&mut self, slot: usize) {
        self.slots[slot].valid = false;
    }

    /// Turn every slot into a hole.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.valid = false;
        }
    }

    /// Number of valid slots.
    pub fn valid_count(&self) -> usize {
        self.slots.iter().filter(|p| p.valid).count()
    }

    /// True if no slot holds a live particle.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|p| !p.valid)
    }

    /// Previous frame in the owning supercell's list.
    pub fn prev(&self) -> Option<FrameId> {
        self.prev
    }

    /// Next frame in the owning supercell's list.
    pub fn next(&self) -> Option<FrameId> {
        self.next
    }

    /// Set the previous-frame link.
    pub fn set_prev(&mut self, prev: Option<FrameId>) {
        self.prev = prev;
    }

    /// Set the next-frame link.
    pub fn set_next(&mut self, next: Option<FrameId>) {
        self.next = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialised_frame_is_empty() {
        let mut f = Frame::unmaterialised();
        assert_eq!(f.capacity(), 0);
        f.materialise(8);
        assert_eq!(f.capacity(), 8);
        assert!(f.is_empty());
    }

    #[test]
    fn put_forces_validity() {
        let mut f = Frame::unmaterialised();
        f.materialise(4);
        f.put(2, Particle::INVALID);
        assert_eq!(f.valid_count(), 1);
        assert!(f.get(2).valid);
        f.invalidate(2);
        assert!(f.is_empty());
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut f = Frame::unmaterialised();
        f.materialise(4);
        for slot in 0..4 {
            f.put(slot, Particle::new(slot as u64, [0.0; 3]));
        }
        f.clear();
        assert_eq!(f.valid_count(), 0);
    }
}
