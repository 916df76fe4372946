//! The bounded frame heap.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use haloframe_core::FrameId;

use crate::config::HeapConfig;
use crate::error::HeapError;
use crate::frame::Frame;
use crate::free_list::FreeList;

/// A heap shared between a particle buffer and its workers.
pub type SharedFrameHeap = Arc<FrameHeap>;

/// Point-in-time heap counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Total frames in the heap.
    pub capacity: u32,
    /// Frames currently owned by supercells.
    pub in_use: u32,
    /// Highest `in_use` observed since construction.
    pub peak: u32,
    /// Cumulative successful allocations.
    pub allocations: u64,
    /// Cumulative frees.
    pub frees: u64,
}

/// Fixed-size pool of particle frames.
///
/// `allocate` and `free` are safe to call from any number of threads at
/// once; the free list is lock-free. Access to a frame's contents goes
/// through [`lock`](Self::lock). A frame is owned by exactly one supercell
/// list, so under the dispatch contract those locks are uncontended.
pub struct FrameHeap {
    frames: Box<[Mutex<Frame>]>,
    allocated: Box<[AtomicBool]>,
    free: FreeList,
    frame_capacity: u32,
    in_use: AtomicU32,
    peak: AtomicU32,
    allocations: AtomicU64,
    frees: AtomicU64,
}

// Compile-time assertion: FrameHeap must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<FrameHeap>();
};

impl FrameHeap {
    /// Build a heap of `config.max_frames` frames with `frame_capacity`
    /// particle slots each.
    ///
    /// Slot storage is materialised lazily, on the first allocation of each
    /// frame, so a generous budget costs only the frame headers up front.
    pub fn new(config: &HeapConfig, frame_capacity: u32) -> Result<Self, HeapError> {
        config.validate()?;
        if frame_capacity == 0 {
            return Err(HeapError::InvalidConfig {
                reason: "frame capacity must be at least 1".into(),
            });
        }
        let n = config.max_frames;
        let frames = (0..n).map(|_| Mutex::new(Frame::unmaterialised())).collect();
        let allocated = (0..n).map(|_| AtomicBool::new(false)).collect();
        log::debug!("frame heap: {n} frames x {frame_capacity} slots");
        Ok(Self {
            frames,
            allocated,
            free: FreeList::full(n),
            frame_capacity,
            in_use: AtomicU32::new(0),
            peak: AtomicU32::new(0),
            allocations: AtomicU64::new(0),
            frees: AtomicU64::new(0),
        })
    }

    /// Wrap in an `Arc` for sharing.
    pub fn into_shared(self) -> SharedFrameHeap {
        Arc::new(self)
    }

    /// Take an empty frame from the pool.
    ///
    /// The returned frame has every slot invalid and no links.
    pub fn allocate(&self) -> Result<FrameId, HeapError> {
        let Some(index) = self.free.pop() else {
            return Err(HeapError::Exhausted {
                capacity: self.capacity(),
            });
        };
        let was_allocated = self.allocated[index as usize].swap(true, Ordering::AcqRel);
        assert!(!was_allocated, "frame {index} handed out while still allocated");

        let id = FrameId(index);
        self.lock(id).materialise(self.frame_capacity as usize);

        let now = self.in_use.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        self.allocations.fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    /// Return an empty frame to the pool.
    ///
    /// # Panics
    ///
    /// Panics if the frame is not currently allocated or still holds a
    /// valid particle.
    pub fn free(&self, id: FrameId) {
        {
            let mut frame = self.lock(id);
            assert!(
                frame.is_empty(),
                "frame {id} freed while holding {} valid particles",
                frame.valid_count()
            );
            frame.unlink();
        }
        let was_allocated = self.allocated[id.index()].swap(false, Ordering::AcqRel);
        assert!(was_allocated, "double free of frame {id}");
        self.in_use.fetch_sub(1, Ordering::AcqRel);
        self.frees.fetch_add(1, Ordering::Relaxed);
        self.free.push(id.0);
    }

    /// Exclusive access to a frame's slots and links.
    ///
    /// A poisoned lock is recovered as-is.
    ///
    /// # Panics
    ///
    /// Panics if `id` is outside the heap.
    pub fn lock(&self, id: FrameId) -> MutexGuard<'_, Frame> {
        self.frames[id.index()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether `id` is currently handed out.
    pub fn is_allocated(&self, id: FrameId) -> bool {
        self.allocated
            .get(id.index())
            .is_some_and(|a| a.load(Ordering::Acquire))
    }

    /// Total number of frames.
    pub fn capacity(&self) -> u32 {
        self.frames.len() as u32
    }

    /// Slots per frame.
    pub fn frame_capacity(&self) -> u32 {
        self.frame_capacity
    }

    /// Frames currently handed out.
    pub fn in_use(&self) -> u32 {
        self.in_use.load(Ordering::Acquire)
    }

    /// Frames still available.
    pub fn available(&self) -> u32 {
        self.capacity() - self.in_use()
    }

    /// Snapshot of the heap counters.
    pub fn stats(&self) -> HeapStats {
        HeapStats {
            capacity: self.capacity(),
            in_use: self.in_use(),
            peak: self.peak.load(Ordering::Acquire),
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
        }
    }

    /// Bytes of particle storage materialised if every frame were in use.
    pub fn reserved_bytes(&self) -> usize {
        self.frames.len()
            * self.frame_capacity as usize
            * std::mem::size_of::<haloframe_core::Particle>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haloframe_core::Particle;

    fn heap(frames: u32, capacity: u32) -> FrameHeap {
        FrameHeap::new(&HeapConfig::new(frames), capacity).unwrap()
    }

    #[test]
    fn allocate_returns_empty_unlinked_frame() {
        let h = heap(4, 8);
        let id = h.allocate().unwrap();
        let f = h.lock(id);
        assert_eq!(f.capacity(), 8);
        assert!(f.is_empty());
        assert_eq!(f.next(), None);
        assert_eq!(f.prev(), None);
    }

    #[test]
    fn exhaustion_is_an_error() {
        let h = heap(2, 4);
        h.allocate().unwrap();
        h.allocate().unwrap();
        assert_eq!(h.allocate(), Err(HeapError::Exhausted { capacity: 2 }));
    }

    #[test]
    fn free_makes_frame_reusable() {
        let h = heap(1, 4);
        let id = h.allocate().unwrap();
        h.free(id);
        assert_eq!(h.allocate().unwrap(), id);
    }

    #[test]
    fn reused_frame_has_no_stale_links() {
        let h = heap(2, 4);
        let a = h.allocate().unwrap();
        let b = h.allocate().unwrap();
        h.lock(a).set_next(Some(b));
        h.lock(b).set_prev(Some(a));
        h.free(b);
        h.free(a);
        let again = h.allocate().unwrap();
        assert_eq!(h.lock(again).next(), None);
        assert_eq!(h.lock(again).prev(), None);
    }

    #[test]
    fn stats_track_peak() {
        let h = heap(4, 4);
        let a = h.allocate().unwrap();
        let b = h.allocate().unwrap();
        h.free(a);
        h.free(b);
        let s = h.stats();
        assert_eq!(s.in_use, 0);
        assert_eq!(s.peak, 2);
        assert_eq!(s.allocations, 2);
        assert_eq!(s.frees, 2);
    }

    #[test]
    #[should_panic(expected = "valid particles")]
    fn freeing_non_empty_frame_panics() {
        let h = heap(1, 4);
        let id = h.allocate().unwrap();
        h.lock(id).put(0, Particle::new(1, [0.0; 3]));
        h.free(id);
    }

    #[test]
    #[should_panic(expected = "double free")]
    fn double_free_panics() {
        let h = heap(2, 4);
        let id = h.allocate().unwrap();
        h.free(id);
        h.free(id);
    }

    #[test]
    fn zero_capacity_frames_rejected() {
        assert!(matches!(
            FrameHeap::new(&HeapConfig::new(4), 0),
            Err(HeapError::InvalidConfig { .. })
        ));
    }
}
