//! Compaction of a supercell's frame list.

use std::sync::MutexGuard;

use haloframe_core::SupercellCoord;
use haloframe_heap::Frame;
use smallvec::SmallVec;

use crate::buffer::ParticlesBuffer;
use crate::metrics::KernelCounts;

/// Close every hole in the frames of `coord` and return trailing empty
/// frames to the heap.
///
/// Two cursors walk the concatenated slots: `lo` up to the next hole, `hi`
/// down to the last live particle, which is moved into the hole. Particle
/// order is not preserved. The live count and append cursor are recomputed
/// from what is left, so this also repairs counts zeroed by copy-out.
pub(crate) fn fill_supercell(buffer: &ParticlesBuffer, coord: SupercellCoord) -> KernelCounts {
    let heap = buffer.heap();
    let capacity = heap.frame_capacity() as usize;
    let mut counts = KernelCounts {
        supercells: 1,
        ..Default::default()
    };

    let mut header = buffer.supercells().lock(buffer.layout().index(coord));
    let frames = header.frames(heap);
    if frames.is_empty() {
        header.num_particles = 0;
        header.size_last_frame = 0;
        return counts;
    }

    let live = {
        let mut guards: SmallVec<[MutexGuard<'_, Frame>; 8]> =
            frames.iter().map(|&id| heap.lock(id)).collect();

        let mut lo = 0;
        let mut hi = frames.len() * capacity;
        loop {
            while lo < hi && is_valid(&guards, capacity, lo) {
                lo += 1;
            }
            while hi > lo && !is_valid(&guards, capacity, hi - 1) {
                hi -= 1;
            }
            if lo >= hi {
                break;
            }
            let src = hi - 1;
            let particle = *guards[src / capacity].get(src % capacity);
            guards[src / capacity].invalidate(src % capacity);
            guards[lo / capacity].put(lo % capacity, particle);
            lo += 1;
            hi -= 1;
        }
        lo
    };

    let keep = live.div_ceil(capacity);
    if keep < frames.len() {
        if keep > 0 {
            heap.lock(frames[keep - 1]).set_next(None);
        }
        for &id in &frames[keep..] {
            heap.free(id);
            counts.frames_freed += 1;
        }
    }

    if keep == 0 {
        header.first = None;
        header.last = None;
        header.size_last_frame = 0;
    } else {
        header.last = Some(frames[keep - 1]);
        header.size_last_frame = (live - (keep - 1) * capacity) as u32;
    }
    header.num_particles = live as u32;
    counts
}

fn is_valid(guards: &[MutexGuard<'_, Frame>], capacity: usize, slot: usize) -> bool {
    guards[slot / capacity].get(slot % capacity).valid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ParticlesBuffer;
    use haloframe_core::Particle;
    use haloframe_grid::{GridConfig, GridLayout};
    use haloframe_heap::{FrameHeap, HeapConfig};
    use std::sync::Arc;

    const C: SupercellCoord = SupercellCoord([1, 1, 0]);

    fn buffer() -> Arc<ParticlesBuffer> {
        let layout = GridLayout::new(&GridConfig::new_2d([2, 2], [2, 2])).unwrap();
        let heap = FrameHeap::new(&HeapConfig::new(8), layout.tile_volume())
            .unwrap()
            .into_shared();
        Arc::new(ParticlesBuffer::new(layout, heap, 4))
    }

    fn fill(buffer: &Arc<ParticlesBuffer>, n: u64) {
        let v = buffer.device_box();
        for i in 0..n {
            v.append(C, Particle::new(i, [0.5, 0.5, 0.0])).unwrap();
        }
    }

    fn punch(buffer: &Arc<ParticlesBuffer>, holes: &[usize]) {
        let v = buffer.device_box();
        let frames: Vec<_> = {
            let mut out = vec![];
            let mut cur = v.first_frame(C);
            while let Some(id) = cur {
                out.push(id);
                cur = v.next_frame(id);
            }
            out
        };
        for &h in holes {
            v.invalidate(C, frames[h / 4], h % 4);
        }
    }

    #[test]
    fn compacts_and_frees_trailing_frames() {
        let b = buffer();
        fill(&b, 10);
        punch(&b, &[0, 2, 5, 6, 7]);
        let counts = fill_supercell(&b, C);
        assert_eq!(counts.frames_freed, 1);
        let v = b.device_box();
        assert_eq!(v.frame_count(C), 2);
        let h = v.header(C);
        assert_eq!(h.num_particles, 5);
        assert_eq!(h.size_last_frame, 1);
        let first = v.first_frame(C).unwrap();
        assert_eq!(v.frame(first).valid_count(), 4);
        let last = h.last.unwrap();
        assert!(v.frame(last).get(0).valid);
        assert_eq!(v.next_frame(last), None);
        let mut ids: Vec<_> = v.particles(C).iter().map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3, 4, 8, 9]);
    }

    #[test]
    fn all_holes_frees_everything() {
        let b = buffer();
        fill(&b, 6);
        punch(&b, &[0, 1, 2, 3, 4, 5]);
        let counts = fill_supercell(&b, C);
        assert_eq!(counts.frames_freed, 2);
        assert!(!b.device_box().header(C).has_frames());
        assert_eq!(b.heap_stats().in_use, 0);
    }

    #[test]
    fn full_frames_keep_cursor_at_capacity() {
        let b = buffer();
        fill(&b, 8);
        fill_supercell(&b, C);
        let h = b.device_box().header(C);
        assert_eq!(h.size_last_frame, 4);
        assert_eq!(h.num_particles, 8);
    }

    #[test]
    fn repairs_zeroed_count_and_is_idempotent() {
        let b = buffer();
        fill(&b, 3);
        b.supercells().lock(b.layout().index(C)).num_particles = 0;
        fill_supercell(&b, C);
        let once = b.device_box().header(C);
        assert_eq!(once.num_particles, 3);
        let counts = fill_supercell(&b, C);
        assert_eq!(counts.frames_freed, 0);
        assert_eq!(b.device_box().header(C), once);
    }
}
