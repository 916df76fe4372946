//! Checks for the frame-list invariants.

use haloframe_core::{FrameId, SupercellCoord};
use haloframe_grid::{AreaMask, GridLayout};
use haloframe_particles::ParticleBox;

/// Frames of a supercell, head to tail.
pub fn frame_ids(view: &ParticleBox, coord: SupercellCoord) -> Vec<FrameId> {
    let mut out = Vec::new();
    let mut cur = view.first_frame(coord);
    while let Some(id) = cur {
        out.push(id);
        cur = view.next_frame(id);
    }
    out
}

/// Valid slots of a supercell, counted by walking its frames.
pub fn count_valid(view: &ParticleBox, coord: SupercellCoord) -> u64 {
    frame_ids(view, coord)
        .into_iter()
        .map(|id| view.frame(id).valid_count() as u64)
        .sum()
}

/// Sorted ids of every valid particle in `area`.
pub fn collect_ids(view: &ParticleBox, area: AreaMask) -> Vec<u64> {
    let mut ids: Vec<u64> = view
        .layout()
        .supercells_in(area)
        .into_iter()
        .flat_map(|c| view.particles(c))
        .map(|p| p.id)
        .collect();
    ids.sort_unstable();
    ids
}

/// Assert the post-compaction shape of every supercell in `area`.
///
/// Every frame but the last is full, the last holds exactly
/// `size_last_frame` particles in its leading slots, the live count matches
/// the valid slots, an empty supercell owns no frames, and the list links
/// agree in both directions.
#[track_caller]
pub fn assert_compact(view: &ParticleBox, area: AreaMask) {
    let layout: GridLayout = *view.layout();
    let capacity = layout.tile_volume() as usize;
    for coord in layout.supercells_in(area) {
        let header = view.header(coord);
        let frames = frame_ids(view, coord);
        assert_eq!(
            header.last,
            frames.last().copied(),
            "supercell {coord}: last frame disagrees with the list"
        );
        if frames.is_empty() {
            assert_eq!(
                header.num_particles, 0,
                "supercell {coord}: count without frames"
            );
            continue;
        }
        assert_eq!(
            view.previous_frame(frames[0]),
            None,
            "supercell {coord}: head has a predecessor"
        );
        for pair in frames.windows(2) {
            assert_eq!(
                view.previous_frame(pair[1]),
                Some(pair[0]),
                "supercell {coord}: broken back link"
            );
        }
        let (tail, full) = frames.split_last().expect("non-empty");
        for &id in full {
            assert_eq!(
                view.frame(id).valid_count(),
                capacity,
                "supercell {coord}: frame {id:?} before the tail is not full"
            );
        }
        let size = header.size_last_frame as usize;
        assert!(size > 0, "supercell {coord}: empty tail frame kept");
        let last = view.frame(*tail);
        for slot in 0..capacity {
            assert_eq!(
                last.get(slot).valid,
                slot < size,
                "supercell {coord}: tail slot {slot} with size_last_frame {size}"
            );
        }
        drop(last);
        assert_eq!(
            u64::from(header.num_particles),
            count_valid(view, coord),
            "supercell {coord}: live count disagrees with valid slots"
        );
    }
}

/// Assert every valid particle in `area` lies inside its supercell.
#[track_caller]
pub fn assert_in_place(view: &ParticleBox, area: AreaMask) {
    let layout = *view.layout();
    let size = layout.supercell_size();
    for coord in layout.supercells_in(area) {
        for p in view.particles(coord) {
            for axis in 0..layout.dim().axes() {
                let x = p.position[axis];
                assert!(
                    x >= 0.0 && x < size[axis] as f32,
                    "particle {} in supercell {coord} at {x} on axis {axis}, outside [0, {})",
                    p.id,
                    size[axis]
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::base_2d;
    use haloframe_core::Particle;

    #[test]
    fn fresh_appends_are_compact() {
        let b = base_2d([2, 2], [2, 2], 16);
        let c = SupercellCoord::new(1, 1, 0);
        for i in 0..6 {
            b.device_box().append(c, Particle::new(i, [0.5, 0.5, 0.0])).unwrap();
        }
        assert_compact(&b.device_box(), AreaMask::ALL);
        assert_in_place(&b.device_box(), AreaMask::ALL);
        assert_eq!(count_valid(&b.device_box(), c), 6);
        assert_eq!(
            collect_ids(&b.device_box(), AreaMask::CORE),
            (0..6).collect::<Vec<_>>()
        );
    }

    #[test]
    #[should_panic(expected = "tail slot 0")]
    fn hole_in_tail_detected() {
        let b = base_2d([2, 2], [2, 2], 16);
        let c = SupercellCoord::new(1, 1, 0);
        let v = b.device_box();
        v.append(c, Particle::new(0, [0.5, 0.5, 0.0])).unwrap();
        v.append(c, Particle::new(1, [0.5, 0.5, 0.0])).unwrap();
        let f = v.first_frame(c).unwrap();
        v.invalidate(c, f, 0);
        assert_compact(&v, AreaMask::ALL);
    }
}
