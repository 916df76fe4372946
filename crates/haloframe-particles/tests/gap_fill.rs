//! Integration tests: compaction of frame lists after holes are punched.

use haloframe_grid::AreaMask;
use haloframe_particles::ParticlesBase;
use haloframe_test_utils::invariants::frame_ids;
use haloframe_test_utils::{assert_compact, base_2d, base_3d, collect_ids, ParticleGenerator};

/// Invalidate roughly one slot in `one_in` across `area`. Returns the ids
/// that survive, sorted.
fn punch_holes(
    base: &ParticlesBase,
    gen: &mut ParticleGenerator,
    area: AreaMask,
    one_in: u32,
) -> Vec<u64> {
    let view = base.device_box();
    for coord in base.layout().supercells_in(area) {
        for frame in frame_ids(&view, coord) {
            let capacity = view.frame(frame).capacity();
            for slot in 0..capacity {
                if gen.below(one_in) == 0 {
                    view.invalidate(coord, frame, slot);
                }
            }
        }
    }
    collect_ids(&view, AreaMask::ALL)
}

#[test]
fn random_holes_compact_and_survivors_remain() {
    let base = base_2d([2, 2], [4, 4], 512);
    let mut gen = ParticleGenerator::new(5);
    gen.populate(&base, AreaMask::ALL, 9);
    let survivors = punch_holes(&base, &mut gen, AreaMask::ALL, 3);

    let in_use = base.heap_stats().in_use;
    let report = base.fill_all_gaps().wait().unwrap();
    assert_eq!(report.supercells, 36);
    assert_eq!(base.heap_stats().in_use, in_use - report.frames_freed as u32);

    let view = base.device_box();
    assert_compact(&view, AreaMask::ALL);
    assert_eq!(collect_ids(&view, AreaMask::ALL), survivors);
    assert_eq!(base.total_particles(), survivors.len() as u64);
}

#[test]
fn second_fill_changes_nothing() {
    let base = base_3d([2, 2, 2], [2, 2, 2], 256);
    let mut gen = ParticleGenerator::new(77);
    gen.populate(&base, AreaMask::ALL, 11);
    punch_holes(&base, &mut gen, AreaMask::ALL, 2);

    base.fill_all_gaps().wait().unwrap();
    let view = base.device_box();
    let headers: Vec<_> = base
        .layout()
        .supercells_in(AreaMask::ALL)
        .into_iter()
        .map(|c| view.header(c))
        .collect();

    let report = base.fill_all_gaps().wait().unwrap();
    assert_eq!(report.frames_freed, 0);
    let again: Vec<_> = base
        .layout()
        .supercells_in(AreaMask::ALL)
        .into_iter()
        .map(|c| view.header(c))
        .collect();
    assert_eq!(headers, again);
}

#[test]
fn border_fill_leaves_core_holes() {
    let base = base_2d([2, 2], [3, 3], 128);
    let mut gen = ParticleGenerator::new(9);
    gen.populate(&base, AreaMask::ALL, 6);
    punch_holes(&base, &mut gen, AreaMask::ALL, 2);

    let report = base.fill_border_gaps().wait().unwrap();
    assert_eq!(report.supercells, 8);
    assert_compact(&base.device_box(), AreaMask::BORDER);

    base.fill_gaps(AreaMask::CORE | AreaMask::GUARD).wait().unwrap();
    assert_compact(&base.device_box(), AreaMask::ALL);
}

#[test]
fn emptied_supercells_return_every_frame() {
    let base = base_2d([2, 2], [2, 2], 64);
    let mut gen = ParticleGenerator::new(1);
    gen.populate(&base, AreaMask::ALL, 10);
    punch_holes(&base, &mut gen, AreaMask::ALL, 1);
    assert_eq!(base.total_particles(), 0);

    base.fill_all_gaps().wait().unwrap();
    assert_eq!(base.heap_stats().in_use, 0);
    let view = base.device_box();
    for coord in base.layout().supercells_in(AreaMask::ALL) {
        assert!(!view.header(coord).has_frames());
    }
}
