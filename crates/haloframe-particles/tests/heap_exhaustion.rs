//! Integration tests: behaviour when the frame heap runs dry.
//!
//! A failed allocation must never lose a particle. The dispatch that hit it
//! reports the heap error, the buffer is poisoned, and every later dispatch
//! is refused until `reset`.

use haloframe_core::{ExchangeType, Particle, SupercellCoord};
use haloframe_grid::AreaMask;
use haloframe_heap::{FrameHeap, HeapConfig, HeapError};
use haloframe_particles::{ParticleError, ParticlesBase};
use haloframe_test_utils::{base_2d, collect_ids, config_2d};

#[test]
fn shift_into_full_heap_poisons_without_loss() {
    // One frame of eight: the mover has nowhere to go.
    let base = base_2d([4, 2], [2, 2], 1);
    let a = SupercellCoord::new(1, 1, 0);
    let view = base.device_box();
    for i in 0..7 {
        view.append(a, Particle::new(i, [1.0, 1.0, 0.0])).unwrap();
    }
    view.append(a, Particle::new(7, [4.5, 0.5, 0.0])).unwrap();

    let err = base.shift_particles(AreaMask::ALL).wait().unwrap_err();
    assert_eq!(err, ParticleError::Heap(HeapError::Exhausted { capacity: 1 }));
    assert!(base.is_poisoned());

    assert_eq!(base.total_particles(), 8);
    assert_eq!(collect_ids(&view, AreaMask::ALL), (0..8).collect::<Vec<_>>());
    let stuck = view.particles(a).into_iter().find(|p| p.id == 7).unwrap();
    assert_eq!(stuck.position, [4.5, 0.5, 0.0]);

    assert_eq!(base.fill_all_gaps().wait(), Err(ParticleError::Poisoned));
    assert_eq!(base.total_particles(), 8);
}

#[test]
fn reset_clears_poison_and_returns_frames() {
    let base = base_2d([4, 2], [2, 2], 1);
    let view = base.device_box();
    let a = SupercellCoord::new(1, 1, 0);
    for i in 0..8 {
        view.append(a, Particle::new(i, [4.5, 0.5, 0.0])).unwrap();
    }
    assert!(base.shift_particles(AreaMask::ALL).wait().is_err());
    assert!(base.is_poisoned());

    base.reset(1);
    assert!(!base.is_poisoned());
    assert_eq!(base.total_particles(), 0);
    assert_eq!(base.heap_stats().in_use, 0);
    assert!(base.fill_all_gaps().wait().is_ok());
}

#[test]
fn insert_into_full_heap_keeps_leftovers_staged() {
    let a = base_2d([2, 2], [3, 3], 64);
    let b = ParticlesBase::new(config_2d([2, 2], [3, 3], 1)).unwrap();
    let guard = SupercellCoord::new(4, 2, 0);
    for i in 0..6 {
        a.device_box()
            .append(guard, Particle::new(i, [0.5, 0.5, 0.0]))
            .unwrap();
    }
    a.copy_guard_to_exchange(ExchangeType::RIGHT).wait().unwrap();
    let mut transport = haloframe_test_utils::LoopbackTransport::new();
    assert_eq!(transport.deliver(&a, &b, ExchangeType::RIGHT), 6);

    let err = b.insert_particles(ExchangeType::LEFT).wait().unwrap_err();
    assert_eq!(err, ParticleError::Heap(HeapError::Exhausted { capacity: 1 }));
    assert_eq!(b.total_particles(), 4);
    let staged = b.with_exchange(ExchangeType::LEFT, |ex| ex.incoming_len());
    assert_eq!(staged, 2);
}

#[test]
fn shared_heap_is_drawn_down_by_both_partitions() {
    let heap = FrameHeap::new(&HeapConfig::new(2), 4).unwrap().into_shared();
    let a = ParticlesBase::with_heap(config_2d([2, 2], [2, 2], 2), heap.clone()).unwrap();
    let b = ParticlesBase::with_heap(config_2d([2, 2], [2, 2], 2), heap.clone()).unwrap();
    let c = SupercellCoord::new(1, 1, 0);
    a.device_box().append(c, Particle::new(0, [0.5; 3])).unwrap();
    b.device_box().append(c, Particle::new(1, [0.5; 3])).unwrap();
    assert_eq!(heap.in_use(), 2);
    assert_eq!(
        a.device_box().append(SupercellCoord::new(2, 2, 0), Particle::new(2, [0.5; 3])),
        Err(HeapError::Exhausted { capacity: 2 })
    );
    a.reset(0);
    assert_eq!(heap.in_use(), 1);
    assert_eq!(b.total_particles(), 1);
}
