//! A minimal driver loop: one 2D partition with periodic boundaries.
//!
//! Each step pushes every particle along its momentum, relocates the ones
//! that crossed a supercell edge, wraps the guard layer round to the
//! opposite border and compacts. The particle count must never change.

use haloframe_bench::{reference_profile, REFERENCE_DENSITY};
use haloframe_core::{Dimensionality, ExchangeType};
use haloframe_grid::AreaMask;
use haloframe_particles::ParticlesBase;
use haloframe_test_utils::{LoopbackTransport, ParticleGenerator};

const STEPS: u64 = 20;
const DT: f32 = 1.5;

fn main() {
    let base = ParticlesBase::new(reference_profile(4)).expect("reference profile");
    let seeded = ParticleGenerator::new(42).populate(
        &base,
        AreaMask::CORE | AreaMask::BORDER,
        REFERENCE_DENSITY,
    );
    println!("seeded {seeded} particles on {} workers", base.worker_count());

    let mut transport = LoopbackTransport::new();
    for step in 0..STEPS {
        push(&base);
        let shift = base.shift_particles(AreaMask::ALL).wait().expect("shift");
        let mut wrapped = 0;
        for direction in ExchangeType::all(Dimensionality::Two) {
            wrapped += transport.exchange(&base, &base, direction);
        }
        let stats = base.heap_stats();
        println!(
            "step {step:>2}: moved {:>5}, wrapped {wrapped:>4}, frames {}/{}",
            shift.particles_moved, stats.in_use, stats.capacity
        );
        assert_eq!(base.total_particles(), seeded);
    }
    println!("{} particles wrapped in total", transport.delivered());
}

/// Advance positions by `momentum * DT`. Momenta are in `[-0.5, 0.5)`, so
/// no particle travels more than one supercell.
fn push(base: &ParticlesBase) {
    let view = base.device_box();
    for coord in base.layout().supercells_in(AreaMask::CORE | AreaMask::BORDER) {
        view.for_each_particle_mut(coord, |p| {
            p.position[0] += p.momentum[0] * DT;
            p.position[1] += p.momentum[1] * DT;
        });
    }
}
