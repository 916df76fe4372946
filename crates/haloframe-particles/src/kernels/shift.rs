//! Relocation of particles that left their supercell.

use haloframe_core::{Dimensionality, Particle, SupercellCoord};
use haloframe_heap::HeapError;
use smallvec::SmallVec;

use crate::buffer::ParticlesBuffer;
use crate::metrics::KernelCounts;

/// Supercells a particle moves per axis, from its relative position.
///
/// # Panics
///
/// Panics if any axis hop exceeds one supercell.
pub(crate) fn hop_of(
    particle: &Particle,
    size: [u32; 3],
    dim: Dimensionality,
    coord: SupercellCoord,
) -> [i32; 3] {
    let mut hop = [0i32; 3];
    for axis in 0..dim.axes() {
        let h = (particle.position[axis] / size[axis] as f32).floor();
        if h == 0.0 || h.is_nan() {
            continue;
        }
        assert!(
            h.abs() <= 1.0,
            "particle {} in supercell {coord} hops {h} supercells on axis {axis}, at most 1 is supported",
            particle.id
        );
        hop[axis] = h as i32;
    }
    hop
}

/// Re-base a position after a hop, clamped into `[0, size)` against float
/// rounding.
pub(crate) fn rebase(particle: &mut Particle, hop: [i32; 3], size: [u32; 3]) {
    for axis in 0..3 {
        if hop[axis] == 0 {
            continue;
        }
        let extent = size[axis] as f32;
        let mut p = particle.position[axis] - hop[axis] as f32 * extent;
        if p >= extent {
            p = f32::from_bits(extent.to_bits() - 1);
        }
        if p < 0.0 {
            p = 0.0;
        }
        particle.position[axis] = p;
    }
}

/// Move every out-of-place particle of `coord` into its neighbour.
///
/// The destination append happens before the source slot is invalidated, so
/// a heap failure leaves the particle where it was.
pub(crate) fn shift_supercell(
    buffer: &ParticlesBuffer,
    coord: SupercellCoord,
) -> Result<KernelCounts, HeapError> {
    let layout = buffer.layout();
    let heap = buffer.heap();
    let size = layout.supercell_size();
    let mut counts = KernelCounts {
        supercells: 1,
        ..Default::default()
    };

    let mut header = buffer.supercells().lock(layout.index(coord));
    for frame_id in header.frames(heap) {
        let movers: SmallVec<[(usize, [i32; 3]); 16]> = heap
            .lock(frame_id)
            .slots()
            .iter()
            .enumerate()
            .filter(|(_, p)| p.valid)
            .filter_map(|(slot, p)| {
                let hop = hop_of(p, size, layout.dim(), coord);
                (hop != [0; 3]).then_some((slot, hop))
            })
            .collect();

        for (slot, hop) in movers {
            let dest = layout.checked_offset(coord, hop).unwrap_or_else(|| {
                panic!("particle in supercell {coord} leaves the grid (hop {hop:?})")
            });
            let mut particle = *heap.lock(frame_id).get(slot);
            rebase(&mut particle, hop, size);
            buffer
                .supercells()
                .lock(layout.index(dest))
                .append(heap, particle)?;
            heap.lock(frame_id).invalidate(slot);
            header.num_particles = header.num_particles.saturating_sub(1);
            counts.moved += 1;
        }
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SIZE: [u32; 3] = [4, 4, 1];
    const C: SupercellCoord = SupercellCoord([1, 1, 0]);

    fn at(x: f32, y: f32) -> Particle {
        Particle::new(0, [x, y, 0.0])
    }

    #[test]
    fn in_place_particle_stays() {
        assert_eq!(hop_of(&at(0.0, 3.99), SIZE, Dimensionality::Two, C), [0, 0, 0]);
    }

    #[test]
    fn hops_in_each_direction() {
        assert_eq!(hop_of(&at(4.0, 1.0), SIZE, Dimensionality::Two, C), [1, 0, 0]);
        assert_eq!(hop_of(&at(-0.1, 5.0), SIZE, Dimensionality::Two, C), [-1, 1, 0]);
    }

    #[test]
    fn inactive_axis_ignored() {
        let p = Particle::new(0, [1.0, 1.0, 17.0]);
        assert_eq!(hop_of(&p, SIZE, Dimensionality::Two, C), [0, 0, 0]);
    }

    #[test]
    #[should_panic(expected = "at most 1 is supported")]
    fn double_hop_panics() {
        hop_of(&at(8.5, 0.0), SIZE, Dimensionality::Two, C);
    }

    #[test]
    fn rebase_clamps_below_extent() {
        let mut p = at(-1e-9, 2.0);
        let hop = hop_of(&p, SIZE, Dimensionality::Two, C);
        assert_eq!(hop, [-1, 0, 0]);
        rebase(&mut p, hop, SIZE);
        assert!(p.position[0] < 4.0);
        assert!(p.position[0] >= 0.0);
        assert_eq!(p.position[1], 2.0);
    }

    proptest! {
        #[test]
        fn rebased_position_is_in_place(
            x in -4.0f32..8.0, y in -4.0f32..8.0
        ) {
            let mut p = at(x, y);
            let hop = hop_of(&p, SIZE, Dimensionality::Two, C);
            rebase(&mut p, hop, SIZE);
            prop_assert!(p.position[0] >= 0.0 && p.position[0] < 4.0);
            prop_assert!(p.position[1] >= 0.0 && p.position[1] < 4.0);
        }
    }
}
