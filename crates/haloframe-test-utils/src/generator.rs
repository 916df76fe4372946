//! Deterministic particle generation.

use haloframe_core::{Particle, SupercellCoord};
use haloframe_grid::{AreaMask, GridLayout};
use haloframe_particles::ParticlesBase;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seeded source of particles with unique, increasing ids.
///
/// Two generators built from the same seed produce the same sequence.
pub struct ParticleGenerator {
    rng: ChaCha8Rng,
    next_id: u64,
}

impl ParticleGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            next_id: 0,
        }
    }

    /// Id the next particle will get.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Uniform in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.rng.random::<f32>()
    }

    /// Uniform integer in `[0, n)`.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn below(&mut self, n: u32) -> u32 {
        self.rng.random_range(0..n)
    }

    /// A particle in place: every active axis in `[0, size)`.
    pub fn in_place(&mut self, layout: &GridLayout) -> Particle {
        let size = layout.supercell_size();
        let mut position = [0.0f32; 3];
        for (axis, p) in position.iter_mut().enumerate().take(layout.dim().axes()) {
            *p = self.unit() * size[axis] as f32;
        }
        self.particle(position)
    }

    /// A particle that has drifted by up to one supercell on every active
    /// axis: each component in `[-size, 2 * size)`.
    pub fn drifted(&mut self, layout: &GridLayout) -> Particle {
        let size = layout.supercell_size();
        let mut position = [0.0f32; 3];
        for (axis, p) in position.iter_mut().enumerate().take(layout.dim().axes()) {
            let extent = size[axis] as f32;
            let upper = 2.0 * extent;
            *p = (self.unit() * 3.0 * extent - extent).min(f32::from_bits(upper.to_bits() - 1));
        }
        self.particle(position)
    }

    /// Append `per_supercell` in-place particles to every supercell of
    /// `area`. Returns the number appended.
    ///
    /// # Panics
    ///
    /// Panics if the heap runs out.
    pub fn populate(&mut self, base: &ParticlesBase, area: AreaMask, per_supercell: u32) -> u64 {
        self.populate_with(base, area, per_supercell, Self::in_place)
    }

    /// Like [`populate`](Self::populate) but with drifted particles, keeping
    /// only those whose destination is still inside the grid.
    pub fn populate_drifted(
        &mut self,
        base: &ParticlesBase,
        area: AreaMask,
        per_supercell: u32,
    ) -> u64 {
        let layout = *base.layout();
        let view = base.device_box();
        let mut appended = 0;
        for coord in layout.supercells_in(area) {
            for _ in 0..per_supercell {
                let p = self.drifted(&layout);
                if !destination_in_grid(&layout, coord, &p) {
                    continue;
                }
                view.append(coord, p).expect("heap sized for fixture");
                appended += 1;
            }
        }
        appended
    }

    fn populate_with(
        &mut self,
        base: &ParticlesBase,
        area: AreaMask,
        per_supercell: u32,
        mut make: impl FnMut(&mut Self, &GridLayout) -> Particle,
    ) -> u64 {
        let layout = *base.layout();
        let view = base.device_box();
        let mut appended = 0;
        for coord in layout.supercells_in(area) {
            for _ in 0..per_supercell {
                let p = make(self, &layout);
                view.append(coord, p).expect("heap sized for fixture");
                appended += 1;
            }
        }
        appended
    }

    fn particle(&mut self, position: [f32; 3]) -> Particle {
        let id = self.next_id;
        self.next_id += 1;
        let momentum = [self.unit() - 0.5, self.unit() - 0.5, self.unit() - 0.5];
        Particle::new(id, position).with_momentum(momentum)
    }
}

/// Supercell a particle of `coord` belongs to after a shift, if any.
pub fn destination(
    layout: &GridLayout,
    coord: SupercellCoord,
    particle: &Particle,
) -> Option<SupercellCoord> {
    let size = layout.supercell_size();
    let mut hop = [0i32; 3];
    for axis in 0..layout.dim().axes() {
        hop[axis] = (particle.position[axis] / size[axis] as f32).floor() as i32;
    }
    coord.offset(hop).filter(|c| layout.contains(*c))
}

fn destination_in_grid(layout: &GridLayout, coord: SupercellCoord, particle: &Particle) -> bool {
    destination(layout, coord, particle).is_some()
}
