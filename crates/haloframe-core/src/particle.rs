//! The particle record stored in frame slots.

/// A single macro-particle.
///
/// `position` is expressed in cell units relative to the origin of the
/// supercell whose frame list holds the particle; a particle is in place when
/// every active component lies in `[0, supercell_size[axis])`. The push
/// kernel writes positions outside that range when a particle crosses into a
/// neighbour, and the shift kernel re-bases them.
///
/// `valid == false` marks a hole: the slot holds no live particle and its
/// other fields are meaningless.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    /// Position in cells, relative to the owning supercell.
    pub position: [f32; 3],
    /// Momentum.
    pub momentum: [f32; 3],
    /// Number of physical particles represented.
    pub weighting: f32,
    /// Globally unique particle id.
    pub id: u64,
    /// Validity bit.
    pub valid: bool,
}

impl Particle {
    /// An empty slot.
    pub const INVALID: Self = Self {
        position: [0.0; 3],
        momentum: [0.0; 3],
        weighting: 0.0,
        id: 0,
        valid: false,
    };

    /// A live particle at rest with unit weighting.
    pub fn new(id: u64, position: [f32; 3]) -> Self {
        Self {
            position,
            momentum: [0.0; 3],
            weighting: 1.0,
            id,
            valid: true,
        }
    }

    /// Builder-style momentum setter.
    pub fn with_momentum(mut self, momentum: [f32; 3]) -> Self {
        self.momentum = momentum;
        self
    }

    /// Builder-style weighting setter.
    pub fn with_weighting(mut self, weighting: f32) -> Self {
        self.weighting = weighting;
        self
    }

    /// Cell inside the owning supercell, as per-axis integer offsets.
    ///
    /// Only meaningful for a particle that is in place.
    pub fn local_cell(&self) -> [u32; 3] {
        let mut cell = [0u32; 3];
        for (c, p) in cell.iter_mut().zip(self.position) {
            *c = p.max(0.0).floor() as u32;
        }
        cell
    }
}

impl Default for Particle {
    fn default() -> Self {
        Self::INVALID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_invalid() {
        assert!(!Particle::default().valid);
    }

    #[test]
    fn new_is_valid_with_unit_weight() {
        let p = Particle::new(3, [1.5, 0.25, 0.0]).with_momentum([1.0, 0.0, 0.0]);
        assert!(p.valid);
        assert_eq!(p.weighting, 1.0);
        assert_eq!(p.momentum[0], 1.0);
        assert_eq!(p.local_cell(), [1, 0, 0]);
    }
}
