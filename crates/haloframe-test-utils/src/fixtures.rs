//! Small partitions used across the integration tests.

use haloframe_grid::GridConfig;
use haloframe_heap::HeapConfig;
use haloframe_particles::{ParticlesBase, ParticlesConfig};

/// Workers used by fixture partitions. Two is enough to exercise
/// concurrent passes while keeping test threads cheap.
pub const FIXTURE_WORKERS: usize = 2;

/// 2D partition config with `frames` heap frames.
pub fn config_2d(supercell_size: [u32; 2], local: [u32; 2], frames: u32) -> ParticlesConfig {
    ParticlesConfig::new(GridConfig::new_2d(supercell_size, local))
        .with_heap(HeapConfig::new(frames))
        .with_workers(FIXTURE_WORKERS)
}

/// 3D partition config with `frames` heap frames.
pub fn config_3d(supercell_size: [u32; 3], local: [u32; 3], frames: u32) -> ParticlesConfig {
    ParticlesConfig::new(GridConfig::new_3d(supercell_size, local))
        .with_heap(HeapConfig::new(frames))
        .with_workers(FIXTURE_WORKERS)
}

/// Build a 2D partition, panicking on a bad fixture.
pub fn base_2d(supercell_size: [u32; 2], local: [u32; 2], frames: u32) -> ParticlesBase {
    ParticlesBase::new(config_2d(supercell_size, local, frames)).expect("2D fixture config")
}

/// Build a 3D partition, panicking on a bad fixture.
pub fn base_3d(supercell_size: [u32; 3], local: [u32; 3], frames: u32) -> ParticlesBase {
    ParticlesBase::new(config_3d(supercell_size, local, frames)).expect("3D fixture config")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixtures_build() {
        let b = base_2d([4, 2], [2, 2], 16);
        assert_eq!(b.layout().tile_volume(), 8);
        assert_eq!(b.worker_count(), FIXTURE_WORKERS);
        let b = base_3d([2, 2, 2], [2, 2, 2], 16);
        assert_eq!(b.layout().supercell_count(), 64);
    }
}
