//! Benchmark profiles for the haloframe particle container.
//!
//! Provides pre-built [`ParticlesConfig`] profiles for benchmarks and
//! examples:
//!
//! - [`reference_profile`]: 2D, 16x16 local supercells of 8x8 cells
//! - [`stress_profile`]: 3D, 8x8x8 local supercells of 4x4x4 cells
//! - [`frames_for`]: heap sizing for a target particle density

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use haloframe_grid::{GridConfig, GridLayout};
use haloframe_heap::HeapConfig;
use haloframe_particles::ParticlesConfig;

/// Particles per supercell the profiles are sized for.
pub const REFERENCE_DENSITY: u32 = 48;

/// Build the reference profile: 2D, 16x16 local supercells of 8x8 cells,
/// one guard layer, heap sized for [`REFERENCE_DENSITY`].
pub fn reference_profile(workers: usize) -> ParticlesConfig {
    profile(GridConfig::new_2d([8, 8], [16, 16]), workers)
}

/// Build the stress profile: 3D, 8x8x8 local supercells of 4x4x4 cells.
pub fn stress_profile(workers: usize) -> ParticlesConfig {
    profile(GridConfig::new_3d([4, 4, 4], [8, 8, 8]), workers)
}

fn profile(grid: GridConfig, workers: usize) -> ParticlesConfig {
    let heap = match GridLayout::new(&grid) {
        Ok(layout) => frames_for(&layout, REFERENCE_DENSITY),
        Err(e) => panic!("benchmark grid is invalid: {e}"),
    };
    ParticlesConfig::new(grid)
        .with_heap(heap)
        .with_workers(workers)
        .with_exchange_capacity(1 << 16)
}

/// Heap config for `density` particles in every supercell of `layout`,
/// with room for one partial frame per supercell and a shift's worth of
/// churn.
pub fn frames_for(layout: &GridLayout, density: u32) -> HeapConfig {
    let supercells = layout.supercell_count() as u64;
    let particles = supercells * u64::from(density);
    let dense = HeapConfig::for_particles(particles, layout.tile_volume(), supercells as u32);
    HeapConfig::new(dense.max_frames.saturating_mul(2).min(u32::MAX - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_validate() {
        let layout = reference_profile(2).validate().unwrap();
        assert_eq!(layout.tile_volume(), 64);
        assert_eq!(layout.supercell_count(), 18 * 18);
        let layout = stress_profile(2).validate().unwrap();
        assert_eq!(layout.supercell_count(), 10 * 10 * 10);
    }

    #[test]
    fn heap_covers_density() {
        let layout = reference_profile(1).validate().unwrap();
        let heap = frames_for(&layout, REFERENCE_DENSITY);
        let needed = layout.supercell_count() as u32
            * REFERENCE_DENSITY.div_ceil(layout.tile_volume());
        assert!(heap.max_frames >= needed);
    }
}
