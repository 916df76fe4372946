//! haloframe: a supercell-partitioned particle container with bounded frame
//! storage and halo exchange.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! haloframe sub-crates, plus the [`data`] registry a driver keeps its
//! per-partition state in. For most users, adding `haloframe` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use haloframe::prelude::*;
//!
//! // 2x2-cell supercells, 3x3 local supercells plus one guard layer.
//! let config = ParticlesConfig::new(GridConfig::new_2d([2, 2], [3, 3]))
//!     .with_heap(HeapConfig::new(64))
//!     .with_workers(2);
//! let particles = ParticlesBase::new(config).unwrap();
//!
//! // A particle that has drifted half a cell past the right edge of its
//! // supercell.
//! let from = SupercellCoord::new(2, 2, 0);
//! particles
//!     .device_box()
//!     .append(from, Particle::new(1, [2.5, 0.5, 0.0]))
//!     .unwrap();
//!
//! let report = particles.shift_particles(AreaMask::ALL).wait().unwrap();
//! assert_eq!(report.particles_moved, 1);
//! particles.fill_all_gaps().wait().unwrap();
//!
//! let to = SupercellCoord::new(3, 2, 0);
//! assert_eq!(particles.device_box().particle_count(to), 1);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `haloframe-core` | Particle record, ids, exchange directions |
//! | [`heap`] | `haloframe-heap` | Bounded frame heap and frames |
//! | [`grid`] | `haloframe-grid` | Grid layout, areas and strided mappings |
//! | [`particles`] | `haloframe-particles` | Particle buffer, kernels, dispatch events |
//! | [`data`] | this crate | Named simulation data and the data set registry |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod data;

/// Core types and ids (`haloframe-core`).
///
/// Contains the [`types::Particle`] record, [`types::SupercellCoord`],
/// [`types::FrameId`] and the neighbour encoding [`types::ExchangeType`].
pub use haloframe_core as types;

/// Bounded frame heap (`haloframe-heap`).
///
/// Most users only need [`heap::HeapConfig`]; share one heap between
/// partitions with [`heap::FrameHeap::into_shared`].
pub use haloframe_heap as heap;

/// Grid layout, areas and mappings (`haloframe-grid`).
///
/// [`grid::GridLayout`] answers every geometry question; the
/// [`grid::MapperFactory`] trait is the extension point for custom
/// traversal orders.
pub use haloframe_grid as grid;

/// The particle buffer and its kernels (`haloframe-particles`).
///
/// [`particles::ParticlesBase`] is the entry point; every mutating call
/// returns an [`particles::Event`].
pub use haloframe_particles as particles;

/// Common imports for typical haloframe usage.
///
/// ```rust
/// use haloframe::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use haloframe_core::{Dimensionality, ExchangeType, FrameId, Particle, SupercellCoord};

    // Heap
    pub use haloframe_heap::{FrameHeap, HeapConfig, HeapError, HeapStats, SharedFrameHeap};

    // Grid
    pub use haloframe_grid::{
        Area, AreaMask, GridConfig, GridLayout, MapperFactory, StrideAreaMapperFactory,
        SupercellMapper,
    };

    // Particles
    pub use haloframe_particles::{
        ConfigError, DispatchReport, Event, GuardPolicy, ParticleBox, ParticleError,
        ParticlesBase, ParticlesConfig,
    };

    // Data registry
    pub use crate::data::{DataError, DataSet, FieldData, SimulationData};
}
