//! Test utilities for haloframe development.
//!
//! Provides small grid fixtures, a seeded particle generator, checks for the
//! frame-list invariants, and a [`LoopbackTransport`] that plays the part of
//! the network between two partitions.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod generator;
pub mod invariants;
pub mod transport;

pub use fixtures::{base_2d, base_3d, config_2d, config_3d};
pub use generator::ParticleGenerator;
pub use invariants::{assert_compact, assert_in_place, collect_ids, count_valid};
pub use transport::LoopbackTransport;
