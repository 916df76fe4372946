//! Core types for the haloframe particle container.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! vocabulary shared by the rest of the workspace: the [`Particle`] record,
//! strongly-typed identifiers, the partition [`Dimensionality`] and the
//! neighbour-direction encoding [`ExchangeType`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod dim;
pub mod exchange;
pub mod id;
pub mod particle;

pub use dim::Dimensionality;
pub use exchange::ExchangeType;
pub use id::{FrameId, SupercellCoord};
pub use particle::Particle;
