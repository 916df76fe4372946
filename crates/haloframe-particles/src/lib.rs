//! Supercell-partitioned particle storage for one simulation partition.
//!
//! Particles live in fixed-capacity frames taken from a bounded
//! [`FrameHeap`](haloframe_heap::FrameHeap) and chained per supercell. The
//! [`ParticlesBase`] facade runs three families of kernels over that storage
//! on a persistent worker pool:
//!
//! - **shift**: moves particles whose position left their supercell into the
//!   neighbour, in stride-3 passes so no two concurrent supercells share a
//!   neighbour;
//! - **gap fill**: compacts each supercell's frames and returns empty ones;
//! - **guard exchange**: copies guard particles out to per-direction
//!   [`ExchangeBuffer`]s or deletes them, as each side's [`GuardPolicy`]
//!   says, and inserts particles received from neighbours into the border
//!   layer.
//!
//! Every dispatch returns an [`Event`]; heap exhaustion surfaces as a
//! [`ParticleError`] and poisons the buffer until [`ParticlesBase::reset`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod exchange;
pub(crate) mod kernels;
pub mod metrics;
pub mod particles;
pub mod supercell;
pub mod view;

pub use buffer::ParticlesBuffer;
pub use config::{ConfigError, GuardPolicies, GuardPolicy, ParticlesConfig};
pub use dispatch::Event;
pub use error::ParticleError;
pub use exchange::{ExchangeBuffer, ExchangeEntry};
pub use metrics::{DispatchReport, KernelKind};
pub use particles::ParticlesBase;
pub use supercell::SupercellHeader;
pub use view::{MemorySpace, ParticleBox};
