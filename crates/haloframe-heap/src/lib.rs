//! Bounded frame heap for haloframe particle storage.
//!
//! Particles live in fixed-capacity blocks called frames. All frames of a
//! partition come from one [`FrameHeap`] whose size is fixed at construction;
//! running out of frames is an error, never a silent reallocation.
//!
//! # Architecture
//!
//! ```text
//! FrameHeap
//! ├── Mutex<Frame> × max_frames   (slot storage materialised on first use)
//! ├── FreeList                    (Treiber stack of frame indices, ABA-tagged)
//! └── counters                    (in use, peak, allocations, frees)
//! ```
//!
//! Frames carry `prev`/`next` links so a supercell can chain them into a
//! list without any side table. Only whole frames move; the heap itself is
//! never compacted.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod frame;
mod free_list;
pub mod heap;

pub use config::HeapConfig;
pub use error::HeapError;
pub use frame::Frame;
pub use heap::{FrameHeap, HeapStats, SharedFrameHeap};
