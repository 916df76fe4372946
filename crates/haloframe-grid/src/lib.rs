//! Supercell grid geometry for haloframe partitions.
//!
//! A partition's particles are binned into supercells: fixed-size tiles of
//! cells laid out on a regular grid that includes a guard (halo) layer. This
//! crate owns that geometry and nothing else:
//!
//! - [`GridConfig`] / [`GridLayout`]: validated extents, index arithmetic,
//!   tile volume.
//! - [`Area`] / [`AreaMask`]: CORE, BORDER and GUARD classification.
//! - [`SupercellRange`]: the guard and border boxes of each exchange direction.
//! - [`SupercellMapper`] / [`MapperFactory`]: enumeration of a region's
//!   supercells, optionally strided so one pass never touches neighbours.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod area;
pub mod config;
pub mod error;
pub mod layout;
pub mod mapping;
pub mod range;

#[cfg(test)]
pub(crate) mod compliance;

pub use area::{Area, AreaMask};
pub use config::GridConfig;
pub use error::GridError;
pub use layout::GridLayout;
pub use mapping::{
    collect_passes, find_close_pair, AreaMapper, AreaMapperFactory, MapperFactory,
    StrideAreaMapperFactory, StrideMapper, SupercellMapper,
};
pub use range::SupercellRange;
