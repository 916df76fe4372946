//! Buffer configuration, validation, and error types.
//!
//! [`ParticlesConfig`] is the input to
//! [`ParticlesBase::new`](crate::ParticlesBase::new). Everything is checked
//! eagerly at construction; nothing is re-validated per dispatch.

use std::error::Error;
use std::fmt;

use indexmap::IndexMap;

use haloframe_core::{Dimensionality, ExchangeType};
use haloframe_grid::{GridConfig, GridError, GridLayout};
use haloframe_heap::{HeapConfig, HeapError};

// ── GuardPolicy ────────────────────────────────────────────────────

/// What a partition does with the particles in one side's guard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GuardPolicy {
    /// Copy them out for transport to the neighbour on that side.
    #[default]
    Exchange,
    /// Discard them. Used for absorbing boundaries.
    Delete,
}

/// Guard policy per direction: a default plus explicit overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GuardPolicies {
    default: GuardPolicy,
    overrides: IndexMap<ExchangeType, GuardPolicy>,
}

impl GuardPolicies {
    /// `default` for every direction.
    pub fn new(default: GuardPolicy) -> Self {
        Self {
            default,
            overrides: IndexMap::new(),
        }
    }

    /// Policy for directions without an override.
    pub fn default_policy(&self) -> GuardPolicy {
        self.default
    }

    /// Override the policy of one direction. A later call for the same
    /// direction wins.
    pub fn set(&mut self, direction: ExchangeType, policy: GuardPolicy) {
        self.overrides.insert(direction, policy);
    }

    /// Policy that applies to `direction`.
    pub fn get(&self, direction: ExchangeType) -> GuardPolicy {
        self.overrides.get(&direction).copied().unwrap_or(self.default)
    }

    /// Explicitly overridden directions, in the order they were set.
    pub fn overrides(&self) -> impl Iterator<Item = (ExchangeType, GuardPolicy)> + '_ {
        self.overrides.iter().map(|(&d, &p)| (d, p))
    }
}

// ── ParticlesConfig ────────────────────────────────────────────────

/// Startup configuration of a partition's particle buffer.
#[derive(Clone, Debug)]
pub struct ParticlesConfig {
    /// Supercell grid geometry.
    pub grid: GridConfig,
    /// Frame budget for the heap built by `ParticlesBase::new`. Ignored when
    /// a shared heap is supplied through `ParticlesBase::with_heap`.
    pub heap: HeapConfig,
    /// Outgoing-stage capacity of each exchange buffer, in particles.
    pub exchange_capacity: usize,
    /// What to do with guard particles, per direction.
    pub guard: GuardPolicies,
    /// Worker threads. `None` = `available_parallelism`, clamped to `[1, 64]`.
    pub workers: Option<usize>,
}

impl ParticlesConfig {
    /// Default per-direction exchange capacity.
    pub const DEFAULT_EXCHANGE_CAPACITY: usize = 4096;

    /// A config over `grid` with the default heap and exchange capacity.
    pub fn new(grid: GridConfig) -> Self {
        Self {
            grid,
            heap: HeapConfig::default(),
            exchange_capacity: Self::DEFAULT_EXCHANGE_CAPACITY,
            guard: GuardPolicies::default(),
            workers: None,
        }
    }

    /// Builder-style heap setter.
    pub fn with_heap(mut self, heap: HeapConfig) -> Self {
        self.heap = heap;
        self
    }

    /// Builder-style exchange capacity setter.
    pub fn with_exchange_capacity(mut self, capacity: usize) -> Self {
        self.exchange_capacity = capacity;
        self
    }

    /// Builder-style setter for the policy of every direction without an
    /// override.
    pub fn with_default_guard_policy(mut self, policy: GuardPolicy) -> Self {
        self.guard.default = policy;
        self
    }

    /// Builder-style setter for the policy of one direction.
    pub fn with_guard_policy(mut self, direction: ExchangeType, policy: GuardPolicy) -> Self {
        self.guard.set(direction, policy);
        self
    }

    /// Policy that applies to `direction`.
    pub fn guard_policy(&self, direction: ExchangeType) -> GuardPolicy {
        self.guard.get(direction)
    }

    /// Builder-style worker count setter.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Check everything except the heap budget and derive the grid layout.
    pub fn validate(&self) -> Result<GridLayout, ConfigError> {
        let layout = GridLayout::new(&self.grid)?;
        if self.exchange_capacity == 0 {
            return Err(ConfigError::ExchangeCapacityZero);
        }
        if let Some((direction, _)) = self
            .guard
            .overrides()
            .find(|(d, _)| !d.is_valid_for(layout.dim()))
        {
            return Err(ConfigError::GuardDirection {
                direction,
                dim: layout.dim(),
            });
        }
        Ok(layout)
    }

    /// Resolve the actual worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.workers {
            Some(n) => n.clamp(1, 64),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, 64),
        }
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building a particle buffer.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Grid geometry is invalid.
    Grid(GridError),
    /// Heap configuration is invalid.
    Heap(HeapError),
    /// Exchange capacity is zero.
    ExchangeCapacityZero,
    /// A guard policy names a direction the grid does not have.
    GuardDirection {
        /// The offending direction.
        direction: ExchangeType,
        /// Dimensionality of the grid.
        dim: Dimensionality,
    },
    /// A supplied heap's frames do not match the grid's tile volume.
    FrameCapacityMismatch {
        /// Slots per frame in the heap.
        heap: u32,
        /// Cells per supercell in the grid.
        tile_volume: u32,
    },
    /// A worker thread could not be spawned.
    ThreadSpawnFailed {
        /// Description of which thread failed.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grid(e) => write!(f, "grid: {e}"),
            Self::Heap(e) => write!(f, "heap: {e}"),
            Self::ExchangeCapacityZero => write!(f, "exchange_capacity must be at least 1"),
            Self::GuardDirection { direction, dim } => {
                write!(f, "guard policy for {direction} invalid for {dim:?} grid")
            }
            Self::FrameCapacityMismatch { heap, tile_volume } => write!(
                f,
                "heap frames hold {heap} particles but supercells have {tile_volume} cells"
            ),
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "thread spawn failed: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Grid(e) => Some(e),
            Self::Heap(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GridError> for ConfigError {
    fn from(e: GridError) -> Self {
        Self::Grid(e)
    }
}

impl From<HeapError> for ConfigError {
    fn from(e: HeapError) -> Self {
        Self::Heap(e)
    }
}
