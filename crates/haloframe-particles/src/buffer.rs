//! The particle buffer: supercell table, frame heap and exchange buffers of
//! one partition.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use haloframe_core::ExchangeType;
use haloframe_grid::GridLayout;
use haloframe_heap::{FrameHeap, HeapStats, SharedFrameHeap};

use crate::exchange::ExchangeBuffer;
use crate::supercell::{SupercellHeader, SupercellTable};
use crate::view::{MemorySpace, ParticleBox};

/// Storage shared between a [`ParticlesBase`](crate::ParticlesBase) and its
/// workers.
///
/// Exclusively owns every supercell header and every frame linked from them;
/// frames come from and return to the heap.
pub struct ParticlesBuffer {
    layout: GridLayout,
    heap: SharedFrameHeap,
    supercells: SupercellTable,
    exchanges: Box<[Mutex<ExchangeBuffer>]>,
    poisoned: AtomicBool,
    in_flight: AtomicBool,
}

// Compile-time assertion: ParticlesBuffer must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<ParticlesBuffer>();
};

impl ParticlesBuffer {
    pub(crate) fn new(layout: GridLayout, heap: SharedFrameHeap, exchange_capacity: usize) -> Self {
        let exchanges = ExchangeType::all(layout.dim())
            .into_iter()
            .map(|d| Mutex::new(ExchangeBuffer::new(d, exchange_capacity)))
            .collect();
        Self {
            supercells: SupercellTable::new(layout.supercell_count()),
            layout,
            heap,
            exchanges,
            poisoned: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Grid geometry.
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// The frame heap.
    pub fn heap(&self) -> &FrameHeap {
        &self.heap
    }

    /// Heap counters.
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// Supercells in the table, guard included.
    pub fn supercell_count(&self) -> usize {
        self.supercells.len()
    }

    pub(crate) fn supercells(&self) -> &SupercellTable {
        &self.supercells
    }

    /// Snapshot of one header.
    pub fn header(&self, index: usize) -> SupercellHeader {
        *self.supercells.lock(index)
    }

    /// Sum of the live counts of every supercell.
    ///
    /// Only exact when no copy-out is awaiting its gap fill.
    pub fn total_particles(&self) -> u64 {
        (0..self.supercells.len())
            .map(|i| u64::from(self.supercells.lock(i).num_particles))
            .sum()
    }

    /// Exclusive access to the exchange buffer of `direction`.
    ///
    /// # Panics
    ///
    /// Panics if `direction` is not valid for the grid's dimensionality.
    pub fn exchange(&self, direction: ExchangeType) -> MutexGuard<'_, ExchangeBuffer> {
        assert!(
            direction.is_valid_for(self.layout.dim()),
            "exchange {direction} invalid for {:?} grid",
            self.layout.dim()
        );
        self.exchanges[direction.code() as usize - 1]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a heap exhaustion has poisoned the buffer.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::Acquire)
    }

    /// Mark the buffer poisoned. Returns `true` if it was not already.
    pub(crate) fn poison(&self) -> bool {
        !self.poisoned.swap(true, Ordering::AcqRel)
    }

    /// Claim the single dispatch slot. Returns `false` if an event is
    /// already outstanding.
    pub(crate) fn begin_dispatch(&self) -> bool {
        !self.in_flight.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn end_dispatch(&self) {
        self.in_flight.store(false, Ordering::Release);
    }

    pub(crate) fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// A view for kernels.
    pub fn device_box(self: &Arc<Self>) -> ParticleBox {
        ParticleBox::new(Arc::clone(self), MemorySpace::Device)
    }

    /// A view for host-side readback. Memory is unified on this backend;
    /// `memory_offset` is recorded in the view's [`MemorySpace`].
    pub fn host_box(self: &Arc<Self>, memory_offset: i64) -> ParticleBox {
        ParticleBox::new(
            Arc::clone(self),
            MemorySpace::Host {
                offset: memory_offset,
            },
        )
    }

    /// Return every supercell to empty, every frame to the heap, clear every
    /// exchange buffer and the poison flag. Returns the frames freed.
    pub(crate) fn reset(&self) -> u64 {
        let mut freed = 0;
        for i in 0..self.supercells.len() {
            let (_, frames) = self.supercells.lock(i).release(&self.heap);
            freed += frames;
        }
        for exchange in self.exchanges.iter() {
            exchange
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear();
        }
        self.poisoned.store(false, Ordering::Release);
        freed
    }
}
