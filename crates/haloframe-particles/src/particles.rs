//! The public per-partition facade.

use std::sync::Arc;

use haloframe_core::ExchangeType;
#[cfg(debug_assertions)]
use haloframe_grid::find_close_pair;
use haloframe_grid::{
    collect_passes, AreaMapperFactory, AreaMask, GridLayout, MapperFactory,
    StrideAreaMapperFactory, SupercellMapper,
};
use haloframe_heap::{FrameHeap, HeapStats, SharedFrameHeap};

use crate::buffer::ParticlesBuffer;
use crate::config::{ConfigError, GuardPolicies, GuardPolicy, ParticlesConfig};
use crate::dispatch::{Dispatcher, Event, Plan, WorkerPool};
use crate::error::ParticleError;
use crate::exchange::ExchangeBuffer;
use crate::kernels::SupercellKernel;
use crate::view::ParticleBox;

/// A partition's particles: the buffer plus the worker pool that mutates it.
///
/// Every mutating operation is a dispatch that returns an [`Event`]. At most
/// one event may be outstanding at a time; issuing a dispatch before waiting
/// on the previous one panics.
pub struct ParticlesBase {
    buffer: Arc<ParticlesBuffer>,
    pool: WorkerPool,
    guard: GuardPolicies,
}

impl ParticlesBase {
    /// Build a buffer with its own heap, sized by `config.heap`.
    pub fn new(config: ParticlesConfig) -> Result<Self, ConfigError> {
        let layout = config.validate()?;
        let heap = FrameHeap::new(&config.heap, layout.tile_volume())?.into_shared();
        Self::build(config, layout, heap)
    }

    /// Build a buffer over an existing heap.
    pub fn with_heap(config: ParticlesConfig, heap: SharedFrameHeap) -> Result<Self, ConfigError> {
        let layout = config.validate()?;
        if heap.frame_capacity() != layout.tile_volume() {
            return Err(ConfigError::FrameCapacityMismatch {
                heap: heap.frame_capacity(),
                tile_volume: layout.tile_volume(),
            });
        }
        Self::build(config, layout, heap)
    }

    fn build(
        config: ParticlesConfig,
        layout: GridLayout,
        heap: SharedFrameHeap,
    ) -> Result<Self, ConfigError> {
        let workers = config.resolved_worker_count();
        let buffer = Arc::new(ParticlesBuffer::new(layout, heap, config.exchange_capacity));
        let pool = WorkerPool::spawn(&buffer, workers)?;
        log::info!(
            "particles: {:?} grid {:?} supercells of {} cells, {} frames, {} workers",
            layout.dim(),
            layout.extent(),
            layout.tile_volume(),
            buffer.heap().capacity(),
            workers
        );
        Ok(Self {
            buffer,
            pool,
            guard: config.guard,
        })
    }

    /// Grid geometry.
    pub fn layout(&self) -> &GridLayout {
        self.buffer.layout()
    }

    /// The shared buffer.
    pub fn buffer(&self) -> &Arc<ParticlesBuffer> {
        &self.buffer
    }

    /// Worker threads in the pool.
    pub fn worker_count(&self) -> usize {
        self.pool.len()
    }

    /// View for kernels.
    pub fn device_box(&self) -> ParticleBox {
        self.buffer.device_box()
    }

    /// View for host readback.
    pub fn host_box(&self, memory_offset: i64) -> ParticleBox {
        self.buffer.host_box(memory_offset)
    }

    /// Heap counters.
    pub fn heap_stats(&self) -> HeapStats {
        self.buffer.heap_stats()
    }

    /// Sum of the live counts of every supercell.
    pub fn total_particles(&self) -> u64 {
        self.buffer.total_particles()
    }

    /// Whether a heap exhaustion has poisoned the buffer.
    pub fn is_poisoned(&self) -> bool {
        self.buffer.is_poisoned()
    }

    /// Guard policy of `direction`.
    pub fn guard_policy(&self, direction: ExchangeType) -> GuardPolicy {
        self.guard.get(direction)
    }

    /// Run `f` with exclusive access to the exchange buffer of `direction`,
    /// e.g. for `sync_to_host` / `receive_host`.
    ///
    /// # Panics
    ///
    /// Panics if `direction` is not valid for the grid.
    pub fn with_exchange<R>(
        &self,
        direction: ExchangeType,
        f: impl FnOnce(&mut ExchangeBuffer) -> R,
    ) -> R {
        f(&mut self.buffer.exchange(direction))
    }

    // ── Dispatch ───────────────────────────────────────────────────

    /// Relocate out-of-place particles of `area` into their neighbours,
    /// using stride-3 passes.
    pub fn shift_particles(&self, area: AreaMask) -> Event {
        self.shift_particles_with(&StrideAreaMapperFactory::new(area))
    }

    /// Relocate out-of-place particles over the passes of `factory`.
    ///
    /// # Panics
    ///
    /// Panics if the mapper's stride is below 3: supercells of one pass
    /// would share neighbours.
    ///
    /// The stride is what the mapper reports. A mapper that reports 3 but
    /// puts neighbouring supercells into one pass races on their shared
    /// neighbours. Debug builds check every pass and panic on such a pair;
    /// release builds trust the mapper.
    pub fn shift_particles_with<F: MapperFactory>(&self, factory: &F) -> Event {
        let mapper = factory.build(self.layout());
        let stride = mapper.stride();
        assert!(
            stride >= 3,
            "shift needs a mapper stride of at least 3, got {stride}"
        );
        let passes = collect_passes(mapper);
        #[cfg(debug_assertions)]
        if let Some((p, a, b)) = find_close_pair(&passes, 3) {
            panic!("shift pass {p} holds {a} and {b}, closer than 3 supercells");
        }
        self.dispatch(Plan::Passes {
            kernel: SupercellKernel::Shift,
            passes,
        })
    }

    /// Compact the frames of every supercell.
    pub fn fill_all_gaps(&self) -> Event {
        self.fill_gaps(AreaMask::ALL)
    }

    /// Compact the frames of the border supercells.
    pub fn fill_border_gaps(&self) -> Event {
        self.fill_gaps(AreaMask::BORDER)
    }

    /// Compact the frames of every supercell of `area`.
    pub fn fill_gaps(&self, area: AreaMask) -> Event {
        self.dispatch(Plan::Passes {
            kernel: SupercellKernel::FillGaps,
            passes: collect_passes(AreaMapperFactory::new(area).build(self.layout())),
        })
    }

    /// Discard every particle in the guard supercells of `direction`.
    pub fn delete_guard_particles(&self, direction: ExchangeType) -> Event {
        let cells = self.layout().guard_range(direction).iter().collect();
        self.dispatch(Plan::Passes {
            kernel: SupercellKernel::Delete,
            passes: vec![cells],
        })
    }

    /// Discard every particle in `area`.
    pub fn delete_particles_in_area(&self, area: AreaMask) -> Event {
        self.dispatch(Plan::Passes {
            kernel: SupercellKernel::Delete,
            passes: collect_passes(AreaMapperFactory::new(area).build(self.layout())),
        })
    }

    /// Move the guard particles of `direction` into its exchange buffer.
    ///
    /// The live count of every processed supercell is zeroed; run
    /// [`fill_all_gaps`](Self::fill_all_gaps) afterwards for exact counts. If
    /// the buffer fills up the report's `particles_remaining` is non-zero and
    /// the call can be repeated after transport.
    pub fn copy_guard_to_exchange(&self, direction: ExchangeType) -> Event {
        let cells = self.layout().guard_range(direction).iter().collect();
        self.dispatch(Plan::Passes {
            kernel: SupercellKernel::CopyGuard(direction),
            passes: vec![cells],
        })
    }

    /// Apply the configured guard policy of `direction`: copy its guard
    /// particles out ([`GuardPolicy::Exchange`]) or discard them
    /// ([`GuardPolicy::Delete`]).
    ///
    /// # Panics
    ///
    /// Panics if `direction` is not valid for the grid.
    pub fn handle_guard(&self, direction: ExchangeType) -> Event {
        assert!(
            direction.is_valid_for(self.layout().dim()),
            "exchange {direction} invalid for {:?} grid",
            self.layout().dim()
        );
        match self.guard.get(direction) {
            GuardPolicy::Exchange => self.copy_guard_to_exchange(direction),
            GuardPolicy::Delete => self.delete_guard_particles(direction),
        }
    }

    /// Append the incoming stage of `direction`'s exchange buffer into the
    /// border supercells on that side, then leave the stage empty.
    ///
    /// # Panics
    ///
    /// Panics if `direction` is not valid for the grid.
    pub fn insert_particles(&self, direction: ExchangeType) -> Event {
        assert!(
            direction.is_valid_for(self.layout().dim()),
            "exchange {direction} invalid for {:?} grid",
            self.layout().dim()
        );
        self.dispatch(Plan::Insert(direction))
    }

    /// Return every supercell to empty, every frame to the heap, clear the
    /// exchange buffers and the poison flag.
    ///
    /// # Panics
    ///
    /// Panics if an event is outstanding.
    pub fn reset(&self, step: u64) {
        assert!(
            !self.buffer.is_in_flight(),
            "reset while a dispatch is outstanding"
        );
        let freed = self.buffer.reset();
        log::info!("particles reset at step {step}: {freed} frames returned");
    }

    fn dispatch(&self, plan: Plan) -> Event {
        match self.pool.sender() {
            Some(tasks) => {
                Dispatcher::new(tasks, self.pool.len(), Arc::clone(&self.buffer)).submit(plan)
            }
            None => Event::ready(Err(ParticleError::WorkerLost)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haloframe_core::{Particle, SupercellCoord};
    use haloframe_grid::GridConfig;
    use haloframe_heap::HeapConfig;

    fn base() -> ParticlesBase {
        let config = ParticlesConfig::new(GridConfig::new_2d([2, 2], [3, 3]))
            .with_heap(HeapConfig::new(64))
            .with_workers(2);
        ParticlesBase::new(config).unwrap()
    }

    #[test]
    fn construction_spawns_workers() {
        let b = base();
        assert_eq!(b.worker_count(), 2);
        assert_eq!(b.layout().supercell_count(), 25);
        assert_eq!(b.total_particles(), 0);
    }

    #[test]
    fn mismatched_heap_rejected() {
        let config = ParticlesConfig::new(GridConfig::new_2d([2, 2], [3, 3]));
        let heap = FrameHeap::new(&HeapConfig::new(4), 8).unwrap().into_shared();
        assert_eq!(
            ParticlesBase::with_heap(config, heap).err(),
            Some(ConfigError::FrameCapacityMismatch {
                heap: 8,
                tile_volume: 4
            })
        );
    }

    #[test]
    fn fill_gaps_reports_supercells() {
        let b = base();
        let report = b.fill_all_gaps().wait().unwrap();
        assert_eq!(report.supercells, 25);
        assert_eq!(report.passes, 1);
        let report = b.fill_border_gaps().wait().unwrap();
        assert_eq!(report.supercells, 8);
    }

    #[test]
    fn dropping_event_waits() {
        let b = base();
        let c = SupercellCoord::new(2, 2, 0);
        b.device_box().append(c, Particle::new(1, [2.5, 0.5, 0.0])).unwrap();
        drop(b.shift_particles(AreaMask::ALL));
        assert_eq!(b.device_box().particle_count(SupercellCoord::new(3, 2, 0)), 1);
    }

    #[test]
    #[should_panic(expected = "previous event is still outstanding")]
    fn overlapping_dispatch_panics() {
        let b = base();
        let _first = b.fill_all_gaps();
        let _second = b.fill_all_gaps();
    }

    #[test]
    #[should_panic(expected = "stride of at least 3")]
    fn unit_stride_shift_panics() {
        let b = base();
        let _ = b.shift_particles_with(&AreaMapperFactory::new(AreaMask::ALL));
    }

    /// Claims stride 3 but packs two neighbours into one pass.
    struct CrowdedFactory;

    struct CrowdedMapper;

    impl SupercellMapper for CrowdedMapper {
        fn stride(&self) -> u32 {
            3
        }

        fn pass_count(&self) -> u32 {
            1
        }

        fn current_pass(&self) -> Vec<SupercellCoord> {
            vec![SupercellCoord::new(1, 1, 0), SupercellCoord::new(2, 1, 0)]
        }

        fn next(&mut self) -> bool {
            false
        }
    }

    impl MapperFactory for CrowdedFactory {
        type Mapper = CrowdedMapper;

        fn build(&self, _layout: &GridLayout) -> CrowdedMapper {
            CrowdedMapper
        }
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "closer than 3 supercells")]
    fn crowded_shift_pass_panics() {
        let b = base();
        let _ = b.shift_particles_with(&CrowdedFactory);
    }

    #[test]
    fn with_exchange_gives_mutable_access() {
        let b = base();
        let len = b.with_exchange(ExchangeType::TOP, |ex| {
            ex.receive_host(Vec::new());
            ex.host_incoming_len()
        });
        assert_eq!(len, 0);
    }
}
