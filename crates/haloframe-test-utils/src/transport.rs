//! In-process stand-in for the network between partitions.

use haloframe_core::ExchangeType;
use haloframe_particles::{ExchangeEntry, ParticlesBase};

/// Moves the outgoing entries of one partition's exchange buffer into the
/// incoming stage of its neighbour's mirrored buffer.
///
/// Particles leaving `from` through its guard on side `d` enter `to`
/// through its border on side `d.mirror()`. Passing the same partition as
/// both ends models a periodic boundary.
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    delivered: u64,
    transfers: u64,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries delivered since construction.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Calls to [`deliver`](Self::deliver) that moved at least one entry.
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    /// Ship `from`'s outgoing `direction` stage to `to`. Returns the number of
    /// entries moved. The receiving incoming stage is ready for
    /// [`insert_particles`](ParticlesBase::insert_particles) on
    /// `direction.mirror()`.
    pub fn deliver(
        &mut self,
        from: &ParticlesBase,
        to: &ParticlesBase,
        direction: ExchangeType,
    ) -> usize {
        let entries: Vec<ExchangeEntry> = from.with_exchange(direction, |ex| {
            ex.sync_to_host();
            ex.take_host()
        });
        let n = entries.len();
        to.with_exchange(direction.mirror(), |ex| {
            ex.receive_host(entries);
            ex.sync_to_device();
        });
        self.delivered += n as u64;
        if n > 0 {
            self.transfers += 1;
        }
        n
    }

    /// Full guard round for one side: copy out of `from`'s guard, deliver,
    /// insert into `to`'s border, then compact both partitions. Returns the
    /// entries moved.
    ///
    /// # Panics
    ///
    /// Panics if any dispatch fails.
    pub fn exchange(
        &mut self,
        from: &ParticlesBase,
        to: &ParticlesBase,
        direction: ExchangeType,
    ) -> usize {
        from.copy_guard_to_exchange(direction)
            .wait()
            .expect("copy guard");
        let n = self.deliver(from, to, direction);
        to.insert_particles(direction.mirror())
            .wait()
            .expect("insert");
        from.fill_all_gaps().wait().expect("fill sender");
        to.fill_all_gaps().wait().expect("fill receiver");
        n
    }
}
