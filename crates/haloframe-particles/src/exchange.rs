//! Per-direction exchange buffers.
//!
//! Each neighbour direction owns one [`ExchangeBuffer`] with a send side and
//! a receive side, each split into a device and a host stage:
//!
//! ```text
//!   copy_guard_to_exchange ──► outgoing ──sync_to_host──► host out ──take_host──► transport
//!   insert_particles ◄──────── incoming ◄─sync_to_device─ host in ◄─receive_host── transport
//! ```
//!
//! The two sides never share storage, so particles received in a round are
//! not sent back by the same round. The device stages are what the kernels
//! read and write; the host stages are what the transport sees. Moving data
//! between them is always explicit.

use haloframe_core::{ExchangeType, Particle};

/// A particle in transit together with its supercell coordinate relative to
/// the origin of the exchange area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExchangeEntry {
    /// The particle, position relative to its supercell.
    pub particle: Particle,
    /// Supercell offset inside the exchange area.
    pub relative: [u32; 3],
}

#[derive(Debug, Default)]
struct Stages {
    device: Vec<ExchangeEntry>,
    host: Vec<ExchangeEntry>,
}

impl Stages {
    fn is_empty(&self) -> bool {
        self.device.is_empty() && self.host.is_empty()
    }

    fn clear(&mut self) {
        self.device.clear();
        self.host.clear();
    }
}

/// Staging storage for one neighbour direction.
#[derive(Debug)]
pub struct ExchangeBuffer {
    direction: ExchangeType,
    capacity: usize,
    send: Stages,
    recv: Stages,
}

impl ExchangeBuffer {
    /// An empty buffer whose outgoing stage accepts up to `capacity` entries
    /// from copy-out.
    pub fn new(direction: ExchangeType, capacity: usize) -> Self {
        Self {
            direction,
            capacity,
            send: Stages::default(),
            recv: Stages::default(),
        }
    }

    /// Direction this buffer serves.
    pub fn direction(&self) -> ExchangeType {
        self.direction
    }

    /// Copy-out capacity of the outgoing stage.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries staged by copy-out, not yet synced to the host.
    pub fn outgoing_len(&self) -> usize {
        self.send.device.len()
    }

    /// Entries synced to the device, waiting for insertion.
    pub fn incoming_len(&self) -> usize {
        self.recv.device.len()
    }

    /// Entries on the host waiting to be sent.
    pub fn host_outgoing_len(&self) -> usize {
        self.send.host.len()
    }

    /// Entries received on the host, not yet synced to the device.
    pub fn host_incoming_len(&self) -> usize {
        self.recv.host.len()
    }

    /// Whether every stage is empty.
    pub fn is_empty(&self) -> bool {
        self.send.is_empty() && self.recv.is_empty()
    }

    /// Whether copy-out can stage no more entries.
    pub fn is_full(&self) -> bool {
        self.send.device.len() >= self.capacity
    }

    /// Read-only view of the outgoing device stage.
    pub fn outgoing(&self) -> &[ExchangeEntry] {
        &self.send.device
    }

    /// Read-only view of the incoming device stage.
    pub fn incoming(&self) -> &[ExchangeEntry] {
        &self.recv.device
    }

    /// Stage an entry from copy-out. Hands the entry back if full.
    pub(crate) fn push_outgoing(&mut self, entry: ExchangeEntry) -> Result<(), ExchangeEntry> {
        if self.is_full() {
            return Err(entry);
        }
        self.send.device.push(entry);
        Ok(())
    }

    /// Take every incoming entry, for insertion.
    pub(crate) fn drain_incoming(&mut self) -> Vec<ExchangeEntry> {
        std::mem::take(&mut self.recv.device)
    }

    /// Put back incoming entries an insertion could not place.
    pub(crate) fn restore_incoming(&mut self, entries: impl IntoIterator<Item = ExchangeEntry>) {
        self.recv.device.extend(entries);
    }

    /// Move the outgoing stage to the end of the host send stage.
    pub fn sync_to_host(&mut self) {
        let staged = std::mem::take(&mut self.send.device);
        self.send.host.extend(staged);
    }

    /// Take the host send stage, for sending.
    pub fn take_host(&mut self) -> Vec<ExchangeEntry> {
        std::mem::take(&mut self.send.host)
    }

    /// Append entries delivered by the transport to the host receive stage.
    pub fn receive_host(&mut self, entries: impl IntoIterator<Item = ExchangeEntry>) {
        self.recv.host.extend(entries);
    }

    /// Move the host receive stage to the end of the incoming stage.
    ///
    /// Received entries are not bounded by `capacity`: the sender already
    /// bounded them.
    pub fn sync_to_device(&mut self) {
        let received = std::mem::take(&mut self.recv.host);
        self.recv.device.extend(received);
    }

    /// Drop every stage.
    pub fn clear(&mut self) {
        self.send.clear();
        self.recv.clear();
    }
}
