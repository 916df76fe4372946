//! Guard exchange kernels: copy-out, delete and insert.

use haloframe_core::{ExchangeType, SupercellCoord};
use haloframe_heap::HeapError;

use crate::buffer::ParticlesBuffer;
use crate::exchange::ExchangeEntry;
use crate::metrics::KernelCounts;

/// Entries bound for one supercell.
pub(crate) type InsertGroup = (SupercellCoord, Vec<ExchangeEntry>);

/// Move the valid particles of guard supercell `coord` into the outgoing stage
/// of `direction`'s exchange buffer, then zero the live count.
///
/// Slots are invalidated as entries are staged. Particles that do not fit
/// stay valid in place and are counted as remaining. Frames are not
/// compacted; a later gap fill restores the exact count.
pub(crate) fn copy_guard_supercell(
    buffer: &ParticlesBuffer,
    coord: SupercellCoord,
    direction: ExchangeType,
) -> KernelCounts {
    let layout = buffer.layout();
    let heap = buffer.heap();
    let relative = layout
        .guard_range(direction)
        .relative(coord)
        .unwrap_or_else(|| panic!("supercell {coord} is not in the {direction} guard"));
    let mut counts = KernelCounts {
        supercells: 1,
        ..Default::default()
    };

    let mut header = buffer.supercells().lock(layout.index(coord));
    let mut exchange = buffer.exchange(direction);
    for id in header.frames(heap) {
        let mut frame = heap.lock(id);
        for slot in 0..frame.capacity() {
            let particle = *frame.get(slot);
            if !particle.valid {
                continue;
            }
            match exchange.push_outgoing(ExchangeEntry { particle, relative }) {
                Ok(()) => {
                    frame.invalidate(slot);
                    counts.copied += 1;
                }
                Err(_) => counts.remaining += 1,
            }
        }
    }
    header.num_particles = 0;
    counts
}

/// Discard every particle of `coord` and return its frames.
pub(crate) fn delete_supercell(buffer: &ParticlesBuffer, coord: SupercellCoord) -> KernelCounts {
    let mut header = buffer.supercells().lock(buffer.layout().index(coord));
    let (removed, frames_freed) = header.release(buffer.heap());
    KernelCounts {
        supercells: 1,
        removed,
        frames_freed,
        ..Default::default()
    }
}

/// Append each group's entries to its target supercell.
///
/// On heap exhaustion the entries not yet appended, of the failing group and
/// of every later group, go back to the incoming stage of `direction`.
pub(crate) fn insert_groups(
    buffer: &ParticlesBuffer,
    direction: ExchangeType,
    groups: Vec<InsertGroup>,
) -> Result<KernelCounts, HeapError> {
    let layout = buffer.layout();
    let heap = buffer.heap();
    let mut counts = KernelCounts::default();
    let mut groups = groups.into_iter();

    while let Some((coord, entries)) = groups.next() {
        let mut header = buffer.supercells().lock(layout.index(coord));
        for (i, entry) in entries.iter().enumerate() {
            if let Err(e) = header.append(heap, entry.particle) {
                drop(header);
                let mut exchange = buffer.exchange(direction);
                exchange.restore_incoming(entries[i..].iter().copied());
                for (_, rest) in groups {
                    exchange.restore_incoming(rest);
                }
                return Err(e);
            }
            counts.inserted += 1;
        }
        counts.supercells += 1;
    }
    Ok(counts)
}

/// Drain the incoming stage of `direction` into per-supercell groups, in
/// first-seen order.
///
/// Entries received on `direction` land in this partition's border layer on
/// that side, at the border area origin plus the entry's relative coordinate.
///
/// # Panics
///
/// Panics, before draining anything, if an entry falls outside the border
/// area.
pub(crate) fn stage_inserts(buffer: &ParticlesBuffer, direction: ExchangeType) -> Vec<InsertGroup> {
    let area = buffer.layout().border_range(direction);
    let mut exchange = buffer.exchange(direction);
    let targets: Vec<SupercellCoord> = exchange
        .incoming()
        .iter()
        .map(|entry| {
            area.absolute(entry.relative).unwrap_or_else(|| {
                panic!(
                    "exchange entry at {:?} is outside the {direction} border area {:?}..{:?}",
                    entry.relative, area.lo, area.hi
                )
            })
        })
        .collect();

    let mut groups: indexmap::IndexMap<SupercellCoord, Vec<ExchangeEntry>> = indexmap::IndexMap::new();
    for (target, entry) in targets.into_iter().zip(exchange.drain_incoming()) {
        groups.entry(target).or_default().push(entry);
    }
    groups.into_iter().collect()
}
