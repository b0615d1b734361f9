// hcf-batch - Per-slot write buffering
//
// Accumulates outbound links per destination slot and hands back a complete
// batch as soon as a slot reaches the configured capacity. Whatever is left
// can be drained in one go when the session goes idle.
//

use std::collections::BTreeMap;

use hcf_core::{Destination, Link};

mod buffered_batch;

use buffered_batch::BufferedBatch;

/// Links detached from the buffer and ready to be sent to one destination.
#[derive(Debug, Clone, PartialEq)]
pub struct FlushBatch {
    links: Vec<Link>,
}

impl FlushBatch {
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn into_links(self) -> Vec<Link> {
        self.links
    }
}

/// Write buffer keyed by `(frontier, slot)`.
///
/// A key is present only while its slot holds at least one link: flushed and
/// drained slots are removed from the map.
#[derive(Debug)]
pub struct WriteBuffer {
    capacity: usize,
    batches: BTreeMap<Destination, BufferedBatch>,
    pending_links: usize,
}

impl WriteBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            batches: BTreeMap::new(),
            pending_links: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a link to its destination's slot buffer.
    ///
    /// Returns the whole slot buffer, detached, once it reaches capacity.
    pub fn enqueue(&mut self, destination: Destination, link: Link) -> Option<FlushBatch> {
        // Scope the mutable borrow to avoid holding it across the remove.
        let flush_now = {
            let buffered = self.batches.entry(destination.clone()).or_default();
            buffered.add(link);
            buffered.should_flush(self.capacity)
        };
        self.pending_links += 1;

        if !flush_now {
            return None;
        }

        let batch = self.batches.remove(&destination)?;
        self.pending_links = self.pending_links.saturating_sub(batch.len());
        Some(batch.finalize())
    }

    /// Detach every non-empty slot buffer, leaving the buffer empty.
    pub fn drain_all(&mut self) -> Vec<(Destination, FlushBatch)> {
        self.pending_links = 0;
        std::mem::take(&mut self.batches)
            .into_iter()
            .filter(|(_, batch)| !batch.is_empty())
            .map(|(destination, batch)| (destination, batch.finalize()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Total number of links waiting across all destinations
    pub fn pending_links(&self) -> usize {
        self.pending_links
    }

    /// Destinations that currently hold buffered links
    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.batches.keys()
    }

    /// Number of links buffered for one destination
    pub fn buffered_for(&self, destination: &Destination) -> usize {
        self.batches.get(destination).map_or(0, BufferedBatch::len)
    }
}
