// Buffered batch accumulation logic
//
// Accumulates links for a single slot until the slot is flushed

use hcf_core::Link;

use crate::FlushBatch;

/// Links buffered for one destination, in insertion order
#[derive(Debug, Default)]
pub(crate) struct BufferedBatch {
    links: Vec<Link>,
}

impl BufferedBatch {
    pub fn add(&mut self, link: Link) {
        self.links.push(link);
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn should_flush(&self, capacity: usize) -> bool {
        self.links.len() >= capacity
    }

    pub fn finalize(self) -> FlushBatch {
        FlushBatch { links: self.links }
    }
}
