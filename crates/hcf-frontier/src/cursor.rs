//! Read-side progress: how many links are still wanted and which fetched
//! batches are waiting to be acknowledged.

use hcf_core::BatchId;

/// Tracks remaining links to fetch and the pending-delete set.
///
/// Only completions of operations the coordinator issued mutate this state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadCursor {
    remaining: u64,
    pending_ids: Vec<BatchId>,
    pending_links: usize,
}

impl ReadCursor {
    pub fn new(links_to_fetch: u64) -> Self {
        Self {
            remaining: links_to_fetch,
            ..Self::default()
        }
    }

    /// Record a completed fetch.
    ///
    /// An empty fetch means the slot is exhausted; debug mode allows a single
    /// fetch only. Both stop further reads.
    pub fn record_fetch_result(
        &mut self,
        batch_ids: Vec<BatchId>,
        link_count: usize,
        debug_mode: bool,
    ) {
        self.remaining = self.remaining.saturating_sub(link_count as u64);
        if link_count == 0 || debug_mode {
            self.remaining = 0;
        }
        self.pending_ids = batch_ids;
        self.pending_links = link_count;
    }

    /// Clear the pending-delete set, returning the acknowledged ids.
    pub fn record_delete_confirmed(&mut self) -> Vec<BatchId> {
        self.pending_links = 0;
        std::mem::take(&mut self.pending_ids)
    }

    /// A fetch is allowed only once the previous batches are acknowledged.
    pub fn wants_fetch(&self) -> bool {
        self.remaining > 0 && self.pending_ids.is_empty()
    }

    pub fn wants_delete(&self) -> bool {
        !self.pending_ids.is_empty()
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn pending_ids(&self) -> &[BatchId] {
        &self.pending_ids
    }

    /// Links covered by the pending-delete set
    pub fn pending_links(&self) -> usize {
        self.pending_links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<BatchId> {
        (0..n).map(|i| BatchId::from(format!("batch-{}", i))).collect()
    }

    #[test]
    fn test_fetch_blocks_until_delete_confirmed() {
        let mut cursor = ReadCursor::new(500);
        assert!(cursor.wants_fetch());
        assert!(!cursor.wants_delete());

        cursor.record_fetch_result(ids(3), 120, false);
        assert!(cursor.wants_delete());
        assert!(!cursor.wants_fetch());
        assert_eq!(cursor.remaining(), 380);

        let acked = cursor.record_delete_confirmed();
        assert_eq!(acked, ids(3));
        assert!(!cursor.wants_delete());
        assert!(cursor.wants_fetch());
        assert_eq!(cursor.pending_links(), 0);
    }

    #[test]
    fn test_partial_fetch_decrements_counter() {
        let mut cursor = ReadCursor::new(100);
        cursor.record_fetch_result(ids(2), 40, false);
        assert_eq!(cursor.remaining(), 60);
        assert_eq!(cursor.pending_ids().len(), 2);
        assert_eq!(cursor.pending_links(), 40);
    }

    #[test]
    fn test_counter_floors_at_zero() {
        let mut cursor = ReadCursor::new(10);
        cursor.record_fetch_result(ids(1), 25, false);
        assert_eq!(cursor.remaining(), 0);
        cursor.record_delete_confirmed();
        assert!(!cursor.wants_fetch());
    }

    #[test]
    fn test_empty_fetch_stops_reading() {
        let mut cursor = ReadCursor::new(1_000_000);
        cursor.record_fetch_result(Vec::new(), 0, false);
        assert_eq!(cursor.remaining(), 0);
        assert!(!cursor.wants_fetch());
        assert!(!cursor.wants_delete());
    }

    #[test]
    fn test_debug_mode_allows_single_fetch() {
        let mut cursor = ReadCursor::new(1_000);
        cursor.record_fetch_result(ids(1), 5, true);
        assert_eq!(cursor.remaining(), 0);
        assert!(cursor.wants_delete());

        cursor.record_delete_confirmed();
        assert!(!cursor.wants_fetch());
    }

    #[test]
    fn test_nothing_requested() {
        let cursor = ReadCursor::new(0);
        assert!(!cursor.wants_fetch());
        assert!(!cursor.wants_delete());
    }
}
