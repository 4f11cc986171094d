use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::product::Sku;
use crate::selection::SelectionRequest;

/// Every enqueued unit must be released within this window.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(10);

/// Per-sku pending demand plus the release deadlines it carries.
#[derive(Debug, Default)]
struct WaitEntry {
    count: i64,
    /// Min-heap: the earliest deadline is at the head.
    deadlines: BinaryHeap<Reverse<Instant>>,
}

/// Pending demand aggregated by sku, with the global FIFO of raw orders.
///
/// Ingress appends via `enqueue`; the trigger watchers scan read-only; the
/// dispatcher owns `promote` and the reconciliation that acknowledges picks
/// back onto the FIFO. Aggregates only grow on enqueue and shrink on
/// acknowledgement, so for every sku
/// `in_wait + in_process >= outstanding across FIFO orders`.
#[derive(Debug, Default)]
pub struct OrderBook {
    in_wait: HashMap<Sku, WaitEntry>,
    in_process: HashMap<Sku, i64>,
    fifo: VecDeque<SelectionRequest>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a client order: bumps per-sku waiting counts, stamps each sku
    /// with a fresh deadline, and appends the order to the FIFO.
    pub fn enqueue(&mut self, req: SelectionRequest) {
        self.enqueue_with_deadline(req, Instant::now() + REQUEST_DEADLINE);
    }

    /// Deadline-injecting variant used by the watcher tests.
    pub fn enqueue_with_deadline(&mut self, req: SelectionRequest, deadline: Instant) {
        if req.is_empty() {
            return;
        }
        for (sku, count) in req.iter() {
            let entry = self.in_wait.entry(sku).or_default();
            entry.count += count;
            entry.deadlines.push(Reverse(deadline));
        }
        debug!(order = ?req, fifo_len = self.fifo.len() + 1, "order enqueued");
        self.fifo.push_back(req);
    }

    /// Moves released counts from in-wait to in-process. The waiting side
    /// saturates at zero; a release can never drive it negative.
    pub fn promote(&mut self, req: &SelectionRequest) {
        for (sku, count) in req.iter() {
            if let Some(entry) = self.in_wait.get_mut(&sku) {
                entry.count = (entry.count - count).max(0);
            }
            *self.in_process.entry(sku).or_insert(0) += count;
        }
    }

    /// Settles up to `count` picked units of `sku` against the head FIFO
    /// order; the order is popped once it empties. Returns the settled
    /// quantity.
    pub fn acknowledge(&mut self, sku: Sku, count: i64) -> i64 {
        let Some(head) = self.fifo.front_mut() else {
            return 0;
        };
        let take = count.min(head.get(sku));
        if take > 0 {
            head.saturating_sub(&SelectionRequest::single(sku, take));
        }
        if head.is_empty() {
            self.fifo.pop_front();
        }
        take
    }

    /// Drains the head FIFO order by whatever is in process, decrementing
    /// the in-process side symmetrically. Zero-count waiting entries are
    /// dropped here, stale deadlines included. Returns the settled demand.
    pub fn reconcile(&mut self) -> SelectionRequest {
        let mut settled = SelectionRequest::new();

        if let Some(head) = self.fifo.front().cloned() {
            for (sku, outstanding) in head.iter() {
                let available = self.in_process.get(&sku).copied().unwrap_or(0);
                let take = outstanding.min(available);
                if take > 0 {
                    settled.add(sku, take);
                }
            }
            for (sku, take) in settled.iter() {
                self.acknowledge(sku, take);
                if let Some(left) = self.in_process.get_mut(&sku) {
                    *left -= take;
                    if *left <= 0 {
                        self.in_process.remove(&sku);
                    }
                }
            }
        }

        self.in_wait.retain(|_, entry| entry.count > 0);

        if !settled.is_empty() {
            debug!(settled = ?settled, "reconciled head order");
        }
        settled
    }

    pub fn waiting_count(&self, sku: Sku) -> i64 {
        self.in_wait.get(&sku).map(|e| e.count).unwrap_or(0)
    }

    pub fn in_process_count(&self, sku: Sku) -> i64 {
        self.in_process.get(&sku).copied().unwrap_or(0)
    }

    /// Snapshot of per-sku waiting counts, for the watcher scans.
    pub fn waiting(&self) -> Vec<(Sku, i64)> {
        self.in_wait.iter().map(|(&sku, e)| (sku, e.count)).collect()
    }

    pub fn nearest_deadline(&self, sku: Sku) -> Option<Instant> {
        self.in_wait
            .get(&sku)
            .and_then(|e| e.deadlines.peek())
            .map(|Reverse(at)| *at)
    }

    /// Consumes the nearest deadline of `sku` (the deadline watcher pops the
    /// deadline it fired on).
    pub fn pop_deadline(&mut self, sku: Sku) -> Option<Instant> {
        self.in_wait
            .get_mut(&sku)
            .and_then(|e| e.deadlines.pop())
            .map(|Reverse(at)| at)
    }

    pub fn head(&self) -> Option<&SelectionRequest> {
        self.fifo.front()
    }

    pub fn fifo_len(&self) -> usize {
        self.fifo.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// in_wait + in_process must cover the FIFO outstanding for every sku.
    fn assert_covered(book: &OrderBook) {
        let mut outstanding: HashMap<Sku, i64> = HashMap::new();
        for req in &book.fifo {
            for (sku, count) in req.iter() {
                *outstanding.entry(sku).or_insert(0) += count;
            }
        }
        for (sku, total) in outstanding {
            assert!(
                book.waiting_count(sku) + book.in_process_count(sku) >= total,
                "sku {sku}: aggregates below FIFO outstanding"
            );
        }
    }

    #[test]
    fn enqueue_accumulates_and_stamps_deadlines() {
        let mut book = OrderBook::new();
        book.enqueue(SelectionRequest::of([(1, 2), (2, 1)]));
        book.enqueue(SelectionRequest::single(1, 3));

        assert_eq!(book.waiting_count(1), 5);
        assert_eq!(book.waiting_count(2), 1);
        assert_eq!(book.fifo_len(), 2);
        assert!(book.nearest_deadline(1).is_some());
        assert_covered(&book);
    }

    #[test]
    fn nearest_deadline_is_the_earliest() {
        let mut book = OrderBook::new();
        let now = Instant::now();
        book.enqueue_with_deadline(SelectionRequest::single(1, 1), now + Duration::from_secs(20));
        book.enqueue_with_deadline(SelectionRequest::single(1, 1), now + Duration::from_secs(5));

        assert_eq!(book.nearest_deadline(1), Some(now + Duration::from_secs(5)));
        assert_eq!(book.pop_deadline(1), Some(now + Duration::from_secs(5)));
        assert_eq!(book.nearest_deadline(1), Some(now + Duration::from_secs(20)));
    }

    #[test]
    fn promote_saturates_waiting_at_zero() {
        let mut book = OrderBook::new();
        book.enqueue(SelectionRequest::single(1, 2));
        book.promote(&SelectionRequest::single(1, 5));

        assert_eq!(book.waiting_count(1), 0);
        assert_eq!(book.in_process_count(1), 5);
    }

    #[test]
    fn acknowledge_drains_and_pops_head() {
        let mut book = OrderBook::new();
        book.enqueue(SelectionRequest::of([(1, 2), (2, 1)]));
        book.enqueue(SelectionRequest::single(1, 4));

        assert_eq!(book.acknowledge(1, 2), 2);
        assert_eq!(book.fifo_len(), 2, "head still owes sku 2");
        assert_eq!(book.acknowledge(2, 3), 1, "clamped to outstanding");
        assert_eq!(book.fifo_len(), 1, "emptied head popped");
        assert_eq!(book.head().unwrap().get(1), 4);
    }

    #[test]
    fn reconcile_settles_head_against_in_process() {
        let mut book = OrderBook::new();
        book.enqueue(SelectionRequest::of([(1, 3), (2, 2)]));
        book.promote(&SelectionRequest::of([(1, 3), (2, 1)]));

        let settled = book.reconcile();
        assert_eq!(settled, SelectionRequest::of([(1, 3), (2, 1)]));
        assert_eq!(book.in_process_count(1), 0);
        assert_eq!(book.in_process_count(2), 0);
        assert_eq!(book.fifo_len(), 1, "head still owes one unit of sku 2");
        assert_eq!(book.head().unwrap().get(2), 1);
        assert_covered(&book);
    }

    #[test]
    fn enqueue_then_full_acknowledge_restores_book() {
        let mut book = OrderBook::new();
        book.enqueue(SelectionRequest::of([(1, 2), (2, 1)]));
        book.promote(&SelectionRequest::of([(1, 2), (2, 1)]));
        book.reconcile();

        assert_eq!(book.fifo_len(), 0);
        assert_eq!(book.waiting_count(1), 0);
        assert_eq!(book.in_process_count(1), 0);
        assert!(book.in_wait.is_empty(), "drained entries are dropped");
    }
}
