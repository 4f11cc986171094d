//! Deadline watcher: releases a sku once its oldest promise is close to
//! expiry.

use std::time::{Duration, Instant};

use tracing::info;

use warehouse::flags::Flag;
use warehouse::order_book::OrderBook;
use warehouse::{SelectionRequest, Sku};

use crate::state::SharedApp;

/// How close a deadline must be before the watcher fires.
pub const DEADLINE_SLACK: Duration = Duration::from_secs(5);

pub fn tick(app: &SharedApp, now: Instant) {
    let mut book = app.book.lock();
    if let Some(sku) = check(&mut book, &app.flags.deadline, now) {
        info!(sku, "deadline flag raised");
    }
}

/// Scans the waiting side for a sku whose nearest deadline is within
/// [`DEADLINE_SLACK`]. On a hit with the flag clear, latches the flag with
/// the sku's full waiting count and pops the deadline it fired on.
pub fn check(book: &mut OrderBook, flag: &Flag, now: Instant) -> Option<Sku> {
    if flag.is_raised() {
        return None;
    }

    for (sku, count) in book.waiting() {
        if count <= 0 {
            continue;
        }
        let Some(deadline) = book.nearest_deadline(sku) else {
            continue;
        };
        if deadline.saturating_duration_since(now) > DEADLINE_SLACK {
            continue;
        }

        if flag.try_latch(SelectionRequest::single(sku, count)) {
            book.pop_deadline(sku);
            return Some(sku);
        }
        return None;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_inside_the_slack_window() {
        let mut book = OrderBook::new();
        let flag = Flag::default();
        let now = Instant::now();

        book.enqueue_with_deadline(SelectionRequest::single(1, 2), now + Duration::from_secs(10));

        // 10s out: quiet
        assert_eq!(check(&mut book, &flag, now), None);
        assert!(!flag.is_raised());

        // 4s out: fires with the full waiting count, deadline consumed
        let later = now + Duration::from_secs(6);
        assert_eq!(check(&mut book, &flag, later), Some(1));
        assert_eq!(flag.take().unwrap(), SelectionRequest::single(1, 2));
        assert_eq!(book.nearest_deadline(1), None);
    }

    #[test]
    fn overdue_deadlines_also_fire() {
        let mut book = OrderBook::new();
        let flag = Flag::default();
        let now = Instant::now();

        book.enqueue_with_deadline(SelectionRequest::single(4, 1), now);
        assert_eq!(check(&mut book, &flag, now + Duration::from_secs(60)), Some(4));
    }

    #[test]
    fn raised_flag_blocks_and_keeps_the_deadline() {
        let mut book = OrderBook::new();
        let flag = Flag::default();
        let now = Instant::now();

        flag.try_latch(SelectionRequest::single(9, 1));
        book.enqueue_with_deadline(SelectionRequest::single(1, 2), now);

        assert_eq!(check(&mut book, &flag, now), None);
        assert!(book.nearest_deadline(1).is_some(), "deadline not consumed");
    }

    #[test]
    fn zero_count_entries_are_skipped() {
        let mut book = OrderBook::new();
        let flag = Flag::default();
        let now = Instant::now();

        book.enqueue_with_deadline(SelectionRequest::single(1, 2), now);
        book.promote(&SelectionRequest::single(1, 2));

        assert_eq!(check(&mut book, &flag, now), None);
    }
}
