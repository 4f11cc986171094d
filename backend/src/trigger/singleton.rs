//! "Last of a kind" watcher: releases the head order's final outstanding
//! unit so a lone straggler does not wait for a whole batch.
//!
//! Reserved semantics behind the `singleton-watcher` feature; the
//! dispatcher polls its flag last regardless.

use tracing::info;

use warehouse::flags::Flag;
use warehouse::order_book::OrderBook;
use warehouse::{SelectionRequest, Sku};

use crate::state::SharedApp;

pub fn tick(app: &SharedApp) {
    let book = app.book.lock();
    if let Some(sku) = check(&book, &app.flags.singleton) {
        info!(sku, "singleton flag raised");
    }
}

/// Fires when the head FIFO order has exactly one unsatisfied sku with an
/// outstanding quantity of one.
pub fn check(book: &OrderBook, flag: &Flag) -> Option<Sku> {
    if flag.is_raised() {
        return None;
    }

    let head = book.head()?;
    if head.len() != 1 {
        return None;
    }
    let (sku, outstanding) = head.iter().next()?;
    if outstanding != 1 {
        return None;
    }

    if flag.try_latch(SelectionRequest::single(sku, 1)) {
        return Some(sku);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_only_on_a_lone_last_unit() {
        let mut book = OrderBook::new();
        let flag = Flag::default();

        book.enqueue(SelectionRequest::of([(1, 2), (2, 1)]));
        assert_eq!(check(&book, &flag), None, "two skus outstanding");

        book.acknowledge(1, 2);
        book.acknowledge(2, 1);
        book.enqueue(SelectionRequest::single(3, 1));
        assert_eq!(check(&book, &flag), Some(3));
        assert_eq!(flag.take().unwrap(), SelectionRequest::single(3, 1));
    }

    #[test]
    fn quantity_above_one_stays_quiet() {
        let mut book = OrderBook::new();
        let flag = Flag::default();

        book.enqueue(SelectionRequest::single(3, 2));
        assert_eq!(check(&book, &flag), None);
    }
}
