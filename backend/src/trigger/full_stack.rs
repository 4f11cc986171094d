//! Full-stack watcher: releases a sku once enough of it is waiting to fill
//! a picker's hands.

use std::collections::HashMap;

use tracing::info;

use warehouse::flags::Flag;
use warehouse::order_book::OrderBook;
use warehouse::{Product, SelectionRequest, Sku};

use crate::state::SharedApp;

pub fn tick(app: &SharedApp) {
    let catalog = app.store.catalog();
    let book = app.book.lock();
    if let Some(sku) = check(&book, &catalog, &app.flags.full_stack) {
        info!(sku, "full-stack flag raised");
    }
}

/// Scans the waiting side for a sku whose count reached the product's
/// `max_per_hand`. On a hit with the flag clear, latches the flag with the
/// sku's full waiting count.
pub fn check(
    book: &OrderBook,
    catalog: &HashMap<Sku, Product>,
    flag: &Flag,
) -> Option<Sku> {
    if flag.is_raised() {
        return None;
    }

    for (sku, count) in book.waiting() {
        if count <= 0 {
            continue;
        }
        let Some(product) = catalog.get(&sku) else {
            continue;
        };
        if count < product.max_per_hand {
            continue;
        }

        if flag.try_latch(SelectionRequest::single(sku, count)) {
            return Some(sku);
        }
        return None;
    }

    None
}
