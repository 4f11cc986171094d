use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use algorithm::Clusterizer;
use warehouse::flags::FlagSet;
use warehouse::order_book::OrderBook;
use warehouse::workers::WorkerRoster;

use crate::config::AppConfig;
use crate::outbox::Outbox;
use crate::store::WarehouseStore;

/// Shared application state. The composition root builds exactly one and
/// hands `Arc` clones to ingress, the watchers, and the dispatcher.
///
/// Locking stays flat: planning owns its inputs by value (the snapshot),
/// so only the order book, roster, and clusterizer sit behind mutexes, and
/// no path acquires two of them at once.
pub struct App {
    pub config: AppConfig,
    pub store: WarehouseStore,

    pub book: Mutex<OrderBook>,
    pub flags: FlagSet,
    pub outbox: Outbox,
    pub roster: Mutex<WorkerRoster>,
    pub clusterizer: Mutex<Clusterizer>,

    /// When the last synthetic self-test order was generated; `None` until
    /// the first `run` command.
    pub last_synthetic: Mutex<Option<Instant>>,
}

pub type SharedApp = Arc<App>;

impl App {
    pub fn new(config: AppConfig, store: WarehouseStore) -> SharedApp {
        Arc::new(Self {
            config,
            store,
            book: Mutex::new(OrderBook::new()),
            flags: FlagSet::default(),
            outbox: Outbox::new(),
            roster: Mutex::new(WorkerRoster::default()),
            clusterizer: Mutex::new(Clusterizer::new()),
            last_synthetic: Mutex::new(None),
        })
    }
}
