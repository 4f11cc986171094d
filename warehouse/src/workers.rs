use std::collections::BTreeSet;

use tracing::debug;

use crate::error::WarehouseError;

/// Picker roster. Worker ids are dense `1..=count`; the free set tracks who
/// can be handed a route.
#[derive(Debug)]
pub struct WorkerRoster {
    workers: i64,
    free: BTreeSet<i64>,
}

impl Default for WorkerRoster {
    fn default() -> Self {
        Self::new(1)
    }
}

impl WorkerRoster {
    pub fn new(count: i64) -> Self {
        Self {
            workers: count.max(1),
            free: (1..=count.max(1)).collect(),
        }
    }

    pub fn count(&self) -> i64 {
        self.workers
    }

    pub fn add(&mut self, count: i64) -> Result<i64, WarehouseError> {
        if count < 0 {
            return Err(WarehouseError::InvalidWorkerCount);
        }
        self.set(self.workers + count)
    }

    pub fn remove(&mut self, count: i64) -> Result<i64, WarehouseError> {
        if count < 0 {
            return Err(WarehouseError::InvalidWorkerCount);
        }
        if self.workers - count < 0 {
            return Err(WarehouseError::FireTooManyWorkers);
        }
        self.set(self.workers - count)
    }

    pub fn set(&mut self, count: i64) -> Result<i64, WarehouseError> {
        if count <= 0 {
            return Err(WarehouseError::InvalidWorkerCount);
        }
        // dismissed ids leave the free set, fresh hires join it
        self.free.retain(|&id| id <= count);
        self.free.extend(self.workers + 1..=count);
        self.workers = count;
        debug!(workers = self.workers, "roster resized");
        Ok(self.workers)
    }

    /// Marks a worker as done with their route.
    pub fn relieve(&mut self, worker_id: i64) {
        if worker_id >= 1 && worker_id <= self.workers {
            self.free.insert(worker_id);
        }
    }

    /// Claims the lowest free worker id, if any.
    pub fn call(&mut self) -> Option<i64> {
        let id = self.free.iter().next().copied()?;
        self.free.remove(&id);
        Some(id)
    }
}
