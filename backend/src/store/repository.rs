use async_trait::async_trait;

use warehouse::{Cell, CellId, Product, Sku};

/// Persistence behind the warehouse store. Implementations handle row
/// mapping and transactional integrity only; domain validation stays in
/// the store.
#[async_trait]
pub trait WarehouseRepository: Send + Sync {
    async fn upsert_product(&self, product: &Product) -> anyhow::Result<()>;

    /// Deletes the listed skus; returns those that existed.
    async fn delete_products(&self, skus: &[Sku]) -> anyhow::Result<Vec<Sku>>;

    async fn list_products(&self) -> anyhow::Result<Vec<Product>>;

    async fn all_cells(&self) -> anyhow::Result<Vec<Cell>>;

    async fn cells_by_sku(&self, sku: Sku) -> anyhow::Result<Vec<Cell>>;

    async fn cell_by_id(&self, cell_id: CellId) -> anyhow::Result<Option<Cell>>;

    /// Drops every cell and recreates empty ones at `coords`, atomically.
    async fn replace_layout(&self, coords: &[(i64, i64)]) -> anyhow::Result<()>;

    /// Overwrites a cell's stock. `sku = None` empties the slot.
    async fn set_stock(
        &self,
        cell_id: CellId,
        sku: Option<Sku>,
        count: i64,
    ) -> anyhow::Result<bool>;
}
