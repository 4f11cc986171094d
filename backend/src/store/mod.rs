mod repository;
mod repository_sqlx;

pub use repository::WarehouseRepository;
pub use repository_sqlx::SqlxWarehouseRepository;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::RwLock;
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, info, instrument};

use common::logger::warn_if_slow;
use warehouse::{Point, Product, Sku, WarehouseError, WarehouseView};

use crate::error::AppError;

/// How the random pre-fill distributes stock across the floor.
#[derive(Clone, Copy, Debug)]
pub struct FillRules {
    /// Share of cells left empty.
    pub empty_cell_ratio: f64,

    /// Share of the stocked cells filled close to capacity.
    pub heavily_filled_ratio: f64,
}

impl Default for FillRules {
    fn default() -> Self {
        Self {
            empty_cell_ratio: 0.5,
            heavily_filled_ratio: 0.5,
        }
    }
}

/// Storage front end: repository access plus the in-memory catalog cache
/// the trigger watchers scan every tick.
pub struct WarehouseStore {
    repo: Arc<dyn WarehouseRepository>,
    catalog: RwLock<HashMap<Sku, Product>>,
}

impl WarehouseStore {
    pub fn new(repo: Arc<dyn WarehouseRepository>) -> Self {
        Self {
            repo,
            catalog: RwLock::new(HashMap::new()),
        }
    }

    /// Loads the catalog cache from storage. Called at startup and after
    /// product mutations.
    pub async fn reload_catalog(&self) -> Result<()> {
        let products = self.repo.list_products().await?;
        let mut cache = self.catalog.write();
        cache.clear();
        cache.extend(products.into_iter().map(|p| (p.sku, p)));
        Ok(())
    }

    /// Cached catalog snapshot for the watcher scans.
    pub fn catalog(&self) -> HashMap<Sku, Product> {
        self.catalog.read().clone()
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.read().len()
    }

    pub async fn upsert_product(&self, product: &Product) -> Result<()> {
        self.repo.upsert_product(product).await?;
        self.catalog
            .write()
            .insert(product.sku, product.clone());
        Ok(())
    }

    pub async fn delete_products(&self, skus: &[Sku]) -> Result<Vec<Sku>> {
        let deleted = self.repo.delete_products(skus).await?;
        let mut cache = self.catalog.write();
        for sku in &deleted {
            cache.remove(sku);
        }
        Ok(deleted)
    }

    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.repo.list_products().await
    }

    /// Captures the geometry + inventory snapshot one planning run owns.
    #[instrument(skip(self), target = "store")]
    pub async fn snapshot_view(&self, start: Point) -> Result<WarehouseView> {
        let cells = warn_if_slow("db_snapshot_cells", Duration::from_millis(200), async {
            self.repo.all_cells().await
        })
        .await
        .context("loading cells for the planning snapshot")?;
        let products = self.repo.list_products().await?;

        debug!(cells = cells.len(), products = products.len(), "view captured");
        Ok(WarehouseView::new(cells, products, start))
    }

    /// Rebuilds the floor from the boolean layout (`true` = storage cell).
    /// Returns the number of cells created.
    pub async fn build_layout(&self, layout: &[Vec<bool>]) -> Result<usize, AppError> {
        if layout.is_empty() || layout[0].is_empty() {
            return Err(WarehouseError::IllegalSize.into());
        }
        let row_len = layout[0].len();
        if layout.iter().any(|row| row.len() != row_len) {
            return Err(WarehouseError::IncompleteMap.into());
        }

        let coords: Vec<(i64, i64)> = layout
            .iter()
            .enumerate()
            .flat_map(|(x, row)| {
                row.iter()
                    .enumerate()
                    .filter(|&(_, &is_cell)| is_cell)
                    .map(move |(y, _)| (x as i64, y as i64))
            })
            .collect();

        if coords.is_empty() {
            return Err(WarehouseError::IllegalSize.into());
        }

        self.repo
            .replace_layout(&coords)
            .await
            .map_err(AppError::Internal)?;

        info!(cells = coords.len(), "warehouse rebuilt");
        Ok(coords.len())
    }

    /// Randomly stocks the floor according to `rules`: a cell stays empty
    /// with probability `empty_cell_ratio`; stocked cells draw a product
    /// uniformly, heavily filled ones land in the upper half of its
    /// capacity.
    pub async fn fill(&self, rules: &FillRules, rng: &mut impl Rng) -> Result<(), AppError> {
        let cells = self.repo.all_cells().await.map_err(AppError::Internal)?;
        if cells.is_empty() {
            return Err(WarehouseError::EmptyWarehouse.into());
        }

        let products: Vec<Product> = self.catalog.read().values().cloned().collect();
        if products.is_empty() {
            return Err(WarehouseError::EmptyListOfProducts.into());
        }

        let mut stocked = 0usize;
        for cell in &cells {
            if rng.gen_range(0.0..1.0) < rules.empty_cell_ratio {
                continue;
            }

            let product = products.choose(rng).expect("checked non-empty");
            let max = product.max_amount.max(1);
            let count = if rng.gen_range(0.0..1.0) < rules.heavily_filled_ratio {
                rng.gen_range((max / 2).max(1)..=max)
            } else {
                rng.gen_range(1..=(max / 2).max(1))
            };

            self.repo
                .set_stock(cell.cell_id, Some(product.sku), count)
                .await
                .map_err(AppError::Internal)?;
            stocked += 1;
        }

        info!(stocked, total = cells.len(), "warehouse pre-filled");
        Ok(())
    }
}
