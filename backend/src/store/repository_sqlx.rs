use async_trait::async_trait;
use sqlx::{AnyPool, Row};
use tracing::warn;

use warehouse::{Cell, CellId, Product, Sku};

use super::repository::WarehouseRepository;

/// SQLx-backed repository. Responsible only for persistence and row
/// mapping.
pub struct SqlxWarehouseRepository {
    pool: AnyPool,
}

impl SqlxWarehouseRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl WarehouseRepository for SqlxWarehouseRepository {
    async fn upsert_product(&self, product: &Product) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO product (sku, name, time_to_select, time_to_ship, max_amount, max_per_hand, product_type)
VALUES (?, ?, ?, ?, ?, ?, ?)
ON CONFLICT(sku) DO UPDATE SET
  name = excluded.name,
  time_to_select = excluded.time_to_select,
  time_to_ship = excluded.time_to_ship,
  max_amount = excluded.max_amount,
  max_per_hand = excluded.max_per_hand,
  product_type = excluded.product_type;
"#,
        )
        .bind(product.sku)
        .bind(&product.name)
        .bind(product.time_to_select)
        .bind(product.time_to_ship)
        .bind(product.max_amount)
        .bind(product.max_per_hand)
        .bind(product.product_type.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_products(&self, skus: &[Sku]) -> anyhow::Result<Vec<Sku>> {
        let mut deleted = Vec::new();
        for &sku in skus {
            let res = sqlx::query("DELETE FROM product WHERE sku = ?;")
                .bind(sku)
                .execute(&self.pool)
                .await?;
            if res.rows_affected() > 0 {
                deleted.push(sku);
            }
        }
        Ok(deleted)
    }

    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query(
            r#"
SELECT sku, name, time_to_select, time_to_ship, max_amount, max_per_hand, product_type
FROM product;
"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            match row_to_product(&r) {
                Ok(p) => out.push(p),
                Err(e) => {
                    // poison-row resilience: skip but don't fail the listing
                    warn!(error = %e, "skipping malformed product row");
                }
            }
        }
        Ok(out)
    }

    async fn all_cells(&self) -> anyhow::Result<Vec<Cell>> {
        let rows = sqlx::query(
            r#"SELECT cell_id, x, y, product_sku, count, zone_id FROM cell;"#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_cell).collect()
    }

    async fn cells_by_sku(&self, sku: Sku) -> anyhow::Result<Vec<Cell>> {
        let rows = sqlx::query(
            r#"
SELECT cell_id, x, y, product_sku, count, zone_id
FROM cell
WHERE product_sku = ?;
"#,
        )
        .bind(sku)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_cell).collect()
    }

    async fn cell_by_id(&self, cell_id: CellId) -> anyhow::Result<Option<Cell>> {
        let row = sqlx::query(
            r#"
SELECT cell_id, x, y, product_sku, count, zone_id
FROM cell
WHERE cell_id = ?;
"#,
        )
        .bind(cell_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_cell).transpose()
    }

    async fn replace_layout(&self, coords: &[(i64, i64)]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cell;").execute(&mut *tx).await?;

        for (idx, &(x, y)) in coords.iter().enumerate() {
            sqlx::query(
                r#"
INSERT INTO cell (cell_id, x, y, product_sku, count, zone_id)
VALUES (?, ?, ?, NULL, 0, NULL);
"#,
            )
            .bind(idx as i64 + 1)
            .bind(x)
            .bind(y)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn set_stock(
        &self,
        cell_id: CellId,
        sku: Option<Sku>,
        count: i64,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
UPDATE cell
SET product_sku = ?, count = ?
WHERE cell_id = ?;
"#,
        )
        .bind(sku)
        .bind(count.max(0))
        .bind(cell_id)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }
}

fn row_to_product(r: &sqlx::any::AnyRow) -> anyhow::Result<Product> {
    Ok(Product {
        sku: r.try_get::<i64, _>("sku")?,
        name: r.try_get::<String, _>("name")?,
        time_to_select: r.try_get::<f64, _>("time_to_select")?,
        time_to_ship: r.try_get::<f64, _>("time_to_ship")?,
        max_amount: r.try_get::<i64, _>("max_amount")?,
        max_per_hand: r.try_get::<i64, _>("max_per_hand")?,
        product_type: r.try_get::<Option<String>, _>("product_type")?,
    })
}

fn row_to_cell(r: &sqlx::any::AnyRow) -> anyhow::Result<Cell> {
    Ok(Cell {
        cell_id: r.try_get::<i64, _>("cell_id")?,
        x: r.try_get::<i64, _>("x")?,
        y: r.try_get::<i64, _>("y")?,
        sku: r.try_get::<Option<i64>, _>("product_sku")?,
        count: r.try_get::<i64, _>("count")?,
        zone_id: r.try_get::<Option<i64>, _>("zone_id")?,
    })
}
