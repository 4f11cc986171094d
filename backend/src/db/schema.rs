use sqlx::AnyPool;

/// Applies the schema statements in order. Every statement is idempotent,
/// so startup re-runs are safe.
pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Catalog
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS product (
  sku BIGINT PRIMARY KEY,
  name TEXT NOT NULL,
  time_to_select DOUBLE PRECISION NOT NULL,
  time_to_ship DOUBLE PRECISION NOT NULL,
  max_amount BIGINT NOT NULL,
  max_per_hand BIGINT NOT NULL,
  product_type TEXT
);
"#,
    )
    .execute(pool)
    .await?;

    // Zones
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS zone (
  zone_id BIGINT PRIMARY KEY,
  zone_name TEXT NOT NULL,
  zone_type TEXT
);
"#,
    )
    .execute(pool)
    .await?;

    // Storage cells
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS cell (
  cell_id BIGINT PRIMARY KEY,
  x BIGINT NOT NULL,
  y BIGINT NOT NULL,
  product_sku BIGINT,
  count BIGINT NOT NULL,
  zone_id BIGINT
);
"#,
    )
    .execute(pool)
    .await?;

    // Picker roster
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS users (
  user_id BIGINT PRIMARY KEY,
  name TEXT NOT NULL,
  surname TEXT NOT NULL,
  phone_number TEXT NOT NULL UNIQUE,
  is_admin BIGINT NOT NULL,
  password TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS user_x_zone (
  user_id BIGINT NOT NULL,
  zone_id BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_cell_position ON cell(x, y);"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_cell_sku ON cell(product_sku);"#)
        .execute(pool)
        .await?;

    Ok(())
}
