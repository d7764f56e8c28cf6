//! Database operations for the `inventory` table — the sellable, stock-tracked
//! unit the cart references. Carts never point at products directly.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `inventory` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InventoryRow {
    pub id: i64,
    pub public_id: Uuid,
    pub product_id: i64,
    pub stock_count: i32,
    /// Units reserved against open carts/orders.
    pub held_count: i32,
    pub for_delivery: bool,
    pub for_collection: bool,
    pub collection_points: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns every inventory record for a product (a product may be stocked at
/// several branches).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_inventory_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<InventoryRow>, DbError> {
    let rows = sqlx::query_as::<_, InventoryRow>(
        "SELECT id, public_id, product_id, stock_count, held_count, for_delivery, \
                for_collection, collection_points, created_at, updated_at \
         FROM inventory \
         WHERE product_id = $1 \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Creates an inventory record for a product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_inventory(
    pool: &PgPool,
    product_id: i64,
    stock_count: i32,
    for_delivery: bool,
    for_collection: bool,
    collection_points: &[String],
) -> Result<InventoryRow, DbError> {
    let row = sqlx::query_as::<_, InventoryRow>(
        "INSERT INTO inventory \
             (product_id, stock_count, for_delivery, for_collection, collection_points) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, public_id, product_id, stock_count, held_count, for_delivery, \
                   for_collection, collection_points, created_at, updated_at",
    )
    .bind(product_id)
    .bind(stock_count)
    .bind(for_delivery)
    .bind(for_collection)
    .bind(collection_points)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
