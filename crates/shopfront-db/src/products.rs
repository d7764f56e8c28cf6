//! Database operations for the `products` table: storefront listing/search
//! and admin CRUD.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
///
/// All price fields are VAT-inclusive. Category references are denormalized
/// per hierarchy level; a product is filed at exactly one node, with its
/// ancestors copied down for filtering convenience.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub retail_price: Option<Decimal>,
    pub promotional_price: Option<Decimal>,
    pub trade_price: Option<Decimal>,
    pub contract_price: Option<Decimal>,
    pub dimensions: Option<String>,
    pub weight_kg: Option<Decimal>,
    pub material: Option<String>,
    pub colour: Option<String>,
    pub images: Vec<String>,
    pub brand_id: Option<i64>,
    pub primary_category_id: Option<i64>,
    pub secondary_category_id: Option<i64>,
    pub tertiary_category_id: Option<i64>,
    pub quaternary_category_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storefront listing filters; all optional and combined with AND.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductListFilters<'a> {
    pub primary_id: Option<i64>,
    pub secondary_id: Option<i64>,
    pub tertiary_id: Option<i64>,
    pub quaternary_id: Option<i64>,
    pub brand_id: Option<i64>,
    /// Case-insensitive substring match over name and description.
    pub search: Option<&'a str>,
    pub limit: i64,
    pub offset: i64,
}

/// Fields for admin product creation and full update.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub retail_price: Option<Decimal>,
    pub promotional_price: Option<Decimal>,
    pub trade_price: Option<Decimal>,
    pub contract_price: Option<Decimal>,
    pub dimensions: Option<String>,
    pub weight_kg: Option<Decimal>,
    pub material: Option<String>,
    pub colour: Option<String>,
    pub images: Vec<String>,
    pub brand_id: Option<i64>,
    pub primary_category_id: Option<i64>,
    pub secondary_category_id: Option<i64>,
    pub tertiary_category_id: Option<i64>,
    pub quaternary_category_id: Option<i64>,
}

const PRODUCT_COLUMNS: &str = "id, public_id, name, description, retail_price, \
    promotional_price, trade_price, contract_price, dimensions, weight_kg, material, \
    colour, images, brand_id, primary_category_id, secondary_category_id, \
    tertiary_category_id, quaternary_category_id, created_at, updated_at";

// ---------------------------------------------------------------------------
// Storefront reads
// ---------------------------------------------------------------------------

/// Lists products matching the filters, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &PgPool,
    filters: ProductListFilters<'_>,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products \
         WHERE ($1::BIGINT IS NULL OR primary_category_id = $1) \
           AND ($2::BIGINT IS NULL OR secondary_category_id = $2) \
           AND ($3::BIGINT IS NULL OR tertiary_category_id = $3) \
           AND ($4::BIGINT IS NULL OR quaternary_category_id = $4) \
           AND ($5::BIGINT IS NULL OR brand_id = $5) \
           AND ($6::TEXT IS NULL OR name ILIKE '%' || $6 || '%' \
                OR description ILIKE '%' || $6 || '%') \
         ORDER BY name \
         LIMIT $7 OFFSET $8"
    ))
    .bind(filters.primary_id)
    .bind(filters.secondary_id)
    .bind(filters.tertiary_id)
    .bind(filters.quaternary_id)
    .bind(filters.brand_id)
    .bind(filters.search)
    .bind(filters.limit)
    .bind(filters.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Counts products matching the filters (for pagination metadata).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products(
    pool: &PgPool,
    filters: ProductListFilters<'_>,
) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) \
         FROM products \
         WHERE ($1::BIGINT IS NULL OR primary_category_id = $1) \
           AND ($2::BIGINT IS NULL OR secondary_category_id = $2) \
           AND ($3::BIGINT IS NULL OR tertiary_category_id = $3) \
           AND ($4::BIGINT IS NULL OR quaternary_category_id = $4) \
           AND ($5::BIGINT IS NULL OR brand_id = $5) \
           AND ($6::TEXT IS NULL OR name ILIKE '%' || $6 || '%' \
                OR description ILIKE '%' || $6 || '%')",
    )
    .bind(filters.primary_id)
    .bind(filters.secondary_id)
    .bind(filters.tertiary_id)
    .bind(filters.quaternary_id)
    .bind(filters.brand_id)
    .bind(filters.search)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Returns a single product by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Admin mutations
// ---------------------------------------------------------------------------

/// Creates a product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_product(pool: &PgPool, product: &NewProduct) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products \
             (name, description, retail_price, promotional_price, trade_price, contract_price, \
              dimensions, weight_kg, material, colour, images, brand_id, \
              primary_category_id, secondary_category_id, tertiary_category_id, quaternary_category_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.retail_price)
    .bind(product.promotional_price)
    .bind(product.trade_price)
    .bind(product.contract_price)
    .bind(&product.dimensions)
    .bind(product.weight_kg)
    .bind(&product.material)
    .bind(&product.colour)
    .bind(&product.images)
    .bind(product.brand_id)
    .bind(product.primary_category_id)
    .bind(product.secondary_category_id)
    .bind(product.tertiary_category_id)
    .bind(product.quaternary_category_id)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Replaces a product's editable fields.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such product exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_product(
    pool: &PgPool,
    id: i64,
    product: &NewProduct,
) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products \
         SET name = $2, description = $3, retail_price = $4, promotional_price = $5, \
             trade_price = $6, contract_price = $7, dimensions = $8, weight_kg = $9, \
             material = $10, colour = $11, images = $12, brand_id = $13, \
             primary_category_id = $14, secondary_category_id = $15, \
             tertiary_category_id = $16, quaternary_category_id = $17, \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.retail_price)
    .bind(product.promotional_price)
    .bind(product.trade_price)
    .bind(product.contract_price)
    .bind(&product.dimensions)
    .bind(product.weight_kg)
    .bind(&product.material)
    .bind(&product.colour)
    .bind(&product.images)
    .bind(product.brand_id)
    .bind(product.primary_category_id)
    .bind(product.secondary_category_id)
    .bind(product.tertiary_category_id)
    .bind(product.quaternary_category_id)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a product (inventory cascades via the schema).
///
/// Returns `true` if a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
