//! Database operations for carts and cart items.
//!
//! Every mutation here is one transaction: validate, apply the item change,
//! reload the cart's priced items, recompute the aggregates through
//! [`shopfront_core::compute_cart_aggregates`], and persist them onto the
//! cart row. The persisted aggregates are therefore never observably out of
//! step with the items at commit boundaries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shopfront_core::{
    compute_cart_aggregates, CartAggregates, FulfillmentType, PricedCartItem, PricingConfig,
};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A cart belongs to a signed-in user or an anonymous session, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    User(Uuid),
    Session(String),
}

/// A row from the `carts` table, including the persisted aggregates.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartRow {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub delivery_total_with_vat: Decimal,
    pub delivery_total_without_vat: Decimal,
    pub collection_total_with_vat: Decimal,
    pub collection_total_without_vat: Decimal,
    pub sub_total_with_vat: Decimal,
    pub sub_total_without_vat: Decimal,
    pub delivery_charge: Decimal,
    pub vat: Decimal,
    pub total_with_vat: Decimal,
    pub total_without_vat: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart item joined with its product's display name and pricing fields —
/// everything the calculator and the storefront cart view need.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CartItemDetailRow {
    pub id: i64,
    pub public_id: Uuid,
    pub inventory_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i32,
    pub fulfillment: String,
    pub retail_price: Option<Decimal>,
    pub promotional_price: Option<Decimal>,
}

impl CartItemDetailRow {
    /// Converts the row into a calculator input.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidFulfillment`] if the stored fulfillment
    /// string is not one of the schema-constrained values.
    pub fn priced(&self) -> Result<PricedCartItem, DbError> {
        let fulfillment = FulfillmentType::parse(&self.fulfillment)
            .ok_or_else(|| DbError::InvalidFulfillment(self.fulfillment.clone()))?;
        Ok(PricedCartItem {
            quantity: self.quantity,
            fulfillment,
            retail_price: self.retail_price,
            promotional_price: self.promotional_price,
        })
    }
}

/// A cart with its items, as returned by every cart operation.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    pub cart: CartRow,
    pub items: Vec<CartItemDetailRow>,
}

const CART_COLUMNS: &str = "id, public_id, user_id, session_id, \
    delivery_total_with_vat, delivery_total_without_vat, \
    collection_total_with_vat, collection_total_without_vat, \
    sub_total_with_vat, sub_total_without_vat, delivery_charge, vat, \
    total_with_vat, total_without_vat, created_at, updated_at";

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns the owner's cart with items, or `None` if no cart exists yet
/// (carts are created lazily on first add).
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn fetch_cart(pool: &PgPool, owner: &CartOwner) -> Result<Option<CartSnapshot>, DbError> {
    let mut conn = pool.acquire().await?;
    fetch_cart_tx(&mut conn, owner).await
}

/// Like [`fetch_cart`], but over an existing connection/transaction.
pub(crate) async fn fetch_cart_tx(
    conn: &mut PgConnection,
    owner: &CartOwner,
) -> Result<Option<CartSnapshot>, DbError> {
    let Some(cart) = find_cart(conn, owner).await? else {
        return Ok(None);
    };
    let items = fetch_items(conn, cart.id).await?;
    Ok(Some(CartSnapshot { cart, items }))
}

/// Splits an owner into its `(user_id, session_id)` column values.
pub(crate) fn find_cart_owner_columns(owner: &CartOwner) -> (Option<Uuid>, Option<&str>) {
    match owner {
        CartOwner::User(user_id) => (Some(*user_id), None),
        CartOwner::Session(session_id) => (None, Some(session_id.as_str())),
    }
}

async fn find_cart(
    conn: &mut PgConnection,
    owner: &CartOwner,
) -> Result<Option<CartRow>, DbError> {
    let query = match owner {
        CartOwner::User(_) => format!("SELECT {CART_COLUMNS} FROM carts WHERE user_id = $1"),
        CartOwner::Session(_) => format!("SELECT {CART_COLUMNS} FROM carts WHERE session_id = $1"),
    };

    let row = match owner {
        CartOwner::User(user_id) => {
            sqlx::query_as::<_, CartRow>(&query)
                .bind(user_id)
                .fetch_optional(conn)
                .await?
        }
        CartOwner::Session(session_id) => {
            sqlx::query_as::<_, CartRow>(&query)
                .bind(session_id)
                .fetch_optional(conn)
                .await?
        }
    };

    Ok(row)
}

async fn fetch_items(
    conn: &mut PgConnection,
    cart_id: i64,
) -> Result<Vec<CartItemDetailRow>, DbError> {
    let rows = sqlx::query_as::<_, CartItemDetailRow>(
        "SELECT ci.id, ci.public_id, ci.inventory_id, i.product_id, p.name AS product_name, \
                ci.quantity, ci.fulfillment, p.retail_price, p.promotional_price \
         FROM cart_items ci \
         JOIN inventory i ON i.id = ci.inventory_id \
         JOIN products p ON p.id = i.product_id \
         WHERE ci.cart_id = $1 \
         ORDER BY ci.id",
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Adds `quantity` of an inventory record to the owner's cart, creating the
/// cart lazily. Re-adding the same inventory with the same fulfillment
/// increments the existing line's quantity.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the inventory record does not exist (the
/// caller surfaces this as "Product not found"), or [`DbError::Sqlx`] on any
/// other failure; the transaction rolls back in both cases.
pub async fn add_item(
    pool: &PgPool,
    owner: &CartOwner,
    inventory_id: i64,
    quantity: i32,
    fulfillment: FulfillmentType,
    pricing: &PricingConfig,
) -> Result<CartSnapshot, DbError> {
    let mut tx = pool.begin().await?;

    let inventory_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM inventory WHERE id = $1")
        .bind(inventory_id)
        .fetch_optional(&mut *tx)
        .await?;
    if inventory_exists.is_none() {
        return Err(DbError::NotFound);
    }

    let cart_id = get_or_create_cart(&mut *tx, owner).await?;

    sqlx::query(
        "INSERT INTO cart_items (cart_id, inventory_id, quantity, fulfillment) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (cart_id, inventory_id, fulfillment) DO UPDATE SET \
             quantity   = cart_items.quantity + EXCLUDED.quantity, \
             updated_at = NOW()",
    )
    .bind(cart_id)
    .bind(inventory_id)
    .bind(quantity)
    .bind(fulfillment.as_str())
    .execute(&mut *tx)
    .await?;

    let snapshot = recompute_and_store(&mut *tx, cart_id, pricing).await?;
    tx.commit().await?;
    Ok(snapshot)
}

/// Sets the quantity of one of the owner's cart items.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the owner has no cart or the item is not
/// in it; the transaction rolls back and no totals are recomputed.
pub async fn update_item_quantity(
    pool: &PgPool,
    owner: &CartOwner,
    cart_item_id: i64,
    quantity: i32,
    pricing: &PricingConfig,
) -> Result<CartSnapshot, DbError> {
    let mut tx = pool.begin().await?;

    let cart = find_cart(&mut *tx, owner).await?.ok_or(DbError::NotFound)?;

    let updated = sqlx::query(
        "UPDATE cart_items SET quantity = $3, updated_at = NOW() \
         WHERE id = $2 AND cart_id = $1",
    )
    .bind(cart.id)
    .bind(cart_item_id)
    .bind(quantity)
    .execute(&mut *tx)
    .await?;
    if updated.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let snapshot = recompute_and_store(&mut *tx, cart.id, pricing).await?;
    tx.commit().await?;
    Ok(snapshot)
}

/// Removes one of the owner's cart items.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the owner has no cart or the item is not
/// in it; the transaction rolls back and no totals are recomputed.
pub async fn remove_item(
    pool: &PgPool,
    owner: &CartOwner,
    cart_item_id: i64,
    pricing: &PricingConfig,
) -> Result<CartSnapshot, DbError> {
    let mut tx = pool.begin().await?;

    let cart = find_cart(&mut *tx, owner).await?.ok_or(DbError::NotFound)?;

    let deleted = sqlx::query("DELETE FROM cart_items WHERE id = $2 AND cart_id = $1")
        .bind(cart.id)
        .bind(cart_item_id)
        .execute(&mut *tx)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    let snapshot = recompute_and_store(&mut *tx, cart.id, pricing).await?;
    tx.commit().await?;
    Ok(snapshot)
}

/// Finds or lazily creates the owner's cart, returning its id.
pub(crate) async fn get_or_create_cart(
    conn: &mut PgConnection,
    owner: &CartOwner,
) -> Result<i64, DbError> {
    let id: i64 = match owner {
        CartOwner::User(user_id) => {
            sqlx::query_scalar(
                "INSERT INTO carts (user_id) VALUES ($1) \
                 ON CONFLICT (user_id) WHERE user_id IS NOT NULL \
                 DO UPDATE SET updated_at = NOW() \
                 RETURNING id",
            )
            .bind(user_id)
            .fetch_one(conn)
            .await?
        }
        CartOwner::Session(session_id) => {
            sqlx::query_scalar(
                "INSERT INTO carts (session_id) VALUES ($1) \
                 ON CONFLICT (session_id) WHERE session_id IS NOT NULL \
                 DO UPDATE SET updated_at = NOW() \
                 RETURNING id",
            )
            .bind(session_id)
            .fetch_one(conn)
            .await?
        }
    };

    Ok(id)
}

/// Converts stored item rows into calculator inputs.
fn priced_items(items: &[CartItemDetailRow]) -> Result<Vec<PricedCartItem>, DbError> {
    items.iter().map(CartItemDetailRow::priced).collect()
}

/// Reloads the cart's items, recomputes the aggregates, and persists them.
/// Shared by every mutation path so the arithmetic cannot drift between them.
pub(crate) async fn recompute_and_store(
    conn: &mut PgConnection,
    cart_id: i64,
    pricing: &PricingConfig,
) -> Result<CartSnapshot, DbError> {
    let items = fetch_items(conn, cart_id).await?;
    let aggregates = compute_cart_aggregates(&priced_items(&items)?, pricing);
    let cart = store_aggregates(conn, cart_id, &aggregates).await?;
    Ok(CartSnapshot { cart, items })
}

async fn store_aggregates(
    conn: &mut PgConnection,
    cart_id: i64,
    aggregates: &CartAggregates,
) -> Result<CartRow, DbError> {
    let row = sqlx::query_as::<_, CartRow>(&format!(
        "UPDATE carts SET \
             delivery_total_with_vat      = $2, \
             delivery_total_without_vat   = $3, \
             collection_total_with_vat    = $4, \
             collection_total_without_vat = $5, \
             sub_total_with_vat           = $6, \
             sub_total_without_vat        = $7, \
             delivery_charge              = $8, \
             vat                          = $9, \
             total_with_vat               = $10, \
             total_without_vat            = $11, \
             updated_at                   = NOW() \
         WHERE id = $1 \
         RETURNING {CART_COLUMNS}"
    ))
    .bind(cart_id)
    .bind(aggregates.delivery_total_with_vat)
    .bind(aggregates.delivery_total_without_vat)
    .bind(aggregates.collection_total_with_vat)
    .bind(aggregates.collection_total_without_vat)
    .bind(aggregates.sub_total_with_vat)
    .bind(aggregates.sub_total_without_vat)
    .bind(aggregates.delivery_charge)
    .bind(aggregates.vat)
    .bind(aggregates.total_with_vat)
    .bind(aggregates.total_without_vat)
    .fetch_one(conn)
    .await?;

    Ok(row)
}
