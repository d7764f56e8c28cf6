//! Database operations for orders: checkout snapshots and the admin order
//! management surface.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use shopfront_core::PricingConfig;
use sqlx::PgPool;
use uuid::Uuid;

use crate::carts::{find_cart_owner_columns, recompute_and_store, CartOwner};
use crate::DbError;

/// A row from the `orders` table: a finalized snapshot of a cart at checkout.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: i64,
    pub public_id: Uuid,
    pub order_number: String,
    pub cart_id: i64,
    pub user_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub payment_status: String,
    pub order_status: String,
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
    pub paid_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub refunded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of an order, frozen at checkout time.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderItemRow {
    pub id: i64,
    pub order_id: i64,
    pub inventory_id: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub fulfillment: String,
}

/// Status changes for an order; `None` preserves the current value.
/// Transitions stamp the matching timeline column the first time they occur.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderStatusUpdate<'a> {
    pub payment_status: Option<&'a str>,
    pub order_status: Option<&'a str>,
}

const ORDER_COLUMNS: &str = "id, public_id, order_number, cart_id, user_id, session_id, \
    payment_status, order_status, \
    delivery_total_with_vat, delivery_total_without_vat, \
    collection_total_with_vat, collection_total_without_vat, \
    sub_total_with_vat, sub_total_without_vat, delivery_charge, vat, \
    total_with_vat, total_without_vat, \
    paid_at, shipped_at, delivered_at, refunded_at, created_at, updated_at";

/// Finalizes the owner's cart into an order.
///
/// In one transaction: snapshots the cart's aggregates and priced lines into
/// `orders`/`order_items`, then empties the cart and recomputes its
/// aggregates back to zero.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the owner has no cart,
/// [`DbError::EmptyCart`] if the cart holds no items, or [`DbError::Sqlx`]
/// on any other failure; the transaction rolls back in all cases.
pub async fn create_order_from_cart(
    pool: &PgPool,
    owner: &CartOwner,
    order_number: &str,
    pricing: &PricingConfig,
) -> Result<OrderRow, DbError> {
    let mut tx = pool.begin().await?;

    let snapshot = crate::carts::fetch_cart_tx(&mut *tx, owner)
        .await?
        .ok_or(DbError::NotFound)?;
    if snapshot.items.is_empty() {
        return Err(DbError::EmptyCart);
    }

    let (user_id, session_id) = find_cart_owner_columns(owner);

    let order = sqlx::query_as::<_, OrderRow>(&format!(
        "INSERT INTO orders \
             (order_number, cart_id, user_id, session_id, \
              delivery_total_with_vat, delivery_total_without_vat, \
              collection_total_with_vat, collection_total_without_vat, \
              sub_total_with_vat, sub_total_without_vat, delivery_charge, vat, \
              total_with_vat, total_without_vat) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order_number)
    .bind(snapshot.cart.id)
    .bind(user_id)
    .bind(session_id)
    .bind(snapshot.cart.delivery_total_with_vat)
    .bind(snapshot.cart.delivery_total_without_vat)
    .bind(snapshot.cart.collection_total_with_vat)
    .bind(snapshot.cart.collection_total_without_vat)
    .bind(snapshot.cart.sub_total_with_vat)
    .bind(snapshot.cart.sub_total_without_vat)
    .bind(snapshot.cart.delivery_charge)
    .bind(snapshot.cart.vat)
    .bind(snapshot.cart.total_with_vat)
    .bind(snapshot.cart.total_without_vat)
    .fetch_one(&mut *tx)
    .await?;

    for item in &snapshot.items {
        let unit_price = shopfront_core::PricedCartItem {
            quantity: item.quantity,
            fulfillment: shopfront_core::FulfillmentType::parse(&item.fulfillment)
                .ok_or_else(|| DbError::InvalidFulfillment(item.fulfillment.clone()))?,
            retail_price: item.retail_price,
            promotional_price: item.promotional_price,
        }
        .unit_price();

        sqlx::query(
            "INSERT INTO order_items \
                 (order_id, inventory_id, product_name, unit_price, quantity, fulfillment) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(order.id)
        .bind(item.inventory_id)
        .bind(&item.product_name)
        .bind(unit_price)
        .bind(item.quantity)
        .bind(&item.fulfillment)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(snapshot.cart.id)
        .execute(&mut *tx)
        .await?;
    recompute_and_store(&mut *tx, snapshot.cart.id, pricing).await?;

    tx.commit().await?;
    Ok(order)
}

/// Lists orders, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<OrderRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single order by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_order(pool: &PgPool, id: i64) -> Result<Option<OrderRow>, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns the frozen lines of an order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_order_items(pool: &PgPool, order_id: i64) -> Result<Vec<OrderItemRow>, DbError> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        "SELECT id, order_id, inventory_id, product_name, unit_price, quantity, fulfillment \
         FROM order_items \
         WHERE order_id = $1 \
         ORDER BY id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Applies status changes to an order, stamping timeline columns on first
/// transition (`paid` → `paid_at`, `refunded` → `refunded_at`,
/// `shipped` → `shipped_at`, `delivered` → `delivered_at`).
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such order exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_order_status(
    pool: &PgPool,
    id: i64,
    update: OrderStatusUpdate<'_>,
) -> Result<OrderRow, DbError> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders \
         SET payment_status = COALESCE($2, payment_status), \
             order_status   = COALESCE($3, order_status), \
             paid_at      = CASE WHEN $2 = 'paid'      AND paid_at      IS NULL THEN NOW() ELSE paid_at      END, \
             refunded_at  = CASE WHEN $2 = 'refunded'  AND refunded_at  IS NULL THEN NOW() ELSE refunded_at  END, \
             shipped_at   = CASE WHEN $3 = 'shipped'   AND shipped_at   IS NULL THEN NOW() ELSE shipped_at   END, \
             delivered_at = CASE WHEN $3 = 'delivered' AND delivered_at IS NULL THEN NOW() ELSE delivered_at END, \
             updated_at   = NOW() \
         WHERE id = $1 \
         RETURNING {ORDER_COLUMNS}"
    ))
    .bind(id)
    .bind(update.payment_status)
    .bind(update.order_status)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}
