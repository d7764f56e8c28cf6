use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_db::{DbError, OrderItemRow, OrderRow};

use crate::middleware::RequestId;

use super::{
    cart_owner_from_headers, map_db_error, normalize_limit, normalize_offset, ActionResponse,
    ApiError, ApiResponse, AppState, ResponseMeta,
};

const PAYMENT_STATUSES: [&str; 3] = ["pending", "paid", "refunded"];
const ORDER_STATUSES: [&str; 5] = ["placed", "processing", "shipped", "delivered", "cancelled"];

#[derive(Debug, Serialize)]
pub(super) struct OrderView {
    pub id: i64,
    pub order_number: String,
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
}

impl From<OrderRow> for OrderView {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            order_number: row.order_number,
            payment_status: row.payment_status,
            order_status: row.order_status,
            delivery_total_with_vat: row.delivery_total_with_vat,
            delivery_total_without_vat: row.delivery_total_without_vat,
            collection_total_with_vat: row.collection_total_with_vat,
            collection_total_without_vat: row.collection_total_without_vat,
            sub_total_with_vat: row.sub_total_with_vat,
            sub_total_without_vat: row.sub_total_without_vat,
            delivery_charge: row.delivery_charge,
            vat: row.vat,
            total_with_vat: row.total_with_vat,
            total_without_vat: row.total_without_vat,
            paid_at: row.paid_at,
            shipped_at: row.shipped_at,
            delivered_at: row.delivered_at,
            refunded_at: row.refunded_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct OrderItemView {
    pub id: i64,
    pub inventory_id: i64,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub fulfillment: String,
}

impl From<OrderItemRow> for OrderItemView {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            inventory_id: row.inventory_id,
            product_name: row.product_name,
            unit_price: row.unit_price,
            quantity: row.quantity,
            fulfillment: row.fulfillment,
        }
    }
}

/// Finalizes the caller's cart into an order.
pub(super) async fn checkout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> (StatusCode, Json<ActionResponse<OrderView>>) {
    let owner = match cart_owner_from_headers(&headers) {
        Ok(owner) => owner,
        Err(msg) => return ActionResponse::failed(req_id.0, StatusCode::BAD_REQUEST, msg),
    };

    let order_number = format!("ORD-{:08}", rand::random::<u32>());

    match shopfront_db::create_order_from_cart(&state.pool, &owner, &order_number, &state.pricing)
        .await
    {
        Ok(order) => {
            ActionResponse::succeeded(req_id.0, "Order placed", OrderView::from(order))
        }
        Err(DbError::NotFound) => {
            ActionResponse::failed(req_id.0, StatusCode::NOT_FOUND, "Cart not found")
        }
        Err(DbError::EmptyCart) => {
            ActionResponse::failed(req_id.0, StatusCode::CONFLICT, "Cart is empty")
        }
        Err(e) => {
            tracing::error!(error = %e, "checkout failed");
            ActionResponse::failed(
                req_id.0,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
            )
        }
    }
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct OrderListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>, ApiError> {
    let rows = shopfront_db::list_orders(
        &state.pool,
        normalize_limit(query.limit),
        normalize_offset(query.offset),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(OrderView::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct OrderDetailData {
    #[serde(flatten)]
    pub order: OrderView,
    pub items: Vec<OrderItemView>,
}

pub(super) async fn get_order(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<OrderDetailData>>, ApiError> {
    let order = shopfront_db::get_order(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "order not found"))?;

    let items = shopfront_db::list_order_items(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: OrderDetailData {
            order: OrderView::from(order),
            items: items.into_iter().map(OrderItemView::from).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderStatusRequest {
    pub payment_status: Option<String>,
    pub order_status: Option<String>,
}

pub(super) async fn update_order_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(request): Json<OrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderView>>, ApiError> {
    if let Some(status) = request.payment_status.as_deref() {
        if !PAYMENT_STATUSES.contains(&status) {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                format!("payment_status must be one of {PAYMENT_STATUSES:?}"),
            ));
        }
    }
    if let Some(status) = request.order_status.as_deref() {
        if !ORDER_STATUSES.contains(&status) {
            return Err(ApiError::new(
                req_id.0,
                "validation_error",
                format!("order_status must be one of {ORDER_STATUSES:?}"),
            ));
        }
    }

    let update = shopfront_db::OrderStatusUpdate {
        payment_status: request.payment_status.as_deref(),
        order_status: request.order_status.as_deref(),
    };

    let row = shopfront_db::update_order_status(&state.pool, id, update)
        .await
        .map_err(|e| match e {
            DbError::NotFound => ApiError::new(req_id.0.clone(), "not_found", "order not found"),
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(Json(ApiResponse {
        data: OrderView::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
