use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_core::FulfillmentType;
use shopfront_db::{CartSnapshot, DbError};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{cart_owner_from_headers, ActionResponse, AppState, ResponseMeta};

type CartActionResult = (StatusCode, Json<ActionResponse<CartView>>);

#[derive(Debug, Serialize)]
pub(super) struct CartView {
    id: i64,
    user_id: Option<Uuid>,
    session_id: Option<String>,
    items: Vec<CartItemView>,
    delivery_total_with_vat: Decimal,
    delivery_total_without_vat: Decimal,
    collection_total_with_vat: Decimal,
    collection_total_without_vat: Decimal,
    sub_total_with_vat: Decimal,
    sub_total_without_vat: Decimal,
    delivery_charge: Decimal,
    vat: Decimal,
    total_with_vat: Decimal,
    total_without_vat: Decimal,
}

#[derive(Debug, Serialize)]
pub(super) struct CartItemView {
    id: i64,
    inventory_id: i64,
    product_id: i64,
    product_name: String,
    quantity: i32,
    fulfillment: String,
    unit_price: Decimal,
    line_total: Decimal,
}

impl CartView {
    pub(super) fn from_snapshot(snapshot: CartSnapshot) -> Self {
        let items = snapshot
            .items
            .into_iter()
            .map(|row| {
                let unit_price = row
                    .priced()
                    .map(|p| p.unit_price())
                    .unwrap_or(Decimal::ZERO);
                CartItemView {
                    id: row.id,
                    inventory_id: row.inventory_id,
                    product_id: row.product_id,
                    product_name: row.product_name,
                    quantity: row.quantity,
                    fulfillment: row.fulfillment,
                    unit_price,
                    line_total: unit_price * Decimal::from(row.quantity),
                }
            })
            .collect();

        let cart = snapshot.cart;
        Self {
            id: cart.id,
            user_id: cart.user_id,
            session_id: cart.session_id,
            items,
            delivery_total_with_vat: cart.delivery_total_with_vat,
            delivery_total_without_vat: cart.delivery_total_without_vat,
            collection_total_with_vat: cart.collection_total_with_vat,
            collection_total_without_vat: cart.collection_total_without_vat,
            sub_total_with_vat: cart.sub_total_with_vat,
            sub_total_without_vat: cart.sub_total_without_vat,
            delivery_charge: cart.delivery_charge,
            vat: cart.vat,
            total_with_vat: cart.total_with_vat,
            total_without_vat: cart.total_without_vat,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct AddItemRequest {
    pub inventory_id: i64,
    pub quantity: i32,
    pub fulfillment: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateQuantityRequest {
    pub quantity: i32,
}

/// Maps a cart-mutation error onto the action envelope. Not-found carries the
/// operation-specific message; everything else degrades to a generic failure.
fn cart_failure(request_id: String, error: &DbError, not_found_message: &str) -> CartActionResult {
    match error {
        DbError::NotFound => {
            ActionResponse::failed(request_id, StatusCode::NOT_FOUND, not_found_message)
        }
        DbError::EmptyCart => {
            ActionResponse::failed(request_id, StatusCode::CONFLICT, "Cart is empty")
        }
        other => {
            tracing::error!(error = %other, "cart operation failed");
            ActionResponse::failed(
                request_id,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong",
            )
        }
    }
}

pub(super) async fn get_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
) -> CartActionResult {
    let owner = match cart_owner_from_headers(&headers) {
        Ok(owner) => owner,
        Err(msg) => return ActionResponse::failed(req_id.0, StatusCode::BAD_REQUEST, msg),
    };

    match shopfront_db::fetch_cart(&state.pool, &owner).await {
        Ok(Some(snapshot)) => {
            ActionResponse::succeeded(req_id.0, "Cart fetched", CartView::from_snapshot(snapshot))
        }
        // No cart yet; it is created lazily on first add.
        Ok(None) => (
            StatusCode::OK,
            Json(ActionResponse {
                success: true,
                message: "Cart is empty".to_string(),
                data: None,
                meta: ResponseMeta::new(req_id.0),
            }),
        ),
        Err(e) => cart_failure(req_id.0, &e, "Cart not found"),
    }
}

pub(super) async fn add_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Json(request): Json<AddItemRequest>,
) -> CartActionResult {
    let owner = match cart_owner_from_headers(&headers) {
        Ok(owner) => owner,
        Err(msg) => return ActionResponse::failed(req_id.0, StatusCode::BAD_REQUEST, msg),
    };
    if request.quantity < 1 {
        return ActionResponse::failed(
            req_id.0,
            StatusCode::BAD_REQUEST,
            "Quantity must be at least 1",
        );
    }
    let Some(fulfillment) = FulfillmentType::parse(&request.fulfillment) else {
        return ActionResponse::failed(
            req_id.0,
            StatusCode::BAD_REQUEST,
            "Fulfillment must be for_delivery or for_collection",
        );
    };

    match shopfront_db::add_item(
        &state.pool,
        &owner,
        request.inventory_id,
        request.quantity,
        fulfillment,
        &state.pricing,
    )
    .await
    {
        Ok(snapshot) => ActionResponse::succeeded(
            req_id.0,
            "Item added to cart",
            CartView::from_snapshot(snapshot),
        ),
        Err(e) => cart_failure(req_id.0, &e, "Product not found"),
    }
}

pub(super) async fn update_item_quantity(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(item_id): Path<i64>,
    Json(request): Json<UpdateQuantityRequest>,
) -> CartActionResult {
    let owner = match cart_owner_from_headers(&headers) {
        Ok(owner) => owner,
        Err(msg) => return ActionResponse::failed(req_id.0, StatusCode::BAD_REQUEST, msg),
    };
    if request.quantity < 1 {
        return ActionResponse::failed(
            req_id.0,
            StatusCode::BAD_REQUEST,
            "Quantity must be at least 1",
        );
    }

    match shopfront_db::update_item_quantity(
        &state.pool,
        &owner,
        item_id,
        request.quantity,
        &state.pricing,
    )
    .await
    {
        Ok(snapshot) => ActionResponse::succeeded(
            req_id.0,
            "Quantity updated",
            CartView::from_snapshot(snapshot),
        ),
        Err(e) => cart_failure(req_id.0, &e, "Cart item not found"),
    }
}

pub(super) async fn remove_item(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    Path(item_id): Path<i64>,
) -> CartActionResult {
    let owner = match cart_owner_from_headers(&headers) {
        Ok(owner) => owner,
        Err(msg) => return ActionResponse::failed(req_id.0, StatusCode::BAD_REQUEST, msg),
    };

    match shopfront_db::remove_item(&state.pool, &owner, item_id, &state.pricing).await {
        Ok(snapshot) => ActionResponse::succeeded(
            req_id.0,
            "Item removed from cart",
            CartView::from_snapshot(snapshot),
        ),
        Err(e) => cart_failure(req_id.0, &e, "Cart item not found"),
    }
}
