use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_db::{DbError, InventoryRow, ProductRow};

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, normalize_offset, ApiError, ApiResponse, AppState, ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    pub id: i64,
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

impl From<ProductRow> for ProductItem {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            retail_price: row.retail_price,
            promotional_price: row.promotional_price,
            trade_price: row.trade_price,
            contract_price: row.contract_price,
            dimensions: row.dimensions,
            weight_kg: row.weight_kg,
            material: row.material,
            colour: row.colour,
            images: row.images,
            brand_id: row.brand_id,
            primary_category_id: row.primary_category_id,
            secondary_category_id: row.secondary_category_id,
            tertiary_category_id: row.tertiary_category_id,
            quaternary_category_id: row.quaternary_category_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub p_id: Option<i64>,
    pub s_id: Option<i64>,
    pub t_id: Option<i64>,
    pub q_id: Option<i64>,
    pub brand_id: Option<i64>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductListData {
    pub items: Vec<ProductItem>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<ApiResponse<ProductListData>>, ApiError> {
    let limit = normalize_limit(query.limit);
    let offset = normalize_offset(query.offset);
    let filters = shopfront_db::ProductListFilters {
        primary_id: query.p_id,
        secondary_id: query.s_id,
        tertiary_id: query.t_id,
        quaternary_id: query.q_id,
        brand_id: query.brand_id,
        search: query.search.as_deref(),
        limit,
        offset,
    };

    let rows = shopfront_db::list_products(&state.pool, filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let total = shopfront_db::products::count_products(&state.pool, filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductListData {
            items: rows.into_iter().map(ProductItem::from).collect(),
            total,
            limit,
            offset,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetailData {
    #[serde(flatten)]
    pub product: ProductItem,
    pub inventory: Vec<InventoryItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct InventoryItem {
    pub id: i64,
    pub stock_count: i32,
    pub held_count: i32,
    pub for_delivery: bool,
    pub for_collection: bool,
    pub collection_points: Vec<String>,
}

impl From<InventoryRow> for InventoryItem {
    fn from(row: InventoryRow) -> Self {
        Self {
            id: row.id,
            stock_count: row.stock_count,
            held_count: row.held_count,
            for_delivery: row.for_delivery,
            for_collection: row.for_collection,
            collection_points: row.collection_points,
        }
    }
}

pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetailData>>, ApiError> {
    let row = shopfront_db::get_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "product not found"))?;

    let inventory = shopfront_db::list_inventory_for_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ProductDetailData {
            product: ProductItem::from(row),
            inventory: inventory.into_iter().map(InventoryItem::from).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ProductRequest {
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
    #[serde(default)]
    pub images: Vec<String>,
    pub brand_id: Option<i64>,
    pub primary_category_id: Option<i64>,
    pub secondary_category_id: Option<i64>,
    pub tertiary_category_id: Option<i64>,
    pub quaternary_category_id: Option<i64>,
}

impl ProductRequest {
    fn validate(&self, request_id: &str) -> Result<shopfront_db::NewProduct, ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::new(
                request_id,
                "validation_error",
                "name must be non-empty",
            ));
        }
        for (field, price) in [
            ("retail_price", self.retail_price),
            ("promotional_price", self.promotional_price),
            ("trade_price", self.trade_price),
            ("contract_price", self.contract_price),
        ] {
            if price.is_some_and(|p| p < Decimal::ZERO) {
                return Err(ApiError::new(
                    request_id,
                    "validation_error",
                    format!("{field} must be non-negative"),
                ));
            }
        }

        Ok(shopfront_db::NewProduct {
            name: self.name.clone(),
            description: self.description.clone(),
            retail_price: self.retail_price,
            promotional_price: self.promotional_price,
            trade_price: self.trade_price,
            contract_price: self.contract_price,
            dimensions: self.dimensions.clone(),
            weight_kg: self.weight_kg,
            material: self.material.clone(),
            colour: self.colour.clone(),
            images: self.images.clone(),
            brand_id: self.brand_id,
            primary_category_id: self.primary_category_id,
            secondary_category_id: self.secondary_category_id,
            tertiary_category_id: self.tertiary_category_id,
            quaternary_category_id: self.quaternary_category_id,
        })
    }
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<ProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductItem>>), ApiError> {
    let new_product = request.validate(&req_id.0)?;

    let row = shopfront_db::create_product(&state.pool, &new_product)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProductItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let new_product = request.validate(&req_id.0)?;

    let row = shopfront_db::update_product(&state.pool, id, &new_product)
        .await
        .map_err(|e| match e {
            DbError::NotFound => ApiError::new(req_id.0.clone(), "not_found", "product not found"),
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(Json(ApiResponse {
        data: ProductItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = shopfront_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(req_id.0, "not_found", "product not found"))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateInventoryRequest {
    pub stock_count: i32,
    #[serde(default = "default_true")]
    pub for_delivery: bool,
    #[serde(default)]
    pub for_collection: bool,
    #[serde(default)]
    pub collection_points: Vec<String>,
}

fn default_true() -> bool {
    true
}

pub(super) async fn create_inventory(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
    Json(request): Json<CreateInventoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<InventoryItem>>), ApiError> {
    if request.stock_count < 0 {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "stock_count must be non-negative",
        ));
    }

    // The product must exist; surfacing 404 here beats a raw FK violation.
    shopfront_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "product not found"))?;

    let row = shopfront_db::create_inventory(
        &state.pool,
        product_id,
        request.stock_count,
        request.for_delivery,
        request.for_collection,
        &request.collection_points,
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: InventoryItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
