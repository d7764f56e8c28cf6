use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shopfront_db::BrandRow;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct BrandItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
}

impl From<BrandRow> for BrandItem {
    fn from(row: BrandRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            logo_url: row.logo_url,
        }
    }
}

pub(super) async fn list_brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<BrandItem>>>, ApiError> {
    let rows = shopfront_db::list_active_brands(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(BrandItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<BrandItem>>, ApiError> {
    let row = shopfront_db::get_brand_by_slug(&state.pool, &slug)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "brand not found"))?;

    Ok(Json(ApiResponse {
        data: BrandItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateBrandRequest {
    pub name: String,
    pub logo_url: Option<String>,
}

pub(super) async fn create_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<CreateBrandRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BrandItem>>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "name must be non-empty",
        ));
    }

    let row = shopfront_db::create_brand(&state.pool, &request.name, request.logo_url.as_deref())
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: BrandItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
