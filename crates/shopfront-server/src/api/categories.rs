use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use shopfront_core::{AncestorRef, Breadcrumb, CategoryLevel, NavTarget};
use shopfront_db::{CategoryFilter, CategoryNode, CategoryRow, DbError, ResolvedCategory};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CategoryQuery {
    pub level: Option<String>,
    pub p_id: Option<i64>,
    pub s_id: Option<i64>,
    pub t_id: Option<i64>,
}

/// The resolver's `(categories, success)` contract: a persistence failure
/// degrades to an empty list with `success: false`, rendered identically to
/// "no categories found" apart from the flag.
#[derive(Debug, Serialize)]
pub(super) struct CategoryListData {
    pub success: bool,
    pub categories: Vec<CategoryItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub level: String,
    pub image_url: Option<String>,
    pub url: String,
    pub breadcrumbs: Vec<Breadcrumb>,
    pub children: Vec<CategoryChildItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryChildItem {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub url: String,
    pub children: Vec<CategoryChildItem>,
}

/// Builds the navigation target for a resolved category from its denormalized
/// ancestor chain.
fn nav_target(resolved: &ResolvedCategory) -> Option<NavTarget> {
    let level = CategoryLevel::parse(&resolved.category.level)?;
    Some(NavTarget {
        id: resolved.category.id,
        level,
        name: resolved.category.name.clone(),
        primary: resolved.primary_ancestor.clone(),
        secondary: resolved.secondary_ancestor.clone(),
        tertiary: resolved.tertiary_ancestor.clone(),
    })
}

/// Derives a child's navigation target by extending the parent's ancestor
/// chain with the parent itself.
fn child_target(parent: &NavTarget, child: &CategoryRow) -> Option<NavTarget> {
    let level = parent.level.child()?;
    let own = AncestorRef::new(parent.id, parent.name.clone());

    let (primary, secondary, tertiary) = match parent.level {
        CategoryLevel::Primary => (Some(own), None, None),
        CategoryLevel::Secondary => (parent.primary.clone(), Some(own), None),
        CategoryLevel::Tertiary => (parent.primary.clone(), parent.secondary.clone(), Some(own)),
        CategoryLevel::Quaternary => return None,
    };

    Some(NavTarget {
        id: child.id,
        level,
        name: child.name.clone(),
        primary,
        secondary,
        tertiary,
    })
}

fn child_item(parent: &NavTarget, node: &CategoryNode) -> Option<CategoryChildItem> {
    let target = child_target(parent, &node.category)?;
    let grandchildren = node
        .children
        .iter()
        .filter_map(|g| {
            let grand_target = child_target(&target, g)?;
            Some(CategoryChildItem {
                id: g.id,
                name: g.name.clone(),
                slug: g.slug.clone(),
                url: grand_target.url(),
                children: Vec::new(),
            })
        })
        .collect();

    Some(CategoryChildItem {
        id: node.category.id,
        name: node.category.name.clone(),
        slug: node.category.slug.clone(),
        url: target.url(),
        children: grandchildren,
    })
}

fn category_item(resolved: &ResolvedCategory) -> Option<CategoryItem> {
    let target = nav_target(resolved)?;
    let children = resolved
        .children
        .iter()
        .filter_map(|node| child_item(&target, node))
        .collect();

    Some(CategoryItem {
        id: resolved.category.id,
        name: resolved.category.name.clone(),
        slug: resolved.category.slug.clone(),
        level: resolved.category.level.clone(),
        image_url: resolved.category.image_url.clone(),
        url: target.url(),
        breadcrumbs: target.breadcrumbs(),
        children,
    })
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<ApiResponse<CategoryListData>>, ApiError> {
    let level = match query.level.as_deref() {
        None => CategoryLevel::Primary,
        Some(raw) => CategoryLevel::parse(raw).ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "validation_error",
                "level must be one of primary, secondary, tertiary, quaternary",
            )
        })?,
    };

    let filter = CategoryFilter {
        primary_id: query.p_id,
        secondary_id: query.s_id,
        tertiary_id: query.t_id,
    };

    let data = match shopfront_db::resolve_categories(&state.pool, level, &filter).await {
        Ok(resolved) => CategoryListData {
            success: true,
            categories: resolved.iter().filter_map(category_item).collect(),
        },
        // Degrade to an empty result so navigation never hard-fails; the
        // flag lets callers distinguish for diagnostics.
        Err(e) => {
            tracing::error!(error = %e, level = %level, "category resolution failed");
            CategoryListData {
                success: false,
                categories: Vec::new(),
            }
        }
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateCategoryRequest {
    pub name: String,
    pub level: String,
    pub p_id: Option<i64>,
    pub s_id: Option<i64>,
    pub t_id: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct AdminCategoryView {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub level: String,
    pub parent_primary_id: Option<i64>,
    pub parent_secondary_id: Option<i64>,
    pub parent_tertiary_id: Option<i64>,
    pub image_url: Option<String>,
}

impl From<CategoryRow> for AdminCategoryView {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            level: row.level,
            parent_primary_id: row.parent_primary_id,
            parent_secondary_id: row.parent_secondary_id,
            parent_tertiary_id: row.parent_tertiary_id,
            image_url: row.image_url,
        }
    }
}

/// Required ancestor ids per level, checked before touching the store.
fn validate_parent_linkage(
    level: CategoryLevel,
    filter: &CategoryFilter,
) -> Result<(), &'static str> {
    let complete = match level {
        CategoryLevel::Primary => true,
        CategoryLevel::Secondary => filter.primary_id.is_some(),
        CategoryLevel::Tertiary => filter.primary_id.is_some() && filter.secondary_id.is_some(),
        CategoryLevel::Quaternary => {
            filter.primary_id.is_some()
                && filter.secondary_id.is_some()
                && filter.tertiary_id.is_some()
        }
    };
    if complete {
        Ok(())
    } else {
        Err("missing required ancestor id(s) for this level")
    }
}

pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AdminCategoryView>>), ApiError> {
    if request.name.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "name must be non-empty",
        ));
    }
    let level = CategoryLevel::parse(&request.level).ok_or_else(|| {
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            "level must be one of primary, secondary, tertiary, quaternary",
        )
    })?;

    let filter = CategoryFilter {
        primary_id: request.p_id,
        secondary_id: request.s_id,
        tertiary_id: request.t_id,
    };
    validate_parent_linkage(level, &filter)
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;

    let row = shopfront_db::create_category(
        &state.pool,
        &request.name,
        level,
        &filter,
        request.image_url.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: AdminCategoryView::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AdminCategoryView>>, ApiError> {
    let row = shopfront_db::get_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(req_id.0.clone(), "not_found", "category not found"))?;

    Ok(Json(ApiResponse {
        data: AdminCategoryView::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<AdminCategoryView>>, ApiError> {
    let update = shopfront_db::UpdateCategory {
        name: request.name,
        image_url: request.image_url,
    };

    let row = shopfront_db::update_category(&state.pool, id, &update)
        .await
        .map_err(|e| match e {
            DbError::NotFound => ApiError::new(req_id.0.clone(), "not_found", "category not found"),
            other => map_db_error(req_id.0.clone(), &other),
        })?;

    Ok(Json(ApiResponse {
        data: AdminCategoryView::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = shopfront_db::delete_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(req_id.0, "not_found", "category not found"))
    }
}
