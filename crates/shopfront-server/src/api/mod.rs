mod brands;
mod cart;
mod categories;
mod orders;
mod products;

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use shopfront_core::PricingConfig;
use shopfront_db::CartOwner;
use sqlx::PgPool;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer};
use uuid::Uuid;

use crate::middleware::{
    enforce_rate_limit, request_id, require_admin_auth, AdminAuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub pricing: PricingConfig,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// The action envelope for cart and checkout operations: `{success, message,
/// data?}`. Failures keep the same shape with `success: false` and no data,
/// so the storefront renders both outcomes through one path.
#[derive(Debug, Serialize)]
pub struct ActionResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl<T: Serialize> ActionResponse<T> {
    pub(super) fn succeeded(
        request_id: String,
        message: impl Into<String>,
        data: T,
    ) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                message: message.into(),
                data: Some(data),
                meta: ResponseMeta::new(request_id),
            }),
        )
    }

    pub(super) fn failed(
        request_id: String,
        status: StatusCode,
        message: impl Into<String>,
    ) -> (StatusCode, Json<Self>) {
        (
            status,
            Json(Self {
                success: false,
                message: message.into(),
                data: None,
                meta: ResponseMeta::new(request_id),
            }),
        )
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn normalize_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

pub(super) fn map_db_error(request_id: String, error: &shopfront_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Resolves the cart owner from the `x-user-id` / `x-session-id` headers.
///
/// Exactly one must be present: a cart belongs to a signed-in user or an
/// anonymous session, never both.
pub(super) fn cart_owner_from_headers(headers: &HeaderMap) -> Result<CartOwner, String> {
    let user = headers.get("x-user-id").map(|v| {
        v.to_str()
            .map_err(|_| "x-user-id is not valid UTF-8".to_string())
            .and_then(|s| {
                s.parse::<Uuid>()
                    .map_err(|_| "x-user-id must be a UUID".to_string())
            })
    });
    let session = headers
        .get("x-session-id")
        .map(|v| v.to_str().map_err(|_| "x-session-id is not valid UTF-8"));

    match (user, session) {
        (Some(user), None) => Ok(CartOwner::User(user?)),
        (None, Some(session)) => {
            let session = session.map_err(ToOwned::to_owned)?;
            if session.trim().is_empty() {
                return Err("x-session-id must be non-empty".to_string());
            }
            Ok(CartOwner::Session(session.to_string()))
        }
        (None, None) => Err("provide an x-user-id or x-session-id header".to_string()),
        (Some(_), Some(_)) => {
            Err("provide exactly one of x-user-id and x-session-id, not both".to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-session-id"),
        ])
}

fn admin_router(auth: AdminAuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/products", post(products::create_product))
        .route(
            "/api/v1/admin/products/{id}",
            put(products::update_product).delete(products::delete_product),
        )
        .route(
            "/api/v1/admin/products/{id}/inventory",
            post(products::create_inventory),
        )
        .route("/api/v1/admin/categories", post(categories::create_category))
        .route(
            "/api/v1/admin/categories/{id}",
            get(categories::get_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        .route("/api/v1/admin/brands", post(brands::create_brand))
        .route("/api/v1/admin/orders", get(orders::list_orders))
        .route("/api/v1/admin/orders/{id}", get(orders::get_order))
        .route(
            "/api/v1/admin/orders/{id}/status",
            patch(orders::update_order_status),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_admin_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AdminAuthState, rate_limit: RateLimitState) -> Router {
    // Category and brand reads are heavily cached by clients; an hour of
    // staleness is the accepted trade-off for navigation data.
    let catalog_routes = Router::new()
        .route("/api/v1/categories", get(categories::list_categories))
        .route("/api/v1/brands", get(brands::list_brands))
        .route("/api/v1/brands/{slug}", get(brands::get_brand))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        ));

    let product_routes = Router::new()
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/{id}", get(products::get_product));

    // Cart state must never be served stale after a mutation.
    let cart_routes = Router::new()
        .route("/api/v1/cart", get(cart::get_cart))
        .route("/api/v1/cart/items", post(cart::add_item))
        .route(
            "/api/v1/cart/items/{item_id}",
            patch(cart::update_item_quantity).delete(cart::remove_item),
        )
        .route("/api/v1/checkout", post(orders::checkout))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .route("/api/v1/health", get(health))
        .merge(catalog_routes)
        .merge(product_routes)
        .merge(cart_routes)
        .merge(admin_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match shopfront_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state(pool: sqlx::PgPool) -> AppState {
        AppState {
            pool,
            pricing: PricingConfig::default(),
        }
    }

    fn test_app(pool: sqlx::PgPool) -> Router {
        let auth = AdminAuthState::from_env(true).expect("auth");
        build_app(test_state(pool), auth, default_rate_limit_state())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&body).expect("json parse")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-session-id", "test-session")
            .body(Body::empty())
            .expect("request")
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-session-id", "test-session")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    // -------------------------------------------------------------------------
    // Envelope and helper unit tests (no DB)
    // -------------------------------------------------------------------------

    #[test]
    fn normalize_limit_applies_defaults_and_bounds() {
        assert_eq!(normalize_limit(None), 50);
        assert_eq!(normalize_limit(Some(0)), 1);
        assert_eq!(normalize_limit(Some(1_000)), 200);
        assert_eq!(normalize_limit(Some(25)), 25);
    }

    #[test]
    fn normalize_offset_floors_at_zero() {
        assert_eq!(normalize_offset(None), 0);
        assert_eq!(normalize_offset(Some(-5)), 0);
        assert_eq!(normalize_offset(Some(40)), 40);
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn action_response_failure_omits_data() {
        let (status, Json(body)) =
            ActionResponse::<()>::failed("req-1".to_string(), StatusCode::NOT_FOUND, "Product not found");
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(json["success"], serde_json::json!(false));
        assert_eq!(json["message"], serde_json::json!("Product not found"));
        assert!(json.get("data").is_none());
    }

    #[test]
    fn cart_owner_requires_exactly_one_identity_header() {
        let mut headers = HeaderMap::new();
        assert!(cart_owner_from_headers(&headers).is_err());

        headers.insert("x-session-id", HeaderValue::from_static("sess-1"));
        assert_eq!(
            cart_owner_from_headers(&headers).expect("session owner"),
            CartOwner::Session("sess-1".to_string())
        );

        headers.insert(
            "x-user-id",
            HeaderValue::from_static("7f8bfe51-4d1a-4f2e-9c27-64f4f2d4a1a0"),
        );
        assert!(cart_owner_from_headers(&headers).is_err());

        headers.remove("x-session-id");
        assert!(matches!(
            cart_owner_from_headers(&headers).expect("user owner"),
            CartOwner::User(_)
        ));
    }

    #[test]
    fn cart_owner_rejects_malformed_user_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-user-id", HeaderValue::from_static("not-a-uuid"));
        let result = cart_owner_from_headers(&headers);
        assert!(matches!(result, Err(ref msg) if msg.contains("UUID")));
    }

    // -------------------------------------------------------------------------
    // Seed helpers for route tests (with DB)
    // -------------------------------------------------------------------------

    /// Inserts the Boilers → Combi → Gas → System Boilers chain and returns
    /// the four ids top-down.
    async fn seed_category_chain(pool: &sqlx::PgPool) -> (i64, i64, i64, i64) {
        let p: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, slug, level) \
             VALUES ('Boilers', 'boilers', 'primary') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .expect("insert primary");

        let s: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, slug, level, parent_primary_id) \
             VALUES ('Combi', 'combi', 'secondary', $1) RETURNING id",
        )
        .bind(p)
        .fetch_one(pool)
        .await
        .expect("insert secondary");

        let t: i64 = sqlx::query_scalar(
            "INSERT INTO categories (name, slug, level, parent_primary_id, parent_secondary_id) \
             VALUES ('Gas', 'gas', 'tertiary', $1, $2) RETURNING id",
        )
        .bind(p)
        .bind(s)
        .fetch_one(pool)
        .await
        .expect("insert tertiary");

        let q: i64 = sqlx::query_scalar(
            "INSERT INTO categories \
                 (name, slug, level, parent_primary_id, parent_secondary_id, parent_tertiary_id) \
             VALUES ('System Boilers', 'system-boilers', 'quaternary', $1, $2, $3) RETURNING id",
        )
        .bind(p)
        .bind(s)
        .bind(t)
        .fetch_one(pool)
        .await
        .expect("insert quaternary");

        (p, s, t, q)
    }

    /// Inserts a priced product with one inventory record and returns the
    /// inventory id.
    async fn seed_inventory(
        pool: &sqlx::PgPool,
        name: &str,
        retail: &str,
        promotional: Option<&str>,
    ) -> i64 {
        let product_id: i64 = sqlx::query_scalar(
            "INSERT INTO products (name, retail_price, promotional_price) \
             VALUES ($1, $2::numeric(10,2), $3::numeric(10,2)) RETURNING id",
        )
        .bind(name)
        .bind(retail)
        .bind(promotional)
        .fetch_one(pool)
        .await
        .expect("insert product");

        sqlx::query_scalar::<_, i64>(
            "INSERT INTO inventory (product_id, stock_count, for_delivery, for_collection) \
             VALUES ($1, 100, true, true) RETURNING id",
        )
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("insert inventory")
    }

    // -------------------------------------------------------------------------
    // Category resolution — route integration tests
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn quaternary_resolution_produces_canonical_url(pool: sqlx::PgPool) {
        let (p, s, t, q) = seed_category_chain(&pool).await;

        let app = test_app(pool);
        let response = app
            .oneshot(get_request(&format!(
                "/api/v1/categories?level=quaternary&p_id={p}&s_id={s}&t_id={t}"
            )))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["success"], serde_json::json!(true));

        let categories = json["data"]["categories"].as_array().expect("categories");
        assert_eq!(categories.len(), 1);
        assert_eq!(
            categories[0]["url"].as_str(),
            Some(
                format!(
                    "/products/c/boilers/combi/gas/system-boilers/c?p_id={p}&s_id={s}&t_id={t}&q_id={q}"
                )
                .as_str()
            )
        );

        let crumbs = categories[0]["breadcrumbs"].as_array().expect("breadcrumbs");
        let labels: Vec<&str> = crumbs
            .iter()
            .map(|c| c["label"].as_str().expect("label"))
            .collect();
        assert_eq!(labels, ["Boilers", "Combi", "Gas", "System Boilers"]);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn secondary_without_primary_id_returns_empty_not_error(pool: sqlx::PgPool) {
        seed_category_chain(&pool).await;

        let app = test_app(pool);
        let response = app
            .oneshot(get_request("/api/v1/categories?level=secondary"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["success"], serde_json::json!(true));
        assert_eq!(
            json["data"]["categories"].as_array().map(Vec::len),
            Some(0)
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn primary_resolution_includes_two_descendant_levels(pool: sqlx::PgPool) {
        seed_category_chain(&pool).await;

        let app = test_app(pool);
        let response = app
            .oneshot(get_request("/api/v1/categories?level=primary"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let categories = json["data"]["categories"].as_array().expect("categories");
        let boilers = &categories[0];
        assert_eq!(boilers["name"].as_str(), Some("Boilers"));

        let children = boilers["children"].as_array().expect("children");
        assert_eq!(children[0]["name"].as_str(), Some("Combi"));
        let grandchildren = children[0]["children"].as_array().expect("grandchildren");
        assert_eq!(grandchildren[0]["name"].as_str(), Some("Gas"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn category_reads_carry_hour_long_cache_header(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(get_request("/api/v1/categories?level=primary"))
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("public, max-age=3600")
        );
    }

    // -------------------------------------------------------------------------
    // Cart — route integration tests
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn adding_same_inventory_twice_increments_quantity(pool: sqlx::PgPool) {
        let inventory_id = seed_inventory(&pool, "Compact Combi 24kW", "50.00", None).await;

        let app = test_app(pool);
        let first = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": inventory_id,
                    "quantity": 2,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("first add");
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": inventory_id,
                    "quantity": 3,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("second add");
        assert_eq!(second.status(), StatusCode::OK);

        let json = body_json(second).await;
        assert_eq!(json["success"], serde_json::json!(true));
        let items = json["data"]["items"].as_array().expect("items");
        assert_eq!(items.len(), 1, "expected a single merged line item");
        assert_eq!(items[0]["quantity"].as_i64(), Some(5));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn add_to_cart_persists_worked_example_totals(pool: sqlx::PgPool) {
        let inventory_id = seed_inventory(&pool, "Compact Combi 24kW", "50.00", None).await;

        let app = test_app(pool);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": inventory_id,
                    "quantity": 2,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let cart = &json["data"];
        assert_eq!(cart["delivery_total_with_vat"].as_str(), Some("100.00"));
        assert_eq!(cart["delivery_charge"].as_str(), Some("5.00"));
        assert_eq!(cart["sub_total_with_vat"].as_str(), Some("100.00"));
        assert_eq!(cart["sub_total_without_vat"].as_str(), Some("83.33"));
        assert_eq!(cart["vat"].as_str(), Some("17.67"));
        assert_eq!(cart["total_with_vat"].as_str(), Some("106.00"));
        assert_eq!(cart["total_without_vat"].as_str(), Some("88.33"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn promotional_price_wins_over_retail(pool: sqlx::PgPool) {
        let inventory_id =
            seed_inventory(&pool, "Thermostatic Shower", "50.00", Some("40.00")).await;

        let app = test_app(pool);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": inventory_id,
                    "quantity": 3,
                    "fulfillment": "for_collection"
                }),
            ))
            .await
            .expect("response");

        let json = body_json(response).await;
        assert_eq!(
            json["data"]["collection_total_with_vat"].as_str(),
            Some("120.00")
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn removing_only_delivery_item_drops_delivery_charge(pool: sqlx::PgPool) {
        let delivery_inv = seed_inventory(&pool, "Radiator Valve", "25.00", None).await;
        let collection_inv = seed_inventory(&pool, "Copper Pipe Bundle", "30.00", None).await;

        let app = test_app(pool);
        let added = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": delivery_inv,
                    "quantity": 1,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("add delivery");
        let delivery_item_id = body_json(added).await["data"]["items"][0]["id"]
            .as_i64()
            .expect("item id");

        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": collection_inv,
                    "quantity": 2,
                    "fulfillment": "for_collection"
                }),
            ))
            .await
            .expect("add collection");

        let response = app
            .oneshot(json_request(
                "DELETE",
                &format!("/api/v1/cart/items/{delivery_item_id}"),
                serde_json::json!({}),
            ))
            .await
            .expect("remove");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let cart = &json["data"];
        assert_eq!(cart["delivery_charge"].as_str(), Some("0.00"));
        assert_eq!(cart["total_with_vat"].as_str(), Some("60.00"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn adding_unknown_inventory_reports_product_not_found(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": 999_999,
                    "quantity": 1,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["success"], serde_json::json!(false));
        assert_eq!(json["message"].as_str(), Some("Product not found"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn zero_quantity_is_rejected_before_any_mutation(pool: sqlx::PgPool) {
        let inventory_id = seed_inventory(&pool, "Basin Tap", "15.00", None).await;

        let app = test_app(pool.clone());
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": inventory_id,
                    "quantity": 0,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let carts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts")
            .fetch_one(&pool)
            .await
            .expect("count carts");
        assert_eq!(carts, 0, "no cart should be created for a rejected add");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn cart_responses_are_marked_no_store(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(get_request("/api/v1/cart"))
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get(header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
            Some("no-store")
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn updating_quantity_recomputes_totals(pool: sqlx::PgPool) {
        let inventory_id = seed_inventory(&pool, "Compact Combi 24kW", "50.00", None).await;

        let app = test_app(pool);
        let added = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": inventory_id,
                    "quantity": 2,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("add");
        let item_id = body_json(added).await["data"]["items"][0]["id"]
            .as_i64()
            .expect("item id");

        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/api/v1/cart/items/{item_id}"),
                serde_json::json!({ "quantity": 1 }),
            ))
            .await
            .expect("update");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["items"][0]["quantity"].as_i64(), Some(1));
        assert_eq!(json["data"]["sub_total_with_vat"].as_str(), Some("50.00"));
        assert_eq!(json["data"]["total_with_vat"].as_str(), Some("56.00"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn updating_missing_cart_item_is_not_found(pool: sqlx::PgPool) {
        let inventory_id = seed_inventory(&pool, "Basin Tap", "15.00", None).await;

        let app = test_app(pool);
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": inventory_id,
                    "quantity": 1,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("add");

        let response = app
            .oneshot(json_request(
                "PATCH",
                "/api/v1/cart/items/999999",
                serde_json::json!({ "quantity": 3 }),
            ))
            .await
            .expect("update");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["success"], serde_json::json!(false));
    }

    // -------------------------------------------------------------------------
    // Checkout — route integration tests
    // -------------------------------------------------------------------------

    #[sqlx::test(migrations = "../../migrations")]
    async fn checkout_snapshots_totals_and_empties_cart(pool: sqlx::PgPool) {
        let inventory_id = seed_inventory(&pool, "Compact Combi 24kW", "50.00", None).await;

        let app = test_app(pool);
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": inventory_id,
                    "quantity": 2,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("add");

        let checkout = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/checkout",
                serde_json::json!({}),
            ))
            .await
            .expect("checkout");
        assert_eq!(checkout.status(), StatusCode::OK);
        let json = body_json(checkout).await;
        assert_eq!(json["success"], serde_json::json!(true));
        assert_eq!(json["data"]["total_with_vat"].as_str(), Some("106.00"));
        assert!(json["data"]["order_number"]
            .as_str()
            .expect("order number")
            .starts_with("ORD-"));

        let cart = app
            .oneshot(get_request("/api/v1/cart"))
            .await
            .expect("cart after checkout");
        let json = body_json(cart).await;
        assert_eq!(json["data"]["items"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["data"]["total_with_vat"].as_str(), Some("0.00"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn admin_order_status_update_stamps_timeline(pool: sqlx::PgPool) {
        let inventory_id = seed_inventory(&pool, "Compact Combi 24kW", "50.00", None).await;

        let app = test_app(pool);
        app.clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/cart/items",
                serde_json::json!({
                    "inventory_id": inventory_id,
                    "quantity": 1,
                    "fulfillment": "for_delivery"
                }),
            ))
            .await
            .expect("add");
        let checkout = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/checkout",
                serde_json::json!({}),
            ))
            .await
            .expect("checkout");
        let order_id = body_json(checkout).await["data"]["id"]
            .as_i64()
            .expect("order id");

        let response = app
            .oneshot(json_request(
                "PATCH",
                &format!("/api/v1/admin/orders/{order_id}/status"),
                serde_json::json!({ "payment_status": "paid", "order_status": "shipped" }),
            ))
            .await
            .expect("status update");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["payment_status"].as_str(), Some("paid"));
        assert_eq!(json["data"]["order_status"].as_str(), Some("shipped"));
        assert!(!json["data"]["paid_at"].is_null());
        assert!(!json["data"]["shipped_at"].is_null());
        assert!(json["data"]["delivered_at"].is_null());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn checkout_of_empty_cart_fails(pool: sqlx::PgPool) {
        let app = test_app(pool);
        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/checkout",
                serde_json::json!({}),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["success"], serde_json::json!(false));
    }
}
