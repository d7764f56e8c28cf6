//! Offline unit tests for shopfront-db pool configuration and row types.
//! These tests do not require a live database connection.

use chrono::Utc;
use rust_decimal::Decimal;
use shopfront_core::{AppConfig, Environment};
use shopfront_db::{CartRow, CategoryRow, InventoryRow, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use uuid::Uuid;

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        catalog_path: PathBuf::from("./config/catalog.yaml"),
        vat_rate: Decimal::new(20, 2),
        delivery_fee: Decimal::new(500, 2),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

/// Compile-time smoke test: confirm that [`CategoryRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn category_row_has_expected_fields() {
    let row = CategoryRow {
        id: 11_i64,
        public_id: Uuid::new_v4(),
        name: "Gas".to_string(),
        slug: "gas".to_string(),
        level: "tertiary".to_string(),
        parent_primary_id: Some(3),
        parent_secondary_id: Some(7),
        parent_tertiary_id: None,
        image_url: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.id, 11);
    assert_eq!(row.level, "tertiary");
    assert_eq!(row.parent_primary_id, Some(3));
    assert_eq!(row.parent_secondary_id, Some(7));
    assert!(row.parent_tertiary_id.is_none());
}

/// Compile-time smoke test for [`CartRow`]: the ten persisted aggregate
/// fields are all present and decimal-typed.
#[test]
fn cart_row_carries_all_aggregate_fields() {
    let row = CartRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        user_id: None,
        session_id: Some("sess-1".to_string()),
        delivery_total_with_vat: Decimal::new(10000, 2),
        delivery_total_without_vat: Decimal::new(8333, 2),
        collection_total_with_vat: Decimal::ZERO,
        collection_total_without_vat: Decimal::ZERO,
        sub_total_with_vat: Decimal::new(10000, 2),
        sub_total_without_vat: Decimal::new(8333, 2),
        delivery_charge: Decimal::new(500, 2),
        vat: Decimal::new(1767, 2),
        total_with_vat: Decimal::new(10600, 2),
        total_without_vat: Decimal::new(8833, 2),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert!(row.user_id.is_none());
    assert_eq!(row.session_id.as_deref(), Some("sess-1"));
    assert_eq!(
        row.total_with_vat,
        row.sub_total_with_vat + row.delivery_charge + Decimal::new(100, 2)
    );
    assert_eq!(
        row.total_without_vat,
        row.sub_total_without_vat + row.delivery_charge
    );
}

/// Compile-time smoke test for [`InventoryRow`].
#[test]
fn inventory_row_has_expected_fields() {
    let row = InventoryRow {
        id: 5_i64,
        public_id: Uuid::new_v4(),
        product_id: 9_i64,
        stock_count: 14,
        held_count: 2,
        for_delivery: true,
        for_collection: false,
        collection_points: vec!["Leeds".to_string()],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.product_id, 9);
    assert_eq!(row.stock_count, 14);
    assert!(row.for_delivery);
    assert!(!row.for_collection);
    assert_eq!(row.collection_points, ["Leeds"]);
}
