//! Domain types and pure logic for the shopfront: the category taxonomy with
//! its navigation URL/breadcrumb derivation, the cart total calculator, the
//! catalog seed file format, and application configuration.
//!
//! This crate performs no database or network I/O; everything here is either
//! a plain value type or a pure function over them, so the invariants the
//! storefront depends on (aggregate totals, URL shapes) are testable without
//! infrastructure.

use thiserror::Error;

pub mod app_config;
pub mod catalog;
pub mod categories;
pub mod config;
pub mod pricing;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_catalog, BrandSeed, CatalogFile, CategorySeed};
pub use categories::{slugify, AncestorRef, Breadcrumb, CategoryLevel, NavTarget};
pub use config::{load_app_config, load_app_config_from_env};
pub use pricing::{
    compute_cart_aggregates, CartAggregates, FulfillmentType, PricedCartItem, PricingConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingEnvVar(String),
    #[error("environment variable {var} is invalid: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read catalog file {path}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog file")]
    CatalogFileParse(#[from] serde_yaml::Error),
    #[error("{0}")]
    Validation(String),
}
