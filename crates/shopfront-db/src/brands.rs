//! Database operations for the `brands` table.

use chrono::{DateTime, Utc};
use shopfront_core::slugify;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `brands` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub logo_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns all active brands, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_brands(pool: &PgPool) -> Result<Vec<BrandRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandRow>(
        "SELECT id, public_id, name, slug, logo_url, is_active, created_at, updated_at \
         FROM brands \
         WHERE is_active = true \
         ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single active brand by slug, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand_by_slug(pool: &PgPool, slug: &str) -> Result<Option<BrandRow>, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "SELECT id, public_id, name, slug, logo_url, is_active, created_at, updated_at \
         FROM brands \
         WHERE slug = $1 AND is_active = true",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a brand; the slug is derived from the name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including unique slug
/// violations).
pub async fn create_brand(
    pool: &PgPool,
    name: &str,
    logo_url: Option<&str>,
) -> Result<BrandRow, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(
        "INSERT INTO brands (name, slug, logo_url, is_active) \
         VALUES ($1, $2, $3, true) \
         RETURNING id, public_id, name, slug, logo_url, is_active, created_at, updated_at",
    )
    .bind(name)
    .bind(slugify(name))
    .bind(logo_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
