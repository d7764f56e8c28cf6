//! Catalog seeding: upserts brands and the four-level category tree from a
//! validated [`CatalogFile`].

use shopfront_core::{CatalogFile, CategorySeed};
use sqlx::{PgConnection, PgPool};

use crate::DbError;

/// Upsert the catalog into the database.
///
/// Returns the number of `(brands, categories)` processed. All upserts run
/// inside a single transaction; if any operation fails the entire batch is
/// rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_catalog(pool: &PgPool, catalog: &CatalogFile) -> Result<(usize, usize), DbError> {
    let mut tx = pool.begin().await?;
    let mut brand_count = 0usize;
    let mut category_count = 0usize;

    for brand in &catalog.brands {
        sqlx::query(
            "INSERT INTO brands (name, slug, logo_url, is_active) \
             VALUES ($1, $2, $3, true) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name       = EXCLUDED.name, \
                 logo_url   = EXCLUDED.logo_url, \
                 updated_at = NOW()",
        )
        .bind(&brand.name)
        .bind(brand.slug())
        .bind(&brand.logo_url)
        .execute(&mut *tx)
        .await?;
        brand_count += 1;
    }

    // The tree is at most four levels deep (validated on load), so the walk
    // is written out level by level rather than recursively.
    for primary in &catalog.categories {
        let p_id = upsert_category(&mut tx, primary, "primary", None, None, None).await?;
        category_count += 1;

        for secondary in &primary.children {
            let s_id =
                upsert_category(&mut tx, secondary, "secondary", Some(p_id), None, None).await?;
            category_count += 1;

            for tertiary in &secondary.children {
                let t_id =
                    upsert_category(&mut tx, tertiary, "tertiary", Some(p_id), Some(s_id), None)
                        .await?;
                category_count += 1;

                for quaternary in &tertiary.children {
                    upsert_category(
                        &mut tx,
                        quaternary,
                        "quaternary",
                        Some(p_id),
                        Some(s_id),
                        Some(t_id),
                    )
                    .await?;
                    category_count += 1;
                }
            }
        }
    }

    tx.commit().await?;
    Ok((brand_count, category_count))
}

async fn upsert_category(
    conn: &mut PgConnection,
    seed: &CategorySeed,
    level: &str,
    parent_primary_id: Option<i64>,
    parent_secondary_id: Option<i64>,
    parent_tertiary_id: Option<i64>,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO categories \
             (name, slug, level, parent_primary_id, parent_secondary_id, parent_tertiary_id, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (level, slug, parent_primary_id, parent_secondary_id, parent_tertiary_id) \
         DO UPDATE SET \
             name       = EXCLUDED.name, \
             image_url  = EXCLUDED.image_url, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(&seed.name)
    .bind(seed.slug())
    .bind(level)
    .bind(parent_primary_id)
    .bind(parent_secondary_id)
    .bind(parent_tertiary_id)
    .bind(&seed.image_url)
    .fetch_one(conn)
    .await?;

    Ok(id)
}
