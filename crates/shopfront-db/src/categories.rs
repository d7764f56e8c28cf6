//! Database operations for the `categories` table: level-filtered resolution
//! with attached children and ancestor chains, plus admin CRUD.

use chrono::{DateTime, Utc};
use shopfront_core::{slugify, AncestorRef, CategoryLevel};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `categories` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    /// One of `primary`/`secondary`/`tertiary`/`quaternary`; constrained by
    /// the schema.
    pub level: String,
    pub parent_primary_id: Option<i64>,
    pub parent_secondary_id: Option<i64>,
    pub parent_tertiary_id: Option<i64>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ancestor-id filter for a resolution query. Which fields are *required*
/// depends on the requested level; see [`resolve_categories`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryFilter {
    pub primary_id: Option<i64>,
    pub secondary_id: Option<i64>,
    pub tertiary_id: Option<i64>,
}

/// A direct child of a resolved category, with its own children attached when
/// the resolution requested two levels of descendants.
#[derive(Debug, Clone)]
pub struct CategoryNode {
    pub category: CategoryRow,
    pub children: Vec<CategoryRow>,
}

/// A category matched by [`resolve_categories`], with the data needed to
/// render navigation: immediate children (two levels for primaries) and the
/// named ancestor chain for URL/breadcrumb derivation.
#[derive(Debug, Clone)]
pub struct ResolvedCategory {
    pub category: CategoryRow,
    pub children: Vec<CategoryNode>,
    pub primary_ancestor: Option<AncestorRef>,
    pub secondary_ancestor: Option<AncestorRef>,
    pub tertiary_ancestor: Option<AncestorRef>,
}

/// Partial update for admin category edits; `None` preserves the current value.
#[derive(Debug, Clone, Default)]
pub struct UpdateCategory {
    pub name: Option<String>,
    pub image_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Returns `true` when the filter carries every ancestor id the level needs.
fn filter_is_complete(level: CategoryLevel, filter: &CategoryFilter) -> bool {
    match level {
        CategoryLevel::Primary => true,
        CategoryLevel::Secondary => filter.primary_id.is_some(),
        CategoryLevel::Tertiary => filter.primary_id.is_some() && filter.secondary_id.is_some(),
        CategoryLevel::Quaternary => {
            filter.primary_id.is_some()
                && filter.secondary_id.is_some()
                && filter.tertiary_id.is_some()
        }
    }
}

/// Resolves the categories of `level` matching `filter`, sorted by name, with
/// immediate children attached (two levels of descendants for primaries, to
/// feed navigation menus) and ancestor names for breadcrumb derivation.
///
/// A filter missing a required ancestor id yields an empty result rather than
/// an error — incomplete navigation state must not crash the storefront.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn resolve_categories(
    pool: &PgPool,
    level: CategoryLevel,
    filter: &CategoryFilter,
) -> Result<Vec<ResolvedCategory>, DbError> {
    if !filter_is_complete(level, filter) {
        return Ok(Vec::new());
    }

    let mut conn = pool.acquire().await?;

    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, public_id, name, slug, level, parent_primary_id, parent_secondary_id, \
                parent_tertiary_id, image_url, created_at, updated_at \
         FROM categories \
         WHERE level = $1 \
           AND ($2::BIGINT IS NULL OR parent_primary_id = $2) \
           AND ($3::BIGINT IS NULL OR parent_secondary_id = $3) \
           AND ($4::BIGINT IS NULL OR parent_tertiary_id = $4) \
         ORDER BY name",
    )
    .bind(level.as_str())
    .bind(filter.primary_id)
    .bind(filter.secondary_id)
    .bind(filter.tertiary_id)
    .fetch_all(&mut *conn)
    .await?;

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let children = fetch_children(&mut conn, level, &ids).await?;

    let grandchildren = if level == CategoryLevel::Primary && !children.is_empty() {
        let child_ids: Vec<i64> = children.iter().map(|r| r.id).collect();
        fetch_children(&mut conn, CategoryLevel::Secondary, &child_ids).await?
    } else {
        Vec::new()
    };

    let ancestors = fetch_ancestor_refs(&mut conn, &rows).await?;

    let lookup = |id: Option<i64>| -> Option<AncestorRef> {
        id.and_then(|id| ancestors.iter().find(|a| a.id == id).cloned())
    };

    let resolved = rows
        .into_iter()
        .map(|row| {
            let direct: Vec<CategoryNode> = children
                .iter()
                .filter(|c| child_links_to(level, c, row.id))
                .map(|c| CategoryNode {
                    children: grandchildren
                        .iter()
                        .filter(|g| child_links_to(CategoryLevel::Secondary, g, c.id))
                        .cloned()
                        .collect(),
                    category: c.clone(),
                })
                .collect();

            ResolvedCategory {
                primary_ancestor: lookup(row.parent_primary_id),
                secondary_ancestor: lookup(row.parent_secondary_id),
                tertiary_ancestor: lookup(row.parent_tertiary_id),
                children: direct,
                category: row,
            }
        })
        .collect();

    Ok(resolved)
}

/// True when `child` hangs directly off the category `parent_id` at
/// `parent_level`.
fn child_links_to(parent_level: CategoryLevel, child: &CategoryRow, parent_id: i64) -> bool {
    match parent_level {
        CategoryLevel::Primary => child.parent_primary_id == Some(parent_id),
        CategoryLevel::Secondary => child.parent_secondary_id == Some(parent_id),
        CategoryLevel::Tertiary => child.parent_tertiary_id == Some(parent_id),
        CategoryLevel::Quaternary => false,
    }
}

/// Fetches the direct children of the given categories at `parent_level`.
async fn fetch_children(
    conn: &mut PgConnection,
    parent_level: CategoryLevel,
    parent_ids: &[i64],
) -> Result<Vec<CategoryRow>, DbError> {
    let Some(child_level) = parent_level.child() else {
        return Ok(Vec::new());
    };

    let parent_column = match parent_level {
        CategoryLevel::Primary => "parent_primary_id",
        CategoryLevel::Secondary => "parent_secondary_id",
        CategoryLevel::Tertiary => "parent_tertiary_id",
        CategoryLevel::Quaternary => unreachable!("quaternary has no child level"),
    };

    let rows = sqlx::query_as::<_, CategoryRow>(&format!(
        "SELECT id, public_id, name, slug, level, parent_primary_id, parent_secondary_id, \
                parent_tertiary_id, image_url, created_at, updated_at \
         FROM categories \
         WHERE level = $1 AND {parent_column} = ANY($2) \
         ORDER BY name"
    ))
    .bind(child_level.as_str())
    .bind(parent_ids)
    .fetch_all(conn)
    .await?;

    Ok(rows)
}

/// Batch-fetches `(id, name)` for every distinct ancestor id referenced by
/// the given rows.
async fn fetch_ancestor_refs(
    conn: &mut PgConnection,
    rows: &[CategoryRow],
) -> Result<Vec<AncestorRef>, DbError> {
    let mut ids: Vec<i64> = rows
        .iter()
        .flat_map(|r| {
            [
                r.parent_primary_id,
                r.parent_secondary_id,
                r.parent_tertiary_id,
            ]
        })
        .flatten()
        .collect();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let pairs: Vec<(i64, String)> =
        sqlx::query_as("SELECT id, name FROM categories WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(conn)
            .await?;

    Ok(pairs
        .into_iter()
        .map(|(id, name)| AncestorRef::new(id, name))
        .collect())
}

// ---------------------------------------------------------------------------
// Lookups and admin CRUD
// ---------------------------------------------------------------------------

/// Returns a single category by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, id: i64) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, public_id, name, slug, level, parent_primary_id, parent_secondary_id, \
                parent_tertiary_id, image_url, created_at, updated_at \
         FROM categories \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Creates a category at `level` under the given ancestor ids.
///
/// The slug is derived from the name. Ancestor requirements per level are
/// enforced by the schema CHECK constraint; callers validate beforehand to
/// return a friendlier error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including constraint
/// violations for malformed parent linkage or duplicate sibling slugs).
pub async fn create_category(
    pool: &PgPool,
    name: &str,
    level: CategoryLevel,
    filter: &CategoryFilter,
    image_url: Option<&str>,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories \
             (name, slug, level, parent_primary_id, parent_secondary_id, parent_tertiary_id, image_url) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING id, public_id, name, slug, level, parent_primary_id, parent_secondary_id, \
                   parent_tertiary_id, image_url, created_at, updated_at",
    )
    .bind(name)
    .bind(slugify(name))
    .bind(level.as_str())
    .bind(filter.primary_id)
    .bind(filter.secondary_id)
    .bind(filter.tertiary_id)
    .bind(image_url)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Applies a partial update to a category; renaming re-derives the slug.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such category exists, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_category(
    pool: &PgPool,
    id: i64,
    update: &UpdateCategory,
) -> Result<CategoryRow, DbError> {
    let slug = update.name.as_deref().map(slugify);

    let row = sqlx::query_as::<_, CategoryRow>(
        "UPDATE categories \
         SET name       = COALESCE($2, name), \
             slug       = COALESCE($3, slug), \
             image_url  = COALESCE($4, image_url), \
             updated_at = NOW() \
         WHERE id = $1 \
         RETURNING id, public_id, name, slug, level, parent_primary_id, parent_secondary_id, \
                   parent_tertiary_id, image_url, created_at, updated_at",
    )
    .bind(id)
    .bind(&update.name)
    .bind(slug)
    .bind(&update.image_url)
    .fetch_optional(pool)
    .await?;

    row.ok_or(DbError::NotFound)
}

/// Deletes a category (descendants cascade via the schema).
///
/// Returns `true` if a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_category(pool: &PgPool, id: i64) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
