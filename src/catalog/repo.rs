use std::collections::HashMap;

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqliteExecutor, SqlitePool};

use super::{CatalogEntry, CatalogKind};
use crate::error::AppError;

pub async fn list_for_owner<K: CatalogKind>(
    db: &SqlitePool,
    owner: i64,
) -> Result<Vec<CatalogEntry>, AppError> {
    let sql = format!(
        "SELECT id, name FROM {} WHERE user_id = ? ORDER BY name DESC",
        K::TABLE
    );
    let rows = sqlx::query_as::<_, CatalogEntry>(&sql)
        .bind(owner)
        .fetch_all(db)
        .await?;
    Ok(rows)
}

/// Atomic get-or-create on `(owner, name)`; the unique index is the conflict target.
pub async fn upsert<K: CatalogKind>(
    conn: &mut SqliteConnection,
    owner: i64,
    name: &str,
) -> Result<CatalogEntry, AppError> {
    let sql = format!(
        "INSERT INTO {} (user_id, name) VALUES (?, ?) \
         ON CONFLICT (user_id, name) DO UPDATE SET name = excluded.name \
         RETURNING id, name",
        K::TABLE
    );
    let entry = sqlx::query_as::<_, CatalogEntry>(&sql)
        .bind(owner)
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;
    Ok(entry)
}

pub async fn rename<K: CatalogKind>(
    db: &SqlitePool,
    owner: i64,
    id: i64,
    name: &str,
) -> Result<CatalogEntry, AppError> {
    let sql = format!(
        "UPDATE {} SET name = ? WHERE id = ? AND user_id = ? RETURNING id, name",
        K::TABLE
    );
    sqlx::query_as::<_, CatalogEntry>(&sql)
        .bind(name)
        .bind(id)
        .bind(owner)
        .fetch_optional(db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::field("name", format!("You already have a {} with this name.", K::NAME))
            }
            other => other.into(),
        })?
        .ok_or(AppError::NotFound)
}

pub async fn find<K: CatalogKind>(
    db: &SqlitePool,
    owner: i64,
    id: i64,
) -> Result<CatalogEntry, AppError> {
    let sql = format!("SELECT id, name FROM {} WHERE id = ? AND user_id = ?", K::TABLE);
    sqlx::query_as::<_, CatalogEntry>(&sql)
        .bind(id)
        .bind(owner)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound)
}

/// Deleting an entry only drops its recipe links (cascade on the join table).
pub async fn delete<K: CatalogKind>(db: &SqlitePool, owner: i64, id: i64) -> Result<(), AppError> {
    let sql = format!("DELETE FROM {} WHERE id = ? AND user_id = ?", K::TABLE);
    let res = sqlx::query(&sql).bind(id).bind(owner).execute(db).await?;
    if res.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn link<K: CatalogKind>(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    entry_id: i64,
) -> Result<(), AppError> {
    let sql = format!(
        "INSERT OR IGNORE INTO {} (recipe_id, {}) VALUES (?, ?)",
        K::LINK_TABLE,
        K::LINK_COLUMN
    );
    sqlx::query(&sql)
        .bind(recipe_id)
        .bind(entry_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn clear_links<K: CatalogKind>(
    conn: &mut SqliteConnection,
    recipe_id: i64,
) -> Result<u64, AppError> {
    let sql = format!("DELETE FROM {} WHERE recipe_id = ?", K::LINK_TABLE);
    let res = sqlx::query(&sql).bind(recipe_id).execute(&mut *conn).await?;
    Ok(res.rows_affected())
}

/// Entries linked to one recipe, in the order they were linked.
pub async fn for_recipe<'e, K, E>(executor: E, recipe_id: i64) -> Result<Vec<CatalogEntry>, AppError>
where
    K: CatalogKind,
    E: SqliteExecutor<'e>,
{
    let sql = format!(
        "SELECT c.id, c.name FROM {table} c \
         JOIN {link} l ON l.{col} = c.id \
         WHERE l.recipe_id = ? ORDER BY l.rowid",
        table = K::TABLE,
        link = K::LINK_TABLE,
        col = K::LINK_COLUMN
    );
    let rows = sqlx::query_as::<_, CatalogEntry>(&sql)
        .bind(recipe_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

#[derive(sqlx::FromRow)]
struct LinkedEntry {
    recipe_id: i64,
    id: i64,
    name: String,
}

/// Entries for many recipes in one query, keyed by recipe id.
pub async fn for_recipes<K: CatalogKind>(
    db: &SqlitePool,
    recipe_ids: &[i64],
) -> Result<HashMap<i64, Vec<CatalogEntry>>, AppError> {
    let mut out: HashMap<i64, Vec<CatalogEntry>> = HashMap::new();
    if recipe_ids.is_empty() {
        return Ok(out);
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT l.recipe_id, c.id, c.name FROM {table} c \
         JOIN {link} l ON l.{col} = c.id WHERE l.recipe_id IN (",
        table = K::TABLE,
        link = K::LINK_TABLE,
        col = K::LINK_COLUMN
    ));
    let mut ids = qb.separated(", ");
    for id in recipe_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY l.rowid");

    let rows = qb.build_query_as::<LinkedEntry>().fetch_all(db).await?;
    for row in rows {
        out.entry(row.recipe_id).or_default().push(CatalogEntry {
            id: row.id,
            name: row.name,
        });
    }
    Ok(out)
}
