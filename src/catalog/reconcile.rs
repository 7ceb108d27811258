//! Resolving name payloads into catalog entries attached to a recipe.
//!
//! Callers run these inside the transaction that writes the recipe, so a
//! failure halfway leaves neither new catalog rows nor partial links behind.

use sqlx::SqliteConnection;
use tracing::debug;

use super::{repo, CatalogEntry, CatalogKind};
use crate::error::AppError;

/// Get-or-create every name for `owner` and link it to the recipe.
///
/// Names are handled in order; repeated names collapse into one link and the
/// returned list keeps first-seen order.
pub async fn attach<K: CatalogKind>(
    conn: &mut SqliteConnection,
    owner: i64,
    recipe_id: i64,
    names: &[String],
) -> Result<Vec<CatalogEntry>, AppError> {
    let mut attached: Vec<CatalogEntry> = Vec::with_capacity(names.len());
    for name in names {
        let entry = repo::upsert::<K>(conn, owner, name).await?;
        repo::link::<K>(conn, recipe_id, entry.id).await?;
        if !attached.iter().any(|e| e.id == entry.id) {
            attached.push(entry);
        }
    }
    debug!(kind = K::NAME, recipe_id, count = attached.len(), "catalog entries attached");
    Ok(attached)
}

/// Update-time rule: `None` keeps the current links, `Some` (even empty)
/// replaces them. Returns the new links when they were replaced.
pub async fn replace<K: CatalogKind>(
    conn: &mut SqliteConnection,
    owner: i64,
    recipe_id: i64,
    names: Option<&[String]>,
) -> Result<Option<Vec<CatalogEntry>>, AppError> {
    let Some(names) = names else {
        return Ok(None);
    };
    let cleared = repo::clear_links::<K>(conn, recipe_id).await?;
    debug!(kind = K::NAME, recipe_id, cleared, "catalog links cleared");
    let attached = attach::<K>(conn, owner, recipe_id, names).await?;
    Ok(Some(attached))
}
