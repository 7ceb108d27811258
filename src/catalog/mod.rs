//! Per-user catalogs of tags and ingredients.
//!
//! Both catalogs share one table shape, so the store, the handlers and the
//! reconciliation used by recipes are written once and parameterised by a
//! [`CatalogKind`].

pub mod dto;
pub mod handlers;
pub mod reconcile;
pub mod repo;

use axum::Router;
use serde::Serialize;
use sqlx::FromRow;

use crate::state::AppState;

/// Tag or ingredient row, already scoped to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CatalogEntry {
    pub id: i64,
    pub name: String,
}

/// Table layout of one catalog.
pub trait CatalogKind: Send + Sync + 'static {
    /// Singular name used in logs.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Join table between recipes and this catalog.
    const LINK_TABLE: &'static str;
    const LINK_COLUMN: &'static str;
    /// Collection path under `/api`.
    const PATH: &'static str;
}

pub struct Tags;

impl CatalogKind for Tags {
    const NAME: &'static str = "tag";
    const TABLE: &'static str = "tags";
    const LINK_TABLE: &'static str = "recipe_tags";
    const LINK_COLUMN: &'static str = "tag_id";
    const PATH: &'static str = "/tags";
}

pub struct Ingredients;

impl CatalogKind for Ingredients {
    const NAME: &'static str = "ingredient";
    const TABLE: &'static str = "ingredients";
    const LINK_TABLE: &'static str = "recipe_ingredients";
    const LINK_COLUMN: &'static str = "ingredient_id";
    const PATH: &'static str = "/ingredients";
}

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes::<Tags>())
        .merge(handlers::routes::<Ingredients>())
}
