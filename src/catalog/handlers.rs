use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::{dto::CatalogPayload, repo, CatalogEntry, CatalogKind};
use crate::{
    auth::AuthUser,
    error::{AppError, JsonBody},
    state::AppState,
};

/// List, update and delete for one catalog.
pub fn routes<K: CatalogKind>() -> Router<AppState> {
    Router::new()
        .route(K::PATH, get(list_entries::<K>))
        .route(
            &format!("{}/:id", K::PATH),
            put(put_entry::<K>)
                .patch(patch_entry::<K>)
                .delete(delete_entry::<K>),
        )
}

#[instrument(skip(state), fields(kind = K::NAME))]
pub async fn list_entries<K: CatalogKind>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<CatalogEntry>>, AppError> {
    let entries = repo::list_for_owner::<K>(&state.db, user_id).await?;
    Ok(Json(entries))
}

async fn update_entry<K: CatalogKind>(
    state: &AppState,
    user_id: i64,
    id: i64,
    payload: CatalogPayload,
    partial: bool,
) -> Result<Json<CatalogEntry>, AppError> {
    let entry = match payload.into_name(partial)? {
        Some(name) => repo::rename::<K>(&state.db, user_id, id, name.trim()).await?,
        None => repo::find::<K>(&state.db, user_id, id).await?,
    };
    info!(kind = K::NAME, user_id, id, "catalog entry updated");
    Ok(Json(entry))
}

#[instrument(skip(state, payload), fields(kind = K::NAME))]
pub async fn put_entry<K: CatalogKind>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<CatalogPayload>,
) -> Result<Json<CatalogEntry>, AppError> {
    update_entry::<K>(&state, user_id, id, payload, false).await
}

#[instrument(skip(state, payload), fields(kind = K::NAME))]
pub async fn patch_entry<K: CatalogKind>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<CatalogPayload>,
) -> Result<Json<CatalogEntry>, AppError> {
    update_entry::<K>(&state, user_id, id, payload, true).await
}

#[instrument(skip(state), fields(kind = K::NAME))]
pub async fn delete_entry<K: CatalogKind>(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    repo::delete::<K>(&state.db, user_id, id).await?;
    info!(kind = K::NAME, user_id, id, "catalog entry deleted");
    Ok(StatusCode::NO_CONTENT)
}
