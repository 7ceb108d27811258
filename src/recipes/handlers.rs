use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use super::{
    dto::{RecipeDetail, RecipeImage, RecipePayload, RecipeSummary},
    services,
};
use crate::{
    auth::AuthUser,
    error::{AppError, JsonBody},
    images::{self, UploadItem},
    state::AppState,
};

const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024; // 20MB

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes))
        .route("/recipes/:id", get(get_recipe))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create_recipe))
        .route(
            "/recipes/:id",
            axum::routing::put(put_recipe)
                .patch(patch_recipe)
                .delete(delete_recipe),
        )
        .route(
            "/recipes/:id/upload-image",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<RecipeSummary>>, AppError> {
    Ok(Json(services::list_recipes(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeDetail>, AppError> {
    Ok(Json(services::get_recipe(&state.db, user_id, id).await?))
}

/// POST /recipes; the owner is always the caller.
#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<RecipePayload>,
) -> Result<(StatusCode, HeaderMap, Json<RecipeDetail>), AppError> {
    let (new, tags, ingredients) = payload.into_new()?;
    let detail = services::create_recipe(&state.db, user_id, new, tags, ingredients).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/recipes/{}", detail.summary.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(detail)))
}

#[instrument(skip(state, payload))]
pub async fn put_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<RecipePayload>,
) -> Result<Json<RecipeDetail>, AppError> {
    let changes = payload.into_changes(false)?;
    Ok(Json(services::update_recipe(&state.db, user_id, id, changes).await?))
}

#[instrument(skip(state, payload))]
pub async fn patch_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    JsonBody(payload): JsonBody<RecipePayload>,
) -> Result<Json<RecipeDetail>, AppError> {
    let changes = payload.into_changes(true)?;
    Ok(Json(services::update_recipe(&state.db, user_id, id, changes).await?))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    services::delete_recipe(&state.db, state.storage.as_ref(), user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/:id/upload-image (multipart, field `image`)
#[instrument(skip(state, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<i64>,
    mut mp: Multipart,
) -> Result<Json<RecipeImage>, AppError> {
    let mut upload = None;
    loop {
        let field = match mp.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "malformed multipart body");
                return Err(AppError::field("image", e.body_text()));
            }
        };
        if field.name() != Some("image") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::field("image", e.body_text()))?;
        upload = Some(UploadItem {
            filename,
            body,
            content_type,
        });
        break;
    }

    let Some(upload) = upload else {
        return Err(AppError::field("image", "No file was submitted."));
    };

    let recipe = images::upload_recipe_image(&state, user_id, id, upload).await?;
    Ok(Json(RecipeImage {
        id: recipe.id,
        image: recipe.image,
    }))
}
