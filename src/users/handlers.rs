use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{PublicUser, RefreshRequest, TokenRequest, TokenResponse, UserPayload},
    repo,
};
use crate::{
    auth::{AuthUser, JwtKeys},
    error::{AppError, FieldErrors, JsonBody, NON_FIELD_ERRORS},
    state::AppState,
    validation,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/token", post(create_token))
        .route("/users/token/refresh", post(refresh_token))
        .route("/users/me", get(get_me).put(put_me).patch(patch_me))
}

fn issue_tokens(state: &AppState, user_id: i64) -> Result<TokenResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    Ok(TokenResponse {
        token: keys.sign_access(user_id)?,
        refresh_token: keys.sign_refresh(user_id)?,
    })
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<(StatusCode, Json<PublicUser>), AppError> {
    let new_user = payload.into_new_user()?;
    let user = repo::create_user(&state.db, new_user).await?;
    info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn create_token(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let mut errors = FieldErrors::new();
    let email = validation::required(&mut errors, "email", payload.email);
    let password = validation::required(&mut errors, "password", payload.password);
    errors.into_result()?;
    let (email, password) = (email.unwrap_or_default(), password.unwrap_or_default());

    let Some(user) = repo::authenticate(&state.db, &email, &password).await? else {
        warn!("token request with bad credentials");
        return Err(AppError::field(
            NON_FIELD_ERRORS,
            "Unable to authenticate with provided credentials.",
        ));
    };

    info!(user_id = user.id, "token issued");
    Ok(Json(issue_tokens(&state, user.id)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh_token(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let mut errors = FieldErrors::new();
    let token = validation::required(&mut errors, "refresh_token", payload.refresh_token);
    errors.into_result()?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&token.unwrap_or_default())
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    // The account may have been deactivated since the refresh token was issued.
    match repo::find_by_id(&state.db, claims.sub).await? {
        Some(user) if user.is_active => Ok(Json(issue_tokens(&state, user.id)?)),
        _ => Err(AppError::Unauthorized("User not found.".into())),
    }
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = repo::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found.".into()))?;
    Ok(Json(user.into()))
}

async fn update_me(
    state: AppState,
    user_id: i64,
    payload: UserPayload,
    partial: bool,
) -> Result<Json<PublicUser>, AppError> {
    let changes = payload.into_changes(partial)?;
    let user = match repo::update_user(&state.db, user_id, changes).await {
        Err(AppError::NotFound) => return Err(AppError::Unauthorized("User not found.".into())),
        other => other?,
    };
    info!(user_id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn put_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<Json<PublicUser>, AppError> {
    update_me(state, user_id, payload, false).await
}

#[instrument(skip(state, payload))]
pub async fn patch_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<UserPayload>,
) -> Result<Json<PublicUser>, AppError> {
    update_me(state, user_id, payload, true).await
}
