use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, header, request::Parts},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::api::users::{CreateUserPayload, UserView, create_record};
use crate::db::{models::User, repo};
use crate::token;

/// The authenticated principal, resolved from the `Authorization: Bearer`
/// header before the handler runs. Every request is looked up
/// independently; there is no session state.
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

        let user = repo::find_by_token(&state.db, token)
            .await?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser(user))
    }
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /api/signup. Creates an account and returns the record with its
/// freshly issued auth token.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<UserView>), ApiError> {
    let user = create_record(&state.db, payload).await?;
    tracing::info!(username = %user.username, "user signed up");
    Ok((StatusCode::CREATED, Json(UserView::with_token(user))))
}

/// POST /api/login. Validates credentials and returns the existing auth
/// token; no session record is created.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<TokenResponse>, ApiError> {
    let username = payload.username.as_deref().unwrap_or_default();
    let password = payload.password.as_deref().unwrap_or_default();

    let user = repo::find_by_username(&state.db, username)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    if !token::verify_password(password, &user.password_hash) {
        return Err(ApiError::Unauthorized);
    }

    // Every record gets a token at creation; one without a token cannot
    // authenticate at all.
    let token = user.auth_token.ok_or(ApiError::Unauthorized)?;
    Ok(Json(TokenResponse { token }))
}
