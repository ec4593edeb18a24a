use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::api::auth::AuthUser;
use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::db::{models::User, repo};
use crate::token;

/// Fields are optional so a missing field surfaces as a 400 validation
/// error rather than a body-deserialization rejection.
#[derive(Deserialize)]
pub struct CreateUserPayload {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub username: Option<String>,
    pub age: Option<i64>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateUserPayload {
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub age: Option<i64>,
    pub password: Option<String>,
}

/// API-facing user representation. The auth token is present only on
/// signup responses and authenticated self-lookups, never in lists.
#[derive(Serialize)]
pub struct UserView {
    pub id: String,
    pub firstname: String,
    pub lastname: String,
    pub age: Option<i64>,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl UserView {
    pub fn public(user: &User) -> Self {
        UserView {
            id: user.id.clone(),
            firstname: user.firstname.clone(),
            lastname: user.lastname.clone(),
            age: user.age,
            username: user.username.clone(),
            auth_token: None,
        }
    }

    pub fn with_token(user: User) -> Self {
        UserView {
            id: user.id,
            firstname: user.firstname,
            lastname: user.lastname,
            age: user.age,
            username: user.username,
            auth_token: user.auth_token,
        }
    }
}

fn require(value: Option<String>, field: &str) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::Validation(format!("{} is required", field))),
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Validates the payload, hashes the password, issues the token and
/// persists the record. A duplicate username maps to a validation error.
pub async fn create_record(
    pool: &SqlitePool,
    payload: CreateUserPayload,
) -> Result<User, ApiError> {
    let firstname = require(payload.firstname, "firstname")?;
    let lastname = require(payload.lastname, "lastname")?;
    let username = require(payload.username, "username")?;
    let password = require(payload.password, "password")?;

    let password_hash =
        token::hash_password(&password).map_err(|_| ApiError::Internal("password hashing"))?;

    let mut user = User {
        id: Uuid::new_v4().to_string(),
        firstname,
        lastname,
        username,
        age: payload.age,
        password_hash,
        auth_token: None,
        created_at: unix_now(),
    };
    token::ensure_token(&mut user);

    match repo::insert_user(pool, &user).await {
        Ok(()) => Ok(user),
        Err(err) if repo::is_unique_violation(&err) => Err(ApiError::Validation(
            "username is already taken".to_string(),
        )),
        Err(err) => Err(err.into()),
    }
}

/// GET /api/users. Public fields only.
pub async fn list(
    State(state): State<Arc<AppState>>,
    _principal: AuthUser,
) -> Result<Json<Vec<UserView>>, ApiError> {
    let users = repo::list_users(&state.db).await?;
    Ok(Json(users.iter().map(UserView::public).collect()))
}

/// GET /api/users/{id}. A self-lookup also includes the caller's token.
pub async fn show(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<UserView>, ApiError> {
    let user = repo::find_by_id(&state.db, &id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let view = if user.id == principal.id {
        UserView::with_token(user)
    } else {
        UserView::public(&user)
    };
    Ok(Json(view))
}

/// POST /api/users. Empty 201; clients that need the token use /api/signup.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<StatusCode, ApiError> {
    let user = create_record(&state.db, payload).await?;
    tracing::info!(username = %user.username, "user created");
    Ok(StatusCode::CREATED)
}

/// PUT /api/users/{id}, self only. Names, age and password can change;
/// id, username and auth token are fixed.
pub async fn update(
    State(state): State<Arc<AppState>>,
    AuthUser(principal): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserPayload>,
) -> Result<Json<UserView>, ApiError> {
    let mut user = repo::find_by_id(&state.db, &id)
        .await?
        .ok_or(ApiError::NotFound)?;

    if user.id != principal.id {
        return Err(ApiError::Forbidden);
    }

    if let Some(firstname) = payload.firstname {
        user.firstname = require(Some(firstname), "firstname")?;
    }
    if let Some(lastname) = payload.lastname {
        user.lastname = require(Some(lastname), "lastname")?;
    }
    if let Some(age) = payload.age {
        user.age = Some(age);
    }
    if let Some(password) = payload.password {
        let password = require(Some(password), "password")?;
        user.password_hash =
            token::hash_password(&password).map_err(|_| ApiError::Internal("password hashing"))?;
    }

    repo::update_user(&state.db, &user).await?;
    Ok(Json(UserView::with_token(user)))
}
