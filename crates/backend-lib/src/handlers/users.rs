// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! User endpoints: register, login, and admin CRUD on `/api/v1/users`.
//!
//! Each handler validates its payload before touching the directory, runs all
//! directory work inside one transaction, and commits only on success.
use super::respond;
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILURE, LOGIN_SUCCESS, USERS_CREATED, USERS_DELETED, USERS_UPDATED};
use crate::middleware::AuthContext;
use crate::storage::{DirectoryError, DirectoryTx, NewUser, UserChanges, UserDirectory};
use crate::validation::{
    validate_login_request, validate_register_request, validate_update_user_request,
};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use usergate_common::{
    ApiResponse, LoginRequest, RegisterRequest, UpdateUserRequest, UserId, UserProfile,
};

/// `?id=` query parameter on `/api/v1/users`
#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub id: Option<String>,
}

fn payload<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|e| AppError::InvalidPayload(e.body_text()))
}

fn parse_user_id(raw: Option<&str>) -> Result<UserId, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing user id".to_string()))?;
    raw.parse()
        .map_err(|_| AppError::BadRequest("invalid user id".to_string()))
}

fn not_found(err: DirectoryError) -> AppError {
    match err {
        DirectoryError::NotFound => AppError::NotFound("User not found".to_string()),
        other => AppError::Directory(other),
    }
}

fn conflict(err: DirectoryError) -> AppError {
    match err {
        DirectoryError::Conflict(constraint) if constraint.contains("email") => {
            AppError::Conflict("Email already exists".to_string())
        }
        DirectoryError::Conflict(_) => AppError::Conflict("Username already exists".to_string()),
        other => not_found(other),
    }
}

/// Hash on the blocking pool, wiping the plaintext afterwards
async fn hash_password<D: UserDirectory>(
    state: &AppState<D>,
    mut plain: String,
) -> Result<String, AppError> {
    let credentials = state.credentials.clone();
    let hash = tokio::task::spawn_blocking(move || credentials.hash_secure(&mut plain)).await??;
    Ok(hash)
}

async fn verify_password<D: UserDirectory>(
    state: &AppState<D>,
    hashed: String,
    plain: String,
) -> Result<bool, AppError> {
    let credentials = state.credentials.clone();
    let matches = tokio::task::spawn_blocking(move || credentials.verify(&hashed, &plain)).await?;
    Ok(matches)
}

/// `POST /api/v1/register`
pub async fn register<D: UserDirectory>(
    State(state): State<Arc<AppState<D>>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = payload(body)?;
    validate_register_request(&req)?;

    let mut tx = state.directory.begin().await?;

    let username_exists = tx.exists_by_username(&req.username).await?;
    let email_exists = tx.exists_by_email(&req.email).await?;
    if username_exists {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if email_exists {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let RegisterRequest {
        username,
        email,
        password,
        is_admin,
    } = req;
    let password_hash = hash_password(&state, password).await?;

    let user_id = tx
        .insert(&NewUser {
            username: username.clone(),
            email,
            password_hash,
            is_admin,
        })
        .await
        .map_err(conflict)?;
    tx.commit().await?;

    metrics::counter!(USERS_CREATED).increment(1);
    tracing::info!(user_id, %username, is_admin, "user registered");

    Ok(respond(ApiResponse::<()>::success(
        StatusCode::CREATED.as_u16(),
        "New user created successfully",
        None,
    )))
}

/// `POST /api/v1/login`
pub async fn login<D: UserDirectory>(
    State(state): State<Arc<AppState<D>>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = payload(body)?;
    validate_login_request(&req)?;

    let mut tx = state.directory.begin().await?;

    let stored = match tx.find_by_username(&req.username).await {
        Ok(user) => user,
        Err(DirectoryError::NotFound) => {
            // Same scrypt work as a wrong password
            let decoy = state.credentials.decoy_hash().to_string();
            verify_password(&state, decoy, req.password.clone()).await?;
            metrics::counter!(LOGIN_FAILURE).increment(1);
            tracing::warn!(username = %req.username, "login for unknown user");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    let LoginRequest { username, password } = req;
    if !verify_password(&state, stored.password_hash.clone(), password).await? {
        metrics::counter!(LOGIN_FAILURE).increment(1);
        tracing::warn!(%username, "login with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state
        .tokens
        .issue(stored.user_id, stored.is_admin, state.clock.now())?;
    tx.commit().await?;

    metrics::counter!(LOGIN_SUCCESS).increment(1);
    tracing::info!(user_id = stored.user_id, "user authenticated");

    Ok(respond(ApiResponse::success(
        StatusCode::OK.as_u16(),
        "Authentication successful",
        Some(token),
    )))
}

/// `GET /api/v1/users` (admin, all users) or `GET /api/v1/users?id=` (any caller)
pub async fn get_users<D: UserDirectory>(
    State(state): State<Arc<AppState<D>>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<UserQuery>,
) -> Result<axum::response::Response, AppError> {
    match query.id.as_deref() {
        Some(id) => get_user_by_id(&state, id).await,
        None => list_users(&state, ctx).await,
    }
}

async fn list_users<D: UserDirectory>(
    state: &AppState<D>,
    ctx: AuthContext,
) -> Result<axum::response::Response, AppError> {
    ctx.require_admin()?;

    let users = tokio::time::timeout(state.query_timeout, state.directory.list_users()).await??;

    if users.is_empty() {
        return Ok(respond(ApiResponse::info(
            StatusCode::OK.as_u16(),
            "No users found",
            Some("No users found".to_string()),
        ))
        .into_response());
    }

    let profiles: Vec<UserProfile> = users.into_iter().map(UserProfile::from).collect();
    Ok(respond(ApiResponse::success(
        StatusCode::OK.as_u16(),
        "Successfully retrieved all users",
        Some(profiles),
    ))
    .into_response())
}

async fn get_user_by_id<D: UserDirectory>(
    state: &AppState<D>,
    raw_id: &str,
) -> Result<axum::response::Response, AppError> {
    let user_id = parse_user_id(Some(raw_id))?;

    let user = tokio::time::timeout(state.query_timeout, async {
        let mut tx = state.directory.begin().await?;
        let user = tx.find_by_id(user_id).await.map_err(not_found)?;
        tx.commit().await?;
        Ok::<_, AppError>(user)
    })
    .await??;

    Ok(respond(ApiResponse::success(
        StatusCode::OK.as_u16(),
        "Successfully retrieved user details",
        Some(UserProfile::from(user)),
    ))
    .into_response())
}

/// `PUT /api/v1/users` (admin)
pub async fn update_user<D: UserDirectory>(
    State(state): State<Arc<AppState<D>>>,
    Extension(ctx): Extension<AuthContext>,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    let req = payload(body)?;
    validate_update_user_request(&req)?;

    if req.user_id == 0 {
        return Err(AppError::BadRequest("Missing user ID".to_string()));
    }

    let mut tx = state.directory.begin().await?;
    let current = tx.find_by_id(req.user_id).await.map_err(not_found)?;

    let same_fields = current.username == req.username
        && current.email == req.email
        && current.is_admin == req.is_admin;
    if same_fields
        && verify_password(&state, current.password_hash.clone(), req.password.clone()).await?
    {
        return Err(AppError::NoChanges);
    }

    if req.username != current.username && tx.exists_by_username(&req.username).await? {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }
    if req.email != current.email && tx.exists_by_email(&req.email).await? {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let UpdateUserRequest {
        user_id,
        username,
        email,
        password,
        is_admin,
    } = req;
    let password_hash = hash_password(&state, password).await?;

    tx.update(&UserChanges {
        user_id,
        username,
        email,
        password_hash,
        is_admin,
    })
    .await
    .map_err(conflict)?;
    tx.commit().await?;

    metrics::counter!(USERS_UPDATED).increment(1);
    tracing::info!(user_id, by = ctx.user_id, "user updated");

    Ok(respond(ApiResponse::<()>::success(
        StatusCode::OK.as_u16(),
        "User updated successfully",
        None,
    )))
}

/// `DELETE /api/v1/users?id=` (admin)
pub async fn delete_user<D: UserDirectory>(
    State(state): State<Arc<AppState<D>>>,
    Extension(ctx): Extension<AuthContext>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    ctx.require_admin()?;

    let user_id = parse_user_id(query.id.as_deref())?;

    let mut tx = state.directory.begin().await?;
    if !tx.exists_by_id(user_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    tx.delete(user_id).await.map_err(not_found)?;
    tx.commit().await?;

    metrics::counter!(USERS_DELETED).increment(1);
    tracing::info!(user_id, by = ctx.user_id, "user deleted");

    Ok(respond(ApiResponse::<()>::success(
        StatusCode::OK.as_u16(),
        "User deleted successfully",
        None,
    )))
}
