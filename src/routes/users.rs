use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use super::{IdPath, json_body};
use crate::auth::middleware::{AuthUser, OptionalAuth};
use crate::auth::{password, token};
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the user route group: `/users/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/{id}", get(view_user).patch(update_user))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    email: String,
    first_name: String,
    last_name: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    user_id: i32,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    user_id: i32,
    token: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserView {
    first_name: String,
    last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateUserRequest {
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
    current_password: Option<String>,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn user_view(u: &user::Model, include_email: bool) -> UserView {
    UserView {
        first_name: u.first_name.clone(),
        last_name: u.last_name.clone(),
        email: include_email.then(|| u.email.clone()),
    }
}

async fn email_taken(
    db: &sea_orm::DatabaseConnection,
    email: &str,
    except_user: Option<i32>,
) -> Result<bool, AppError> {
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(existing.is_some_and(|u| Some(u.id) != except_user))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/users/register`
async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = json_body(body)?;
    let email = body.email.trim().to_string();

    password::validate_email(&email).map_err(AppError::BadRequest)?;
    password::validate_name("firstName", &body.first_name).map_err(AppError::BadRequest)?;
    password::validate_name("lastName", &body.last_name).map_err(AppError::BadRequest)?;
    password::validate_password(&body.password).map_err(AppError::BadRequest)?;

    if email_taken(&state.db, &email, None).await? {
        tracing::warn!(%email, "Registration rejected: email in use");
        return Err(AppError::Forbidden("Email already registered.".to_string()));
    }

    let password_hash = password::hash_password(&body.password)?;

    let new_user = user::ActiveModel {
        email: Set(email),
        first_name: Set(body.first_name),
        last_name: Set(body.last_name),
        password: Set(password_hash),
        auth_token: Set(None),
        image_filename: Set(None),
        ..Default::default()
    };
    let user_model = new_user
        .insert(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user_id = user_model.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user_model.id,
        }),
    )
        .into_response())
}

/// `POST /api/v1/users/login`
async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = json_body(body)?;
    let invalid = || AppError::Unauthorized("Invalid email or password.".to_string());

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(body.email.trim()))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(invalid)?;

    if !password::verify_password(&body.password, &user_model.password)? {
        tracing::warn!(user_id = user_model.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    let session_token = token::generate_token();
    let user_id = user_model.id;
    let mut active: user::ActiveModel = user_model.into();
    active.auth_token = Set(Some(session_token.clone()));
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user_id, "User logged in");

    Ok(Json(LoginResponse {
        user_id,
        token: session_token,
    })
    .into_response())
}

/// `POST /api/v1/users/logout`
async fn logout(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
) -> Result<Response, AppError> {
    let user_id = user_model.id;
    let mut active: user::ActiveModel = user_model.into();
    active.auth_token = Set(None);
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user_id, "User logged out");

    Ok(Json(MessageResponse {
        message: "Logged out.",
    })
    .into_response())
}

/// `GET /api/v1/users/{id}`
async fn view_user(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    let user_model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let is_self = viewer.is_some_and(|v| v.id == user_model.id);
    Ok(Json(user_view(&user_model, is_self)).into_response())
}

/// `PATCH /api/v1/users/{id}`
///
/// Every supplied field is written in a single `UPDATE`.
async fn update_user(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
    body: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = json_body(body)?;

    let target = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    if target.id != auth_user.id {
        return Err(AppError::Forbidden(
            "You can only edit your own account.".to_string(),
        ));
    }

    if body.email.is_none()
        && body.first_name.is_none()
        && body.last_name.is_none()
        && body.password.is_none()
    {
        return Err(AppError::BadRequest("No fields to update.".to_string()));
    }

    let mut active: user::ActiveModel = target.clone().into();

    if let Some(email) = body.email.as_deref().map(str::trim) {
        password::validate_email(email).map_err(AppError::BadRequest)?;
        if email_taken(&state.db, email, Some(target.id)).await? {
            return Err(AppError::Forbidden("Email already in use.".to_string()));
        }
        active.email = Set(email.to_string());
    }

    if let Some(first_name) = body.first_name {
        password::validate_name("firstName", &first_name).map_err(AppError::BadRequest)?;
        active.first_name = Set(first_name);
    }

    if let Some(last_name) = body.last_name {
        password::validate_name("lastName", &last_name).map_err(AppError::BadRequest)?;
        active.last_name = Set(last_name);
    }

    if let Some(new_password) = body.password {
        password::validate_password(&new_password).map_err(AppError::BadRequest)?;
        let current = body.current_password.ok_or_else(|| {
            AppError::BadRequest("currentPassword is required to change password.".to_string())
        })?;
        if !password::verify_password(&current, &target.password)? {
            return Err(AppError::Unauthorized(
                "Current password is incorrect.".to_string(),
            ));
        }
        if password::verify_password(&new_password, &target.password)? {
            return Err(AppError::Forbidden(
                "New password must differ from the current one.".to_string(),
            ));
        }
        active.password = Set(password::hash_password(&new_password)?);
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user_id = updated.id, "User updated");

    Ok(Json(user_view(&updated, true)).into_response())
}
