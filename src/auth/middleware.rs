use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use crate::auth::AUTH_HEADER;
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from the `X-Authorization: <token>` header.
///
/// Use as an extractor in handler parameters to require authentication:
/// ```ignore
/// async fn handler(AuthUser(user): AuthUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header.".to_string()))?;

        let user_model = user::Entity::find()
            .filter(user::Column::AuthToken.eq(token))
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired token.".to_string()))?;

        Ok(Self(user_model))
    }
}

/// Wraps an optional authenticated user (the token is optional for some routes).
///
/// No header yields `None`. A header carrying an unknown token is still rejected with 401.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<user::Model>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTH_HEADER) {
            return Ok(Self(None));
        }
        let AuthUser(user_model) = AuthUser::from_request_parts(parts, state).await?;
        Ok(Self(Some(user_model)))
    }
}
