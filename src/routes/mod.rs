mod games;
mod health;
mod images;
mod library;
mod reviews;
mod users;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::{Json, Router};

use crate::config::Config;
use crate::error::AppError;
use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health` lightweight health check
/// - `GET /api/v1/health` health check with database connectivity
/// - `/api/v1/users/...` registration, sessions, profiles and profile images
/// - `/api/v1/games/...` listing, CRUD, images, reviews, wishlist and owned toggles
pub fn router(config: &Config) -> Router<AppState> {
    let users = users::router().merge(images::user_router(config.max_image_bytes));

    let games = games::router()
        .merge(images::game_router(config.max_image_bytes))
        .merge(reviews::router())
        .merge(library::router());

    let api_v1 = Router::new()
        .merge(health::api_router())
        .nest("/users", users)
        .nest("/games", games);

    Router::new()
        .merge(health::root_router())
        .nest("/api/v1", api_v1)
}

/// Unwrap a JSON body, reporting malformed or incomplete bodies as 400.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// Numeric `{id}` path segment. Unparseable ids are rejected as 400 with the usual error body.
struct IdPath(i32);

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(id))
    }
}
