use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::Set;
use sea_orm::EntityTrait;
use serde::Serialize;

use super::games::find_game;
use super::IdPath;
use crate::auth::middleware::AuthUser;
use crate::entities::{game, user};
use crate::error::AppError;
use crate::state::AppState;
use crate::storage::{ImageKind, ImageOwner, ImageStore};

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// `/users/{id}/image`, merged into the user group.
pub fn user_router(max_image_bytes: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/image",
            get(get_user_image)
                .put(set_user_image)
                .delete(delete_user_image),
        )
        .layer(DefaultBodyLimit::max(max_image_bytes))
}

/// `/games/{id}/image`, merged into the game group.
pub fn game_router(max_image_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/{id}/image", get(get_game_image).put(set_game_image))
        .layer(DefaultBodyLimit::max(max_image_bytes))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Serve a stored image with the content type implied by its extension.
async fn serve(store: &ImageStore, filename: Option<&str>) -> Result<Response, AppError> {
    let missing = || AppError::NotFound("Image not found.".to_string());
    let filename = filename.ok_or_else(missing)?;
    let kind = ImageKind::from_filename(filename).ok_or_else(missing)?;
    let bytes = store
        .read(filename)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(missing)?;

    Ok(([(header::CONTENT_TYPE, kind.content_type())], bytes).into_response())
}

/// Write a new image for `owner`/`id`, removing a previous file stored under another name.
///
/// Returns the new filename.
async fn save(
    store: &ImageStore,
    owner: ImageOwner,
    id: i32,
    previous: Option<&str>,
    headers: &HeaderMap,
    bytes: &[u8],
) -> Result<String, AppError> {
    let kind = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(ImageKind::from_content_type)
        .ok_or_else(|| {
            AppError::BadRequest("Content-Type must be image/png, image/jpeg or image/gif.".to_string())
        })?;
    if bytes.is_empty() {
        return Err(AppError::BadRequest("Image body is empty.".to_string()));
    }

    let filename = ImageStore::filename(owner, id, kind);
    store
        .write(&filename, bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if let Some(old) = previous.filter(|old| *old != filename) {
        if let Err(e) = store.remove(old).await {
            tracing::warn!(filename = old, "Failed to remove replaced image: {e}");
        }
    }
    Ok(filename)
}

const fn set_status(had_image: bool) -> StatusCode {
    if had_image {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    }
}

async fn find_user(state: &AppState, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// User images
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/users/{id}/image`
async fn get_user_image(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    let user_model = find_user(&state, id).await?;
    serve(&state.images, user_model.image_filename.as_deref()).await
}

/// `PUT /api/v1/users/{id}/image`
async fn set_user_image(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let user_model = find_user(&state, id).await?;
    if user_model.id != auth_user.id {
        return Err(AppError::Forbidden(
            "You can only change your own image.".to_string(),
        ));
    }

    let previous = user_model.image_filename.clone();
    let filename = save(
        &state.images,
        ImageOwner::User,
        id,
        previous.as_deref(),
        &headers,
        &body,
    )
    .await?;

    let mut active: user::ActiveModel = user_model.into();
    active.image_filename = Set(Some(filename));
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user_id = id, "User image set");

    Ok((
        set_status(previous.is_some()),
        Json(MessageResponse {
            message: "Image saved.",
        }),
    )
        .into_response())
}

/// `DELETE /api/v1/users/{id}/image`
async fn delete_user_image(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    let user_model = find_user(&state, id).await?;
    if user_model.id != auth_user.id {
        return Err(AppError::Forbidden(
            "You can only delete your own image.".to_string(),
        ));
    }
    let filename = user_model
        .image_filename
        .clone()
        .ok_or_else(|| AppError::NotFound("Image not found.".to_string()))?;

    let mut active: user::ActiveModel = user_model.into();
    active.image_filename = Set(None);
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    state
        .images
        .remove(&filename)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user_id = id, "User image deleted");

    Ok(Json(MessageResponse {
        message: "Image deleted.",
    })
    .into_response())
}

// ─────────────────────────────────────────────────────────────────────────────
// Game images
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/games/{id}/image`
async fn get_game_image(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    let game_model = find_game(&state.db, id).await?;
    serve(&state.images, game_model.image_filename.as_deref()).await
}

/// `PUT /api/v1/games/{id}/image`
async fn set_game_image(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let game_model = find_game(&state.db, id).await?;
    if game_model.creator_id != auth_user.id {
        return Err(AppError::Forbidden(
            "Only the creator can change a game's image.".to_string(),
        ));
    }

    let previous = game_model.image_filename.clone();
    let filename = save(
        &state.images,
        ImageOwner::Game,
        id,
        previous.as_deref(),
        &headers,
        &body,
    )
    .await?;

    let mut active: game::ActiveModel = game_model.into();
    active.image_filename = Set(Some(filename));
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(game_id = id, "Game image set");

    Ok((
        set_status(previous.is_some()),
        Json(MessageResponse {
            message: "Image saved.",
        }),
    )
        .into_response())
}
