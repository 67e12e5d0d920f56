use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::Serialize;

use super::games::find_game;
use super::IdPath;
use crate::auth::middleware::AuthUser;
use crate::entities::{owned, wishlist};
use crate::error::AppError;
use crate::state::AppState;

/// Wishlist and owned-game toggles, merged into the game group.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{id}/wishlist",
            post(add_to_wishlist).delete(remove_from_wishlist),
        )
        .route("/{id}/owned", post(mark_owned).delete(unmark_owned))
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

async fn find_wishlisted<C>(
    db: &C,
    game_id: i32,
    user_id: i32,
) -> Result<Option<wishlist::Model>, AppError>
where
    C: ConnectionTrait,
{
    wishlist::Entity::find()
        .filter(wishlist::Column::GameId.eq(game_id))
        .filter(wishlist::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

async fn find_owned<C>(db: &C, game_id: i32, user_id: i32) -> Result<Option<owned::Model>, AppError>
where
    C: ConnectionTrait,
{
    owned::Entity::find()
        .filter(owned::Column::GameId.eq(game_id))
        .filter(owned::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))
}

/// `POST /api/v1/games/{id}/wishlist`
async fn add_to_wishlist(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, AppError> {
    let game_model = find_game(&state.db, id).await?;

    if game_model.creator_id == auth_user.id {
        return Err(AppError::Forbidden(
            "You cannot wishlist your own game.".to_string(),
        ));
    }
    if find_owned(&state.db, id, auth_user.id).await?.is_some() {
        return Err(AppError::Forbidden(
            "You already own this game.".to_string(),
        ));
    }
    if find_wishlisted(&state.db, id, auth_user.id).await?.is_some() {
        return Err(AppError::Forbidden(
            "Game is already on your wishlist.".to_string(),
        ));
    }

    wishlist::ActiveModel {
        game_id: Set(id),
        user_id: Set(auth_user.id),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(game_id = id, user_id = auth_user.id, "Game wishlisted");

    Ok(Json(MessageResponse {
        message: "Added to wishlist.",
    }))
}

/// `DELETE /api/v1/games/{id}/wishlist`
async fn remove_from_wishlist(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, AppError> {
    find_game(&state.db, id).await?;

    let entry = find_wishlisted(&state.db, id, auth_user.id)
        .await?
        .ok_or_else(|| AppError::Forbidden("Game is not on your wishlist.".to_string()))?;

    wishlist::Entity::delete_by_id(entry.id)
        .exec(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(game_id = id, user_id = auth_user.id, "Game removed from wishlist");

    Ok(Json(MessageResponse {
        message: "Removed from wishlist.",
    }))
}

/// `POST /api/v1/games/{id}/owned`
///
/// Marking a game owned also drops it from the caller's wishlist, atomically.
async fn mark_owned(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, AppError> {
    let game_model = find_game(&state.db, id).await?;

    if game_model.creator_id == auth_user.id {
        return Err(AppError::Forbidden(
            "You cannot mark your own game as owned.".to_string(),
        ));
    }
    if find_owned(&state.db, id, auth_user.id).await?.is_some() {
        return Err(AppError::Forbidden(
            "You already own this game.".to_string(),
        ));
    }

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    wishlist::Entity::delete_many()
        .filter(wishlist::Column::GameId.eq(id))
        .filter(wishlist::Column::UserId.eq(auth_user.id))
        .exec(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    owned::ActiveModel {
        game_id: Set(id),
        user_id: Set(auth_user.id),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| AppError::Internal(e.into()))?;

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(game_id = id, user_id = auth_user.id, "Game marked owned");

    Ok(Json(MessageResponse {
        message: "Marked as owned.",
    }))
}

/// `DELETE /api/v1/games/{id}/owned`
async fn unmark_owned(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Json<MessageResponse>, AppError> {
    find_game(&state.db, id).await?;

    let entry = find_owned(&state.db, id, auth_user.id)
        .await?
        .ok_or_else(|| AppError::Forbidden("You do not own this game.".to_string()))?;

    owned::Entity::delete_by_id(entry.id)
        .exec(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(game_id = id, user_id = auth_user.id, "Game unmarked as owned");

    Ok(Json(MessageResponse {
        message: "Removed from owned games.",
    }))
}
