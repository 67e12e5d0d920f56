use std::collections::BTreeSet;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use super::{IdPath, json_body};
use crate::auth::middleware::{AuthUser, OptionalAuth};
use crate::entities::{game, game_platform, game_review, genre, owned, platform, user, wishlist};
use crate::error::AppError;
use crate::query::{self, GameFilter, GameListing};
use crate::state::AppState;

const MAX_TITLE_CHARS: usize = 128;
const MAX_DESCRIPTION_CHARS: usize = 1024;
/// Storefront order of the seeded platforms: Mobile, Switch, PC, PlayStation, Xbox.
/// Platforms not listed here follow, by id.
const PLATFORM_DISPLAY_ORDER: [i32; 5] = [5, 4, 1, 3, 2];

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the game route group: `/games/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_games).post(create_game))
        .route("/genres", get(list_genres))
        .route("/platforms", get(list_platforms))
        .route("/{id}", get(get_game).patch(edit_game).delete(delete_game))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateGameRequest {
    title: String,
    description: String,
    genre_id: i32,
    price: i32,
    platform_ids: Vec<i32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EditGameRequest {
    title: Option<String>,
    description: Option<String>,
    genre_id: Option<i32>,
    price: Option<i32>,
    platform_ids: Option<Vec<i32>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateGameResponse {
    game_id: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GameDetail {
    game_id: i32,
    title: String,
    description: String,
    genre_id: i32,
    creation_date: String,
    creator_id: i32,
    creator_first_name: String,
    creator_last_name: String,
    price: i32,
    rating: f64,
    platform_ids: Vec<i32>,
    number_of_wishlists: u64,
    number_of_owners: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenreResponse {
    genre_id: i32,
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlatformResponse {
    platform_id: i32,
    name: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Load a game or fail with 404.
pub(super) async fn find_game<C>(db: &C, id: i32) -> Result<game::Model, AppError>
where
    C: ConnectionTrait,
{
    game::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Game not found.".to_string()))
}

fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title is required.".to_string());
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!("Title must be at most {MAX_TITLE_CHARS} characters."));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), String> {
    if description.trim().is_empty() {
        return Err("Description is required.".to_string());
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(format!(
            "Description must be at most {MAX_DESCRIPTION_CHARS} characters."
        ));
    }
    Ok(())
}

fn validate_price(price: i32) -> Result<(), String> {
    if price < 0 {
        return Err("Price must not be negative.".to_string());
    }
    Ok(())
}

/// Sorted, de-duplicated platform ids; empty lists are rejected.
fn normalize_platform_ids(ids: &[i32]) -> Result<Vec<i32>, String> {
    let unique: BTreeSet<i32> = ids.iter().copied().collect();
    if unique.is_empty() {
        return Err("At least one platform is required.".to_string());
    }
    Ok(unique.into_iter().collect())
}

async fn ensure_genre_exists(db: &DatabaseConnection, genre_id: i32) -> Result<(), AppError> {
    let found = genre::Entity::find_by_id(genre_id)
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if found.is_none() {
        return Err(AppError::BadRequest(format!("Unknown genre id {genre_id}.")));
    }
    Ok(())
}

/// Every id must name a known platform.
async fn ensure_platforms_exist(db: &DatabaseConnection, ids: &[i32]) -> Result<(), AppError> {
    let known: BTreeSet<i32> = platform::Entity::find()
        .filter(platform::Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .into_iter()
        .map(|p| p.id)
        .collect();
    if let Some(unknown) = ids.iter().find(|id| !known.contains(id)) {
        return Err(AppError::BadRequest(format!("Unknown platform id {unknown}.")));
    }
    Ok(())
}

/// Whether another game already uses `title`.
async fn title_taken(
    db: &DatabaseConnection,
    title: &str,
    except_game: Option<i32>,
) -> Result<bool, AppError> {
    let existing = game::Entity::find()
        .filter(game::Column::Title.eq(title))
        .one(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(existing.is_some_and(|g| Some(g.id) != except_game))
}

async fn insert_platform_links<C>(db: &C, game_id: i32, platform_ids: &[i32]) -> Result<(), AppError>
where
    C: ConnectionTrait,
{
    let links = platform_ids.iter().map(|&platform_id| game_platform::ActiveModel {
        game_id: Set(game_id),
        platform_id: Set(platform_id),
    });
    game_platform::Entity::insert_many(links)
        .exec_without_returning(db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/games`
///
/// Query options are parsed by [`GameFilter::from_query_pairs`]; `ownedByMe=true` requires auth.
async fn list_games(
    State(state): State<AppState>,
    OptionalAuth(viewer): OptionalAuth,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<GameListing>, AppError> {
    let mut filter = GameFilter::from_query_pairs(&pairs).map_err(AppError::BadRequest)?;

    if filter.owned_by_me {
        let viewer = viewer.ok_or_else(|| {
            AppError::Unauthorized("Log in to list your owned games.".to_string())
        })?;
        filter.owner_id = Some(viewer.id);
    }

    if !filter.platform_ids.is_empty() {
        ensure_platforms_exist(&state.db, &filter.platform_ids).await?;
    }

    let listing = query::fetch(&state.db, &filter)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::debug!(
        returned = listing.games.len(),
        total = listing.count,
        "Listed games"
    );

    Ok(Json(listing))
}

/// `POST /api/v1/games`
async fn create_game(
    State(state): State<AppState>,
    AuthUser(creator): AuthUser,
    body: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = json_body(body)?;

    validate_title(&body.title).map_err(AppError::BadRequest)?;
    validate_description(&body.description).map_err(AppError::BadRequest)?;
    validate_price(body.price).map_err(AppError::BadRequest)?;
    let platform_ids = normalize_platform_ids(&body.platform_ids).map_err(AppError::BadRequest)?;

    ensure_genre_exists(&state.db, body.genre_id).await?;
    ensure_platforms_exist(&state.db, &platform_ids).await?;

    if title_taken(&state.db, &body.title, None).await? {
        return Err(AppError::Forbidden("A game with that title already exists.".to_string()));
    }

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let new_game = game::ActiveModel {
        title: Set(body.title),
        description: Set(body.description),
        creation_date: Set(Utc::now().fixed_offset()),
        image_filename: Set(None),
        genre_id: Set(body.genre_id),
        creator_id: Set(creator.id),
        price: Set(body.price),
        ..Default::default()
    };
    let game_model = new_game
        .insert(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    insert_platform_links(&txn, game_model.id, &platform_ids).await?;

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(game_id = game_model.id, creator_id = creator.id, "Game created");

    Ok((
        StatusCode::CREATED,
        Json(CreateGameResponse {
            game_id: game_model.id,
        }),
    )
        .into_response())
}

/// `GET /api/v1/games/{id}`
async fn get_game(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<GameDetail>, AppError> {
    let (game_model, creator) = game::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Game not found.".to_string()))?;
    let creator = creator.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("Game {id} has no creator row"))
    })?;

    let rating = game_review::Entity::find()
        .select_only()
        .column_as(query::average_rating(), "average_rating")
        .filter(game_review::Column::GameId.eq(id))
        .into_tuple::<f64>()
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .unwrap_or(0.0);

    let platform_ids = query::platform_ids_by_game(&state.db, &[id])
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .remove(&id)
        .unwrap_or_default();

    let number_of_wishlists = wishlist::Entity::find()
        .filter(wishlist::Column::GameId.eq(id))
        .count(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    let number_of_owners = owned::Entity::find()
        .filter(owned::Column::GameId.eq(id))
        .count(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(GameDetail {
        game_id: game_model.id,
        title: game_model.title,
        description: game_model.description,
        genre_id: game_model.genre_id,
        creation_date: game_model.creation_date.to_rfc3339(),
        creator_id: creator.id,
        creator_first_name: creator.first_name,
        creator_last_name: creator.last_name,
        price: game_model.price,
        rating,
        platform_ids,
        number_of_wishlists,
        number_of_owners,
    }))
}

/// `PATCH /api/v1/games/{id}`
///
/// Only the creator may edit. A supplied `platformIds` replaces the whole set.
async fn edit_game(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
    body: Result<Json<EditGameRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let body = json_body(body)?;
    let game_model = find_game(&state.db, id).await?;

    if game_model.creator_id != auth_user.id {
        return Err(AppError::Forbidden(
            "Only the creator can edit this game.".to_string(),
        ));
    }

    if body.title.is_none()
        && body.description.is_none()
        && body.genre_id.is_none()
        && body.price.is_none()
        && body.platform_ids.is_none()
    {
        return Err(AppError::BadRequest("No fields to update.".to_string()));
    }

    let mut active: game::ActiveModel = game_model.clone().into();
    let mut changed = false;

    if let Some(title) = body.title {
        validate_title(&title).map_err(AppError::BadRequest)?;
        if title != game_model.title && title_taken(&state.db, &title, Some(id)).await? {
            return Err(AppError::Forbidden(
                "A game with that title already exists.".to_string(),
            ));
        }
        active.title = Set(title);
        changed = true;
    }

    if let Some(description) = body.description {
        validate_description(&description).map_err(AppError::BadRequest)?;
        active.description = Set(description);
        changed = true;
    }

    if let Some(genre_id) = body.genre_id {
        ensure_genre_exists(&state.db, genre_id).await?;
        active.genre_id = Set(genre_id);
        changed = true;
    }

    if let Some(price) = body.price {
        validate_price(price).map_err(AppError::BadRequest)?;
        active.price = Set(price);
        changed = true;
    }

    let platform_ids = match body.platform_ids {
        Some(ids) => {
            let ids = normalize_platform_ids(&ids).map_err(AppError::BadRequest)?;
            ensure_platforms_exist(&state.db, &ids).await?;
            Some(ids)
        }
        None => None,
    };

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if changed {
        active
            .update(&txn)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
    }

    if let Some(ids) = platform_ids {
        game_platform::Entity::delete_many()
            .filter(game_platform::Column::GameId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        insert_platform_links(&txn, id, &ids).await?;
    }

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(game_id = id, "Game edited");

    Ok(Json(MessageResponse {
        message: "Game updated.",
    })
    .into_response())
}

/// `DELETE /api/v1/games/{id}`
///
/// Games that have been reviewed cannot be deleted.
async fn delete_game(
    State(state): State<AppState>,
    AuthUser(auth_user): AuthUser,
    IdPath(id): IdPath,
) -> Result<Response, AppError> {
    let game_model = find_game(&state.db, id).await?;

    if game_model.creator_id != auth_user.id {
        return Err(AppError::Forbidden(
            "Only the creator can delete this game.".to_string(),
        ));
    }

    let reviews = game_review::Entity::find()
        .filter(game_review::Column::GameId.eq(id))
        .count(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if reviews > 0 {
        return Err(AppError::Forbidden(
            "A game with reviews cannot be deleted.".to_string(),
        ));
    }

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    wishlist::Entity::delete_many()
        .filter(wishlist::Column::GameId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    owned::Entity::delete_many()
        .filter(owned::Column::GameId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    game_platform::Entity::delete_many()
        .filter(game_platform::Column::GameId.eq(id))
        .exec(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    game::Entity::delete_by_id(id)
        .exec(&txn)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if let Some(filename) = game_model.image_filename.as_deref() {
        if let Err(e) = state.images.remove(filename).await {
            tracing::warn!(game_id = id, "Failed to remove image of deleted game: {e}");
        }
    }

    tracing::info!(game_id = id, "Game deleted");

    Ok(Json(MessageResponse {
        message: "Game deleted.",
    })
    .into_response())
}

/// `GET /api/v1/games/genres`
async fn list_genres(
    State(state): State<AppState>,
) -> Result<Json<Vec<GenreResponse>>, AppError> {
    let genres = genre::Entity::find()
        .order_by_asc(genre::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .into_iter()
        .map(|g| GenreResponse {
            genre_id: g.id,
            name: g.name,
        })
        .collect();
    Ok(Json(genres))
}

fn display_rank(platform_id: i32) -> (usize, i32) {
    let rank = PLATFORM_DISPLAY_ORDER
        .iter()
        .position(|id| *id == platform_id)
        .unwrap_or(PLATFORM_DISPLAY_ORDER.len());
    (rank, platform_id)
}

/// `GET /api/v1/games/platforms`, in storefront order.
async fn list_platforms(
    State(state): State<AppState>,
) -> Result<Json<Vec<PlatformResponse>>, AppError> {
    let mut platforms = platform::Entity::find()
        .order_by_asc(platform::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    platforms.sort_by_key(|p| display_rank(p.id));

    let platforms = platforms
        .into_iter()
        .map(|p| PlatformResponse {
            platform_id: p.id,
            name: p.name,
        })
        .collect();
    Ok(Json(platforms))
}
