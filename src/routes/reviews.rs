use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use super::games::find_game;
use super::{IdPath, json_body};
use crate::auth::middleware::AuthUser;
use crate::entities::{game_review, user};
use crate::error::AppError;
use crate::state::AppState;

const MAX_REVIEW_CHARS: usize = 512;

/// Review routes, merged into the game group: `/games/{id}/reviews`
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/reviews", get(list_reviews).post(add_review))
}

#[derive(Deserialize)]
struct AddReviewRequest {
    rating: i32,
    review: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewResponse {
    reviewer_id: i32,
    reviewer_first_name: String,
    reviewer_last_name: String,
    rating: i32,
    review: Option<String>,
    timestamp: String,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

fn validate_review(rating: i32, review: Option<&str>) -> Result<(), String> {
    if !(1..=10).contains(&rating) {
        return Err("Rating must be between 1 and 10.".to_string());
    }
    if review.is_some_and(|r| r.chars().count() > MAX_REVIEW_CHARS) {
        return Err(format!(
            "Review must be at most {MAX_REVIEW_CHARS} characters."
        ));
    }
    Ok(())
}

/// `GET /api/v1/games/{id}/reviews`, newest first.
async fn list_reviews(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> Result<Json<Vec<ReviewResponse>>, AppError> {
    find_game(&state.db, id).await?;

    let reviews = game_review::Entity::find()
        .find_also_related(user::Entity)
        .filter(game_review::Column::GameId.eq(id))
        .order_by_desc(game_review::Column::Timestamp)
        .order_by_desc(game_review::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .into_iter()
        .filter_map(|(review, reviewer)| {
            let reviewer = reviewer?;
            Some(ReviewResponse {
                reviewer_id: reviewer.id,
                reviewer_first_name: reviewer.first_name,
                reviewer_last_name: reviewer.last_name,
                rating: review.rating,
                review: review.review,
                timestamp: review.timestamp.to_rfc3339(),
            })
        })
        .collect();

    Ok(Json(reviews))
}

/// `POST /api/v1/games/{id}/reviews`
///
/// One review per user per game; creators cannot review their own games.
async fn add_review(
    State(state): State<AppState>,
    AuthUser(reviewer): AuthUser,
    IdPath(id): IdPath,
    body: Result<Json<AddReviewRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let game_model = find_game(&state.db, id).await?;

    if game_model.creator_id == reviewer.id {
        return Err(AppError::Forbidden(
            "You cannot review your own game.".to_string(),
        ));
    }

    let existing = game_review::Entity::find()
        .filter(game_review::Column::GameId.eq(id))
        .filter(game_review::Column::UserId.eq(reviewer.id))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if existing.is_some() {
        return Err(AppError::Forbidden(
            "You have already reviewed this game.".to_string(),
        ));
    }

    let body = json_body(body)?;
    validate_review(body.rating, body.review.as_deref()).map_err(AppError::BadRequest)?;

    let new_review = game_review::ActiveModel {
        game_id: Set(id),
        user_id: Set(reviewer.id),
        rating: Set(body.rating),
        review: Set(body.review.filter(|r| !r.is_empty())),
        timestamp: Set(Utc::now().fixed_offset()),
        ..Default::default()
    };
    new_review
        .insert(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(game_id = id, user_id = reviewer.id, "Review added");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Review added.",
        }),
    )
        .into_response())
}
