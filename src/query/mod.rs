//! Filtered, sorted and paginated game listing.
//!
//! A [`GameFilter`] is lowered to a list of [`Predicate`]s, which are folded into one
//! `Condition`. That condition drives both the listing statement and the count statement, so the
//! reported total always matches what paging through the listing would return.

mod filter;

use std::collections::HashMap;
use std::str::FromStr;

use sea_orm::sea_query::{
    Alias, Condition, Expr, Func, LikeExpr, Order, Query, SelectStatement, SimpleExpr,
};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbBackend, DbErr, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder,
};
use serde::Serialize;

use crate::entities::{game, game_platform, game_review, owned, user};

const RATING_ALIAS: &str = "average_rating";
const TOTAL_ALIAS: &str = "total";
/// Not a backslash, so the `ESCAPE` literal reads the same in every dialect.
const LIKE_ESCAPE: char = '!';

/// Sort order accepted by `sortBy`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    AlphabeticalAsc,
    AlphabeticalDesc,
    PriceAsc,
    PriceDesc,
    RatingAsc,
    RatingDesc,
    /// Used when `sortBy` is absent; not selectable by name.
    #[default]
    CreatedAsc,
    CreatedDesc,
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALPHABETICAL_ASC" => Ok(Self::AlphabeticalAsc),
            "ALPHABETICAL_DESC" => Ok(Self::AlphabeticalDesc),
            "PRICE_ASC" => Ok(Self::PriceAsc),
            "PRICE_DESC" => Ok(Self::PriceDesc),
            "RATING_ASC" => Ok(Self::RatingAsc),
            "RATING_DESC" => Ok(Self::RatingDesc),
            "CREATED_DESC" => Ok(Self::CreatedDesc),
            other => Err(format!("Unknown sortBy value: {other}")),
        }
    }
}

/// Pagination window. Only applied when both `startIndex` and `count` were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub start: u64,
    pub count: u64,
}

/// Parsed and validated listing options. Every field is optional; absence means no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    pub q: Option<String>,
    pub genre_ids: Vec<i32>,
    pub platform_ids: Vec<i32>,
    pub creator_id: Option<i32>,
    pub owner_id: Option<i32>,
    /// Resolved to `owner_id` by the handler once the caller is authenticated.
    pub owned_by_me: bool,
    pub max_price: Option<i32>,
    pub reviewer_id: Option<i32>,
    pub sort_by: SortBy,
    pub page: Option<Page>,
}

/// A single constraint on the set of listed games.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Case-insensitive substring match on title or description.
    TextSearch(String),
    GenreIn(Vec<i32>),
    /// At least one of the game's platforms is in the set.
    PlatformIn(Vec<i32>),
    CreatedBy(i32),
    OwnedBy(i32),
    /// Inclusive upper bound.
    MaxPrice(i32),
    ReviewedBy(i32),
}

impl Predicate {
    fn lower(&self, backend: DbBackend) -> Condition {
        match self {
            Self::TextSearch(text) => {
                let pattern = format!("%{}%", escape_like(&fold_case(text, backend)));
                Condition::any()
                    .add(lower_like(game::Column::Title, &pattern))
                    .add(lower_like(game::Column::Description, &pattern))
            }
            Self::GenreIn(ids) => Condition::all().add(
                Expr::col((game::Entity, game::Column::GenreId)).is_in(ids.iter().copied()),
            ),
            Self::PlatformIn(ids) => Condition::all().add(
                Expr::col((game::Entity, game::Column::Id)).in_subquery(
                    Query::select()
                        .column((game_platform::Entity, game_platform::Column::GameId))
                        .from(game_platform::Entity)
                        .and_where(
                            Expr::col((game_platform::Entity, game_platform::Column::PlatformId))
                                .is_in(ids.iter().copied()),
                        )
                        .to_owned(),
                ),
            ),
            Self::CreatedBy(id) => {
                Condition::all().add(Expr::col((game::Entity, game::Column::CreatorId)).eq(*id))
            }
            Self::OwnedBy(id) => Condition::all().add(
                Expr::col((game::Entity, game::Column::Id)).in_subquery(
                    Query::select()
                        .column((owned::Entity, owned::Column::GameId))
                        .from(owned::Entity)
                        .and_where(Expr::col((owned::Entity, owned::Column::UserId)).eq(*id))
                        .to_owned(),
                ),
            ),
            Self::MaxPrice(max) => {
                Condition::all().add(Expr::col((game::Entity, game::Column::Price)).lte(*max))
            }
            Self::ReviewedBy(id) => {
                // Aliased so it cannot be confused with the listing's own review join.
                let reviewed = Alias::new("reviewed");
                Condition::all().add(
                    Expr::col((game::Entity, game::Column::Id)).in_subquery(
                        Query::select()
                            .column((reviewed.clone(), game_review::Column::GameId))
                            .from_as(game_review::Entity, reviewed.clone())
                            .and_where(Expr::col((reviewed, game_review::Column::UserId)).eq(*id))
                            .to_owned(),
                    ),
                )
            }
        }
    }
}

fn lower_like(column: game::Column, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((game::Entity, column))))
        .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

/// Lowercase search text the way the backend's `LOWER()` will fold the column.
///
/// `SQLite` only folds ASCII, so non-ASCII letters are left as typed there.
fn fold_case(text: &str, backend: DbBackend) -> String {
    match backend {
        DbBackend::Sqlite => text.to_ascii_lowercase(),
        DbBackend::Postgres | DbBackend::MySql => text.to_lowercase(),
    }
}

/// Escape `LIKE` wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, LIKE_ESCAPE | '%' | '_') {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

impl GameFilter {
    /// The constraints this filter imposes, in a fixed order.
    #[must_use]
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(q) = self.q.as_deref().filter(|q| !q.is_empty()) {
            predicates.push(Predicate::TextSearch(q.to_string()));
        }
        if !self.genre_ids.is_empty() {
            predicates.push(Predicate::GenreIn(self.genre_ids.clone()));
        }
        if !self.platform_ids.is_empty() {
            predicates.push(Predicate::PlatformIn(self.platform_ids.clone()));
        }
        if let Some(id) = self.creator_id {
            predicates.push(Predicate::CreatedBy(id));
        }
        if let Some(id) = self.owner_id {
            predicates.push(Predicate::OwnedBy(id));
        }
        if let Some(max) = self.max_price {
            predicates.push(Predicate::MaxPrice(max));
        }
        if let Some(id) = self.reviewer_id {
            predicates.push(Predicate::ReviewedBy(id));
        }
        predicates
    }

    /// All predicates AND-ed together, with text search folded for `backend`.
    #[must_use]
    pub fn condition(&self, backend: DbBackend) -> Condition {
        self.predicates()
            .iter()
            .fold(Condition::all(), |cond, p| cond.add(p.lower(backend)))
    }
}

/// `AVG(game_review.rating)` as a double, or 0 when there are no reviews.
#[must_use]
pub fn average_rating() -> SimpleExpr {
    let rating_or_zero: [SimpleExpr; 2] = [
        Func::avg(Expr::col((game_review::Entity, game_review::Column::Rating))).into(),
        Expr::val(0).into(),
    ];
    Func::cast_as(Func::coalesce(rating_or_zero), Alias::new("DOUBLE PRECISION")).into()
}

/// Build the listing statement: one row per game with creator names and average rating.
#[must_use]
pub fn listing_query(condition: Condition, sort_by: SortBy, page: Option<Page>) -> SelectStatement {
    let mut stmt = Query::select();
    stmt.expr_as(Expr::col((game::Entity, game::Column::Id)), Alias::new("game_id"))
        .column((game::Entity, game::Column::Title))
        .column((game::Entity, game::Column::GenreId))
        .column((game::Entity, game::Column::CreationDate))
        .column((game::Entity, game::Column::CreatorId))
        .expr_as(
            Expr::col((user::Entity, user::Column::FirstName)),
            Alias::new("creator_first_name"),
        )
        .expr_as(
            Expr::col((user::Entity, user::Column::LastName)),
            Alias::new("creator_last_name"),
        )
        .column((game::Entity, game::Column::Price))
        .expr_as(average_rating(), Alias::new(RATING_ALIAS))
        .from(game::Entity)
        .inner_join(
            user::Entity,
            Expr::col((user::Entity, user::Column::Id))
                .equals((game::Entity, game::Column::CreatorId)),
        )
        .left_join(
            game_review::Entity,
            Expr::col((game_review::Entity, game_review::Column::GameId))
                .equals((game::Entity, game::Column::Id)),
        )
        .cond_where(condition)
        .group_by_col((game::Entity, game::Column::Id))
        .group_by_col((user::Entity, user::Column::Id));

    match sort_by {
        SortBy::AlphabeticalAsc => stmt.order_by((game::Entity, game::Column::Title), Order::Asc),
        SortBy::AlphabeticalDesc => {
            stmt.order_by((game::Entity, game::Column::Title), Order::Desc)
        }
        SortBy::PriceAsc => stmt.order_by((game::Entity, game::Column::Price), Order::Asc),
        SortBy::PriceDesc => stmt.order_by((game::Entity, game::Column::Price), Order::Desc),
        SortBy::RatingAsc => stmt.order_by(Alias::new(RATING_ALIAS), Order::Asc),
        SortBy::RatingDesc => stmt.order_by(Alias::new(RATING_ALIAS), Order::Desc),
        SortBy::CreatedAsc => {
            stmt.order_by((game::Entity, game::Column::CreationDate), Order::Asc)
        }
        SortBy::CreatedDesc => {
            stmt.order_by((game::Entity, game::Column::CreationDate), Order::Desc)
        }
    };
    stmt.order_by((game::Entity, game::Column::Id), Order::Asc);

    if let Some(page) = page {
        stmt.limit(page.count).offset(page.start);
    }
    stmt
}

/// Build the count statement: distinct matching games, ignoring pagination.
#[must_use]
pub fn count_query(condition: Condition) -> SelectStatement {
    Query::select()
        .expr_as(
            Func::count_distinct(Expr::col((game::Entity, game::Column::Id))),
            Alias::new(TOTAL_ALIAS),
        )
        .from(game::Entity)
        .cond_where(condition)
        .to_owned()
}

#[derive(Debug, FromQueryResult)]
struct GameRow {
    game_id: i32,
    title: String,
    genre_id: i32,
    creation_date: sea_orm::prelude::DateTimeWithTimeZone,
    creator_id: i32,
    creator_first_name: String,
    creator_last_name: String,
    price: i32,
    average_rating: f64,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

/// One game in a listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub game_id: i32,
    pub title: String,
    pub genre_id: i32,
    pub creation_date: sea_orm::prelude::DateTimeWithTimeZone,
    pub creator_id: i32,
    pub creator_first_name: String,
    pub creator_last_name: String,
    pub price: i32,
    pub rating: f64,
    pub platform_ids: Vec<i32>,
}

/// A page of games plus the total number of matches.
#[derive(Debug, Clone, Serialize)]
pub struct GameListing {
    pub games: Vec<GameSummary>,
    pub count: i64,
}

/// Run the count and listing statements for `filter`.
///
/// # Errors
///
/// Returns the underlying `DbErr` if any statement fails.
pub async fn fetch<C>(db: &C, filter: &GameFilter) -> Result<GameListing, DbErr>
where
    C: ConnectionTrait,
{
    let backend = db.get_database_backend();
    let condition = filter.condition(backend);

    let count = CountRow::find_by_statement(backend.build(&count_query(condition.clone())))
        .one(db)
        .await?
        .map_or(0, |row| row.total);

    let rows = GameRow::find_by_statement(backend.build(&listing_query(
        condition,
        filter.sort_by,
        filter.page,
    )))
    .all(db)
    .await?;

    let ids: Vec<i32> = rows.iter().map(|r| r.game_id).collect();
    let mut platforms = platform_ids_by_game(db, &ids).await?;

    let games = rows
        .into_iter()
        .map(|row| GameSummary {
            platform_ids: platforms.remove(&row.game_id).unwrap_or_default(),
            game_id: row.game_id,
            title: row.title,
            genre_id: row.genre_id,
            creation_date: row.creation_date,
            creator_id: row.creator_id,
            creator_first_name: row.creator_first_name,
            creator_last_name: row.creator_last_name,
            price: row.price,
            rating: row.average_rating,
        })
        .collect();

    Ok(GameListing { games, count })
}

/// Platform ids for each of `game_ids`, ascending.
///
/// # Errors
///
/// Returns the underlying `DbErr` if the lookup fails.
pub async fn platform_ids_by_game<C>(
    db: &C,
    game_ids: &[i32],
) -> Result<HashMap<i32, Vec<i32>>, DbErr>
where
    C: ConnectionTrait,
{
    let mut grouped: HashMap<i32, Vec<i32>> = HashMap::new();
    if game_ids.is_empty() {
        return Ok(grouped);
    }
    let links = game_platform::Entity::find()
        .filter(game_platform::Column::GameId.is_in(game_ids.iter().copied()))
        .order_by_asc(game_platform::Column::PlatformId)
        .all(db)
        .await?;
    for link in links {
        grouped.entry(link.game_id).or_default().push(link.platform_id);
    }
    Ok(grouped)
}
