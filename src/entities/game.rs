use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "game")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub title: String,
    pub description: String,
    pub creation_date: DateTimeWithTimeZone,
    pub image_filename: Option<String>,
    pub genre_id: i32,
    pub creator_id: i32,
    pub price: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatorId",
        to = "super::user::Column::Id"
    )]
    Creator,
    #[sea_orm(
        belongs_to = "super::genre::Entity",
        from = "Column::GenreId",
        to = "super::genre::Column::Id"
    )]
    Genre,
    #[sea_orm(has_many = "super::game_platform::Entity")]
    GamePlatform,
    #[sea_orm(has_many = "super::game_review::Entity")]
    GameReview,
    #[sea_orm(has_many = "super::wishlist::Entity")]
    Wishlist,
    #[sea_orm(has_many = "super::owned::Entity")]
    Owned,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::genre::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Genre.def()
    }
}

impl Related<super::game_platform::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GamePlatform.def()
    }
}

impl Related<super::game_review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameReview.def()
    }
}

impl Related<super::wishlist::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wishlist.def()
    }
}

impl Related<super::owned::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owned.def()
    }
}

impl Related<super::platform::Entity> for Entity {
    fn to() -> RelationDef {
        super::game_platform::Relation::Platform.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::game_platform::Relation::Game.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
