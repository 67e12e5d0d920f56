use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "platform")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::game_platform::Entity")]
    GamePlatform,
}

impl Related<super::game_platform::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GamePlatform.def()
    }
}

impl Related<super::game::Entity> for Entity {
    fn to() -> RelationDef {
        super::game_platform::Relation::Game.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::game_platform::Relation::Platform.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
