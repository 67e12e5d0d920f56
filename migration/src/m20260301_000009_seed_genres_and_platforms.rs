use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[rustfmt::skip]
const GENRES: &[(i32, &str)] = &[
    (1,  "Action"),
    (2,  "Adventure"),
    (3,  "Role-Playing"),
    (4,  "Strategy"),
    (5,  "Simulation"),
    (6,  "Sports"),
    (7,  "Puzzle"),
    (8,  "Racing"),
    (9,  "Horror"),
    (10, "Platformer"),
    (11, "Shooter"),
    (12, "Fighting"),
];

#[rustfmt::skip]
const PLATFORMS: &[(i32, &str)] = &[
    (1, "PC"),
    (2, "Xbox"),
    (3, "PlayStation"),
    (4, "Nintendo Switch"),
    (5, "Mobile"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut genres = Query::insert();
        genres
            .into_table(Genre::Table)
            .columns([Genre::Id, Genre::Name]);
        for (id, name) in GENRES {
            genres
                .values([(*id).into(), (*name).into()])
                .map_err(|e| DbErr::Custom(format!("Invalid genre seed row: {e}")))?;
        }
        manager.exec_stmt(genres).await?;

        let mut platforms = Query::insert();
        platforms
            .into_table(Platform::Table)
            .columns([Platform::Id, Platform::Name]);
        for (id, name) in PLATFORMS {
            platforms
                .values([(*id).into(), (*name).into()])
                .map_err(|e| DbErr::Custom(format!("Invalid platform seed row: {e}")))?;
        }
        manager.exec_stmt(platforms).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(Platform::Table).to_owned())
            .await?;
        manager
            .exec_stmt(Query::delete().from_table(Genre::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum Platform {
    Table,
    Id,
    Name,
}
