use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GamePlatforms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(GamePlatforms::GameId).integer().not_null())
                    .col(ColumnDef::new(GamePlatforms::PlatformId).integer().not_null())
                    .primary_key(
                        Index::create()
                            .col(GamePlatforms::GameId)
                            .col(GamePlatforms::PlatformId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_platforms_game_id")
                            .from(GamePlatforms::Table, GamePlatforms::GameId)
                            .to(Game::Table, Game::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_platforms_platform_id")
                            .from(GamePlatforms::Table, GamePlatforms::PlatformId)
                            .to(Platform::Table, Platform::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Platform filter looks games up by platform
        manager
            .create_index(
                Index::create()
                    .name("idx_game_platforms_platform_id")
                    .table(GamePlatforms::Table)
                    .col(GamePlatforms::PlatformId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GamePlatforms::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum GamePlatforms {
    Table,
    GameId,
    PlatformId,
}

#[derive(DeriveIden)]
enum Game {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Platform {
    Table,
    Id,
}
