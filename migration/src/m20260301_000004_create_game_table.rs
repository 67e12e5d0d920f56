use sea_orm_migration::prelude::*;

/// Creates the `game` table. Ratings and wishlist/owner counts are derived at query time.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Game {
    Table,
    Id,
    Title,
    Description,
    CreationDate,
    ImageFilename,
    GenreId,
    CreatorId,
    Price,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Genre {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Game::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Game::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Game::Title)
                            .string_len(128)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Game::Description).string_len(1024).not_null())
                    .col(
                        ColumnDef::new(Game::CreationDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Game::ImageFilename).string_len(64).null())
                    .col(ColumnDef::new(Game::GenreId).integer().not_null())
                    .col(ColumnDef::new(Game::CreatorId).integer().not_null())
                    .col(ColumnDef::new(Game::Price).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_creator_id")
                            .from(Game::Table, Game::CreatorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_genre_id")
                            .from(Game::Table, Game::GenreId)
                            .to(Genre::Table, Genre::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_creator_id")
                    .table(Game::Table)
                    .col(Game::CreatorId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Game::Table).to_owned())
            .await
    }
}
