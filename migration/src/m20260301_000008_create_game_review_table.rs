use sea_orm_migration::prelude::*;

/// Creates the `game_review` table. One review per (game, user).
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum GameReview {
    Table,
    Id,
    GameId,
    UserId,
    Rating,
    Review,
    Timestamp,
}

#[derive(DeriveIden)]
enum Game {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameReview::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameReview::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameReview::GameId).integer().not_null())
                    .col(ColumnDef::new(GameReview::UserId).integer().not_null())
                    .col(ColumnDef::new(GameReview::Rating).integer().not_null())
                    .col(ColumnDef::new(GameReview::Review).string_len(512).null())
                    .col(
                        ColumnDef::new(GameReview::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_review_game_id")
                            .from(GameReview::Table, GameReview::GameId)
                            .to(Game::Table, Game::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_review_user_id")
                            .from(GameReview::Table, GameReview::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_review_game_user")
                    .table(GameReview::Table)
                    .col(GameReview::GameId)
                    .col(GameReview::UserId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameReview::Table).to_owned())
            .await
    }
}
