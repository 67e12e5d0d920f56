use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Owned::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Owned::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Owned::GameId).integer().not_null())
                    .col(ColumnDef::new(Owned::UserId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_owned_game_id")
                            .from(Owned::Table, Owned::GameId)
                            .to(Game::Table, Game::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_owned_user_id")
                            .from(Owned::Table, Owned::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_owned_user_game")
                    .table(Owned::Table)
                    .col(Owned::UserId)
                    .col(Owned::GameId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Owned::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Owned {
    Table,
    Id,
    GameId,
    UserId,
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
