use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Wishlist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Wishlist::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Wishlist::GameId).integer().not_null())
                    .col(ColumnDef::new(Wishlist::UserId).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wishlist_game_id")
                            .from(Wishlist::Table, Wishlist::GameId)
                            .to(Game::Table, Game::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_wishlist_user_id")
                            .from(Wishlist::Table, Wishlist::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_wishlist_user_game")
                    .table(Wishlist::Table)
                    .col(Wishlist::UserId)
                    .col(Wishlist::GameId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Wishlist::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Wishlist {
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
