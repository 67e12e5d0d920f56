use sea_orm_migration::prelude::*;

/// Creates the `user` table, including the opaque session token column.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Email,
    FirstName,
    LastName,
    Password,
    AuthToken,
    ImageFilename,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(User::Email)
                            .string_len(256)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::FirstName).string_len(64).not_null())
                    .col(ColumnDef::new(User::LastName).string_len(64).not_null())
                    .col(ColumnDef::new(User::Password).string_len(256).not_null())
                    .col(
                        ColumnDef::new(User::AuthToken)
                            .string_len(256)
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(User::ImageFilename).string_len(64).null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}
