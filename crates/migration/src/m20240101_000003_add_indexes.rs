use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Book: index on user_id, every query is owner-scoped
        manager
            .create_index(
                Index::create()
                    .name("idx_book_user")
                    .table(Book::Table)
                    .col(Book::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_book_user").table(Book::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Book { Table, UserId }
