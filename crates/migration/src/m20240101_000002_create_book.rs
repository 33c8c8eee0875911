//! Create `book` table with FK to `user`.
//!
//! Every book row carries its owning user; deleting a user cascades.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Book::Table)
                    .if_not_exists()
                    .col(uuid(Book::Id).primary_key())
                    .col(uuid(Book::UserId).not_null())
                    .col(string_len(Book::Title, 255).not_null())
                    .col(string_len(Book::Author, 255).not_null())
                    .col(integer(Book::NoOfPages).not_null())
                    .col(date(Book::PublishedAt).not_null())
                    .col(integer(Book::CurrentPage).not_null().default(0))
                    // Unrated books carry NULL here
                    .col(ColumnDef::new(Book::Rating).small_integer().null())
                    .col(timestamp_with_time_zone(Book::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Book::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_book_user")
                            .from(Book::Table, Book::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Book::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Book {
    Table,
    Id,
    UserId,
    Title,
    Author,
    NoOfPages,
    PublishedAt,
    CurrentPage,
    Rating,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum User { Table, Id }
