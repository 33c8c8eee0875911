use crate::db::connect;
use crate::{book, user};
use anyhow::Result;
use chrono::NaiveDate;
use migration::MigratorTrait;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

/// Setup test database with migrations
async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = connect().await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

fn unique_user() -> (String, String) {
    let tag = Uuid::new_v4();
    (format!("reader_{tag}"), format!("reader_{tag}@example.com"))
}

#[tokio::test]
async fn test_user_crud_and_unique_constraints() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }

    let db = setup_test_db().await?;

    let (username, email) = unique_user();
    let created = user::create(&db, &username, &email, "$argon2id$fake").await?;
    assert_eq!(created.username, username);
    assert_eq!(created.email, email);

    let found = user::find_by_email(&db, &email).await?;
    assert_eq!(found.as_ref().map(|u| u.id), Some(created.id));

    let found = user::find_by_username_or_email(&db, &username, "other@example.com").await?;
    assert_eq!(found.map(|u| u.id), Some(created.id));

    // Schema-level uniqueness: same username, fresh email
    let (_, other_email) = unique_user();
    let dup = user::create(&db, &username, &other_email, "$argon2id$fake").await;
    assert!(dup.is_err(), "duplicate username must be rejected by the schema");

    user::Entity::delete_by_id(created.id).exec(&db).await?;
    Ok(())
}

#[tokio::test]
async fn test_book_owner_scoping() -> Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }

    let db = setup_test_db().await?;

    let (username_a, email_a) = unique_user();
    let (username_b, email_b) = unique_user();
    let alice = user::create(&db, &username_a, &email_a, "$argon2id$fake").await?;
    let bruno = user::create(&db, &username_b, &email_b, "$argon2id$fake").await?;

    let published = NaiveDate::from_ymd_opt(1956, 1, 1).unwrap();
    let owned = book::create(&db, alice.id, "Grande Sertão", "Guimarães Rosa", 600, published).await?;

    // Owner sees the record, a different user resolves it like a miss
    let hit = book::find_for_owner(&db, alice.id, owned.id).await?;
    assert_eq!(hit.map(|b| b.id), Some(owned.id));
    let miss = book::find_for_owner(&db, bruno.id, owned.id).await?;
    assert!(miss.is_none());

    let alice_books = book::list_for_owner(&db, alice.id).await?;
    assert!(alice_books.iter().any(|b| b.id == owned.id));
    let bruno_books = book::list_for_owner(&db, bruno.id).await?;
    assert!(bruno_books.iter().all(|b| b.id != owned.id));

    user::Entity::delete_by_id(alice.id).exec(&db).await?;
    user::Entity::delete_by_id(bruno.id).exec(&db).await?;
    Ok(())
}
