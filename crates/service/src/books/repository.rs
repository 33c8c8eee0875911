use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Fields accepted when creating a book. The owner is never part of the
/// input; it is stamped from the authenticated identity.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub no_of_pages: i32,
    pub published_at: NaiveDate,
}

/// Full-replace update used by the edit endpoint.
#[derive(Debug, Clone)]
pub struct BookUpdate {
    pub title: String,
    pub author: String,
    pub no_of_pages: i32,
    pub published_at: NaiveDate,
}

/// Owner-scoped persistence for books. Every method carries the owner and
/// implementations must put it in the query predicate, not filter afterwards.
/// Mutations on a record the owner does not hold resolve to `None`.
#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn list(&self, owner: Uuid) -> Result<Vec<models::book::Model>, ServiceError>;
    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<models::book::Model>, ServiceError>;
    async fn create(&self, owner: Uuid, book: NewBook) -> Result<models::book::Model, ServiceError>;
    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: BookUpdate,
    ) -> Result<Option<models::book::Model>, ServiceError>;
    async fn delete(&self, owner: Uuid, id: Uuid)
        -> Result<Option<models::book::Model>, ServiceError>;
    async fn set_current_page(
        &self,
        owner: Uuid,
        id: Uuid,
        current_page: i32,
    ) -> Result<Option<models::book::Model>, ServiceError>;
    async fn set_rating(
        &self,
        owner: Uuid,
        id: Uuid,
        rating: i16,
    ) -> Result<Option<models::book::Model>, ServiceError>;
}

/// SeaORM-backed repository implementation.
pub struct SeaOrmBookRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmBookRepository {
    /// Scoped lookup; when the id exists under another owner, log the
    /// masked access (the response side never learns the difference).
    async fn find_scoped(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> Result<Option<models::book::Model>, ServiceError> {
        let hit = models::book::find_for_owner(&self.db, owner, id)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        if hit.is_none() {
            let foreign = models::book::Entity::find_by_id(id)
                .one(&self.db)
                .await
                .map_err(|e| ServiceError::Db(e.to_string()))?;
            if foreign.is_some() {
                tracing::warn!(book_id = %id, requester = %owner, "cross_owner_access_masked_as_not_found");
            }
        }
        Ok(hit)
    }
}

#[async_trait]
impl BookRepository for SeaOrmBookRepository {
    async fn list(&self, owner: Uuid) -> Result<Vec<models::book::Model>, ServiceError> {
        models::book::list_for_owner(&self.db, owner)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn get(&self, owner: Uuid, id: Uuid) -> Result<Option<models::book::Model>, ServiceError> {
        self.find_scoped(owner, id).await
    }

    async fn create(&self, owner: Uuid, book: NewBook) -> Result<models::book::Model, ServiceError> {
        models::book::create(
            &self.db,
            owner,
            &book.title,
            &book.author,
            book.no_of_pages,
            book.published_at,
        )
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
    }

    async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: BookUpdate,
    ) -> Result<Option<models::book::Model>, ServiceError> {
        let Some(existing) = self.find_scoped(owner, id).await? else {
            return Ok(None);
        };
        let mut am: models::book::ActiveModel = existing.into();
        am.title = Set(changes.title);
        am.author = Set(changes.author);
        am.no_of_pages = Set(changes.no_of_pages);
        am.published_at = Set(changes.published_at);
        am.updated_at = Set(chrono::Utc::now().into());
        let updated = am.update(&self.db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(Some(updated))
    }

    async fn delete(
        &self,
        owner: Uuid,
        id: Uuid,
    ) -> Result<Option<models::book::Model>, ServiceError> {
        let Some(existing) = self.find_scoped(owner, id).await? else {
            return Ok(None);
        };
        models::book::Entity::delete_by_id(existing.id)
            .exec(&self.db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(Some(existing))
    }

    async fn set_current_page(
        &self,
        owner: Uuid,
        id: Uuid,
        current_page: i32,
    ) -> Result<Option<models::book::Model>, ServiceError> {
        let Some(existing) = self.find_scoped(owner, id).await? else {
            return Ok(None);
        };
        let mut am: models::book::ActiveModel = existing.into();
        am.current_page = Set(current_page);
        am.updated_at = Set(chrono::Utc::now().into());
        let updated = am.update(&self.db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(Some(updated))
    }

    async fn set_rating(
        &self,
        owner: Uuid,
        id: Uuid,
        rating: i16,
    ) -> Result<Option<models::book::Model>, ServiceError> {
        let Some(existing) = self.find_scoped(owner, id).await? else {
            return Ok(None);
        };
        let mut am: models::book::ActiveModel = existing.into();
        am.rating = Set(Some(rating));
        am.updated_at = Set(chrono::Utc::now().into());
        let updated = am.update(&self.db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
        Ok(Some(updated))
    }
}

/// In-memory mock repository for unit tests
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockBookRepository {
        books: Mutex<HashMap<Uuid, models::book::Model>>,
    }

    impl MockBookRepository {
        fn scoped(&self, owner: Uuid, id: Uuid) -> Option<models::book::Model> {
            let books = self.books.lock().unwrap();
            books.get(&id).filter(|b| b.user_id == owner).cloned()
        }
    }

    #[async_trait]
    impl BookRepository for MockBookRepository {
        async fn list(&self, owner: Uuid) -> Result<Vec<models::book::Model>, ServiceError> {
            let books = self.books.lock().unwrap();
            let mut owned: Vec<_> =
                books.values().filter(|b| b.user_id == owner).cloned().collect();
            owned.sort_by_key(|b| b.created_at);
            Ok(owned)
        }

        async fn get(
            &self,
            owner: Uuid,
            id: Uuid,
        ) -> Result<Option<models::book::Model>, ServiceError> {
            Ok(self.scoped(owner, id))
        }

        async fn create(
            &self,
            owner: Uuid,
            book: NewBook,
        ) -> Result<models::book::Model, ServiceError> {
            let now = Utc::now().into();
            let model = models::book::Model {
                id: Uuid::new_v4(),
                user_id: owner,
                title: book.title,
                author: book.author,
                no_of_pages: book.no_of_pages,
                published_at: book.published_at,
                current_page: 0,
                rating: None,
                created_at: now,
                updated_at: now,
            };
            self.books.lock().unwrap().insert(model.id, model.clone());
            Ok(model)
        }

        async fn update(
            &self,
            owner: Uuid,
            id: Uuid,
            changes: BookUpdate,
        ) -> Result<Option<models::book::Model>, ServiceError> {
            let Some(mut existing) = self.scoped(owner, id) else {
                return Ok(None);
            };
            existing.title = changes.title;
            existing.author = changes.author;
            existing.no_of_pages = changes.no_of_pages;
            existing.published_at = changes.published_at;
            existing.updated_at = Utc::now().into();
            self.books.lock().unwrap().insert(id, existing.clone());
            Ok(Some(existing))
        }

        async fn delete(
            &self,
            owner: Uuid,
            id: Uuid,
        ) -> Result<Option<models::book::Model>, ServiceError> {
            if self.scoped(owner, id).is_none() {
                return Ok(None);
            }
            Ok(self.books.lock().unwrap().remove(&id))
        }

        async fn set_current_page(
            &self,
            owner: Uuid,
            id: Uuid,
            current_page: i32,
        ) -> Result<Option<models::book::Model>, ServiceError> {
            let Some(mut existing) = self.scoped(owner, id) else {
                return Ok(None);
            };
            existing.current_page = current_page;
            existing.updated_at = Utc::now().into();
            self.books.lock().unwrap().insert(id, existing.clone());
            Ok(Some(existing))
        }

        async fn set_rating(
            &self,
            owner: Uuid,
            id: Uuid,
            rating: i16,
        ) -> Result<Option<models::book::Model>, ServiceError> {
            let Some(mut existing) = self.scoped(owner, id) else {
                return Ok(None);
            };
            existing.rating = Some(rating);
            existing.updated_at = Utc::now().into();
            self.books.lock().unwrap().insert(id, existing.clone());
            Ok(Some(existing))
        }
    }
}
