use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::repository::{BookRepository, BookUpdate, NewBook};
use crate::errors::ServiceError;

const MIN_RATING: i16 = 1;
const MAX_RATING: i16 = 5;

/// Application service encapsulating book business rules. Validation and
/// reading-progress policy live here; the repository only moves rows.
pub struct BookService<R: BookRepository> {
    repo: Arc<R>,
}

impl<R: BookRepository> BookService<R> {
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, owner: Uuid) -> Result<Vec<models::book::Model>, ServiceError> {
        self.repo.list(owner).await
    }

    pub async fn get(&self, owner: Uuid, id: Uuid) -> Result<models::book::Model, ServiceError> {
        self.repo
            .get(owner, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("book"))
    }

    #[instrument(skip(self, book), fields(owner = %owner))]
    pub async fn create(&self, owner: Uuid, book: NewBook) -> Result<models::book::Model, ServiceError> {
        validate_fields(&book.title, &book.author, book.no_of_pages)?;
        let created = self.repo.create(owner, book).await?;
        info!(book_id = %created.id, "book_created");
        Ok(created)
    }

    #[instrument(skip(self, changes), fields(owner = %owner, book_id = %id))]
    pub async fn update(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: BookUpdate,
    ) -> Result<models::book::Model, ServiceError> {
        validate_fields(&changes.title, &changes.author, changes.no_of_pages)?;
        self.repo
            .update(owner, id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("book"))
    }

    #[instrument(skip(self), fields(owner = %owner, book_id = %id))]
    pub async fn delete(&self, owner: Uuid, id: Uuid) -> Result<models::book::Model, ServiceError> {
        let deleted = self
            .repo
            .delete(owner, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("book"))?;
        info!(book_id = %deleted.id, "book_deleted");
        Ok(deleted)
    }

    /// Move the bookmark. `current_page` must stay within `0..=no_of_pages`;
    /// the derived status/percentage follow from the stored page count.
    pub async fn update_progress(
        &self,
        owner: Uuid,
        id: Uuid,
        current_page: i32,
    ) -> Result<models::book::Model, ServiceError> {
        if current_page < 0 {
            return Err(ServiceError::Validation("current_page must be >= 0".into()));
        }
        let book = self.get(owner, id).await?;
        if current_page > book.no_of_pages {
            return Err(ServiceError::Validation(format!(
                "current_page exceeds total pages ({})",
                book.no_of_pages
            )));
        }
        self.repo
            .set_current_page(owner, id, current_page)
            .await?
            .ok_or_else(|| ServiceError::not_found("book"))
    }

    pub async fn update_rating(
        &self,
        owner: Uuid,
        id: Uuid,
        rating: i16,
    ) -> Result<models::book::Model, ServiceError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(ServiceError::Validation("rating must be between 1 and 5".into()));
        }
        self.repo
            .set_rating(owner, id, rating)
            .await?
            .ok_or_else(|| ServiceError::not_found("book"))
    }
}

fn validate_fields(title: &str, author: &str, no_of_pages: i32) -> Result<(), ServiceError> {
    if title.trim().is_empty() {
        return Err(ServiceError::Validation("title required".into()));
    }
    if author.trim().is_empty() {
        return Err(ServiceError::Validation("author required".into()));
    }
    if no_of_pages <= 0 {
        return Err(ServiceError::Validation("number of pages must be positive".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::repository::mock::MockBookRepository;
    use chrono::NaiveDate;

    fn svc() -> BookService<MockBookRepository> {
        BookService::new(Arc::new(MockBookRepository::default()))
    }

    fn new_book(pages: i32) -> NewBook {
        NewBook {
            title: "Vidas Secas".into(),
            author: "Graciliano Ramos".into(),
            no_of_pages: pages,
            published_at: NaiveDate::from_ymd_opt(1938, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn create_stamps_owner_from_identity() {
        let svc = svc();
        let owner = Uuid::new_v4();
        let created = svc.create(owner, new_book(300)).await.unwrap();
        assert_eq!(created.user_id, owner);
        assert_eq!(created.current_page, 0);
        assert_eq!(created.reading_status(), "want to read");
    }

    #[tokio::test]
    async fn foreign_books_read_as_not_found() {
        let svc = svc();
        let alice = Uuid::new_v4();
        let bruno = Uuid::new_v4();
        let book = svc.create(alice, new_book(300)).await.unwrap();

        let read = svc.get(bruno, book.id).await.unwrap_err();
        assert!(matches!(read, ServiceError::NotFound(_)));

        let update = svc
            .update(
                bruno,
                book.id,
                BookUpdate {
                    title: "X".into(),
                    author: "Y".into(),
                    no_of_pages: 10,
                    published_at: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(update, ServiceError::NotFound(_)));

        let delete = svc.delete(bruno, book.id).await.unwrap_err();
        assert!(matches!(delete, ServiceError::NotFound(_)));

        // A true miss reads the same as the masked foreign access
        let missing = svc.get(alice, Uuid::new_v4()).await.unwrap_err();
        assert_eq!(missing.to_string(), read.to_string());

        // The owner still succeeds
        assert!(svc.get(alice, book.id).await.is_ok());
    }

    #[tokio::test]
    async fn list_only_returns_own_books() {
        let svc = svc();
        let alice = Uuid::new_v4();
        let bruno = Uuid::new_v4();
        let owned = svc.create(alice, new_book(100)).await.unwrap();
        svc.create(bruno, new_book(200)).await.unwrap();

        let books = svc.list(alice).await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, owned.id);
    }

    #[tokio::test]
    async fn progress_drives_status_and_percentage() {
        let svc = svc();
        let owner = Uuid::new_v4();
        let book = svc.create(owner, new_book(300)).await.unwrap();

        let b = svc.update_progress(owner, book.id, 0).await.unwrap();
        assert_eq!((b.reading_status(), b.progress_percent()), ("want to read", 0));

        let b = svc.update_progress(owner, book.id, 150).await.unwrap();
        assert_eq!((b.reading_status(), b.progress_percent()), ("reading", 50));

        let b = svc.update_progress(owner, book.id, 300).await.unwrap();
        assert_eq!((b.reading_status(), b.progress_percent()), ("read", 100));
    }

    #[tokio::test]
    async fn progress_beyond_total_is_rejected() {
        let svc = svc();
        let owner = Uuid::new_v4();
        let book = svc.create(owner, new_book(300)).await.unwrap();

        let err = svc.update_progress(owner, book.id, 400).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = svc.update_progress(owner, book.id, -1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn rating_must_be_one_to_five() {
        let svc = svc();
        let owner = Uuid::new_v4();
        let book = svc.create(owner, new_book(300)).await.unwrap();

        for bad in [0, 6, -3] {
            let err = svc.update_rating(owner, book.id, bad).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)));
        }
        let rated = svc.update_rating(owner, book.id, 5).await.unwrap();
        assert_eq!(rated.rating, Some(5));
    }

    #[tokio::test]
    async fn create_rejects_blank_fields_and_nonpositive_pages() {
        let svc = svc();
        let owner = Uuid::new_v4();

        let mut blank_title = new_book(100);
        blank_title.title = " ".into();
        assert!(svc.create(owner, blank_title).await.is_err());

        assert!(svc.create(owner, new_book(0)).await.is_err());
        assert!(svc.create(owner, new_book(-5)).await.is_err());
    }
}
