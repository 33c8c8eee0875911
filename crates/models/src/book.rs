use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "book")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub author: String,
    pub no_of_pages: i32,
    pub published_at: Date,
    pub current_page: i32,
    pub rating: Option<i16>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    User,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::User => Entity::belongs_to(user::Entity)
                .from(Column::UserId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Reading status derived from progress: untouched, finished, or in between.
    pub fn reading_status(&self) -> &'static str {
        if self.current_page == 0 {
            "want to read"
        } else if self.current_page >= self.no_of_pages {
            "read"
        } else {
            "reading"
        }
    }

    /// Whole-number percentage of pages read. Widened to i64 so large page
    /// counts cannot overflow the multiplication.
    pub fn progress_percent(&self) -> i32 {
        if self.no_of_pages <= 0 {
            return 0;
        }
        (self.current_page as i64 * 100 / self.no_of_pages as i64) as i32
    }
}

/// All books owned by `owner`, oldest first. The owner predicate is part of
/// the query, never applied after the fact.
pub async fn list_for_owner(
    db: &DatabaseConnection,
    owner: Uuid,
) -> Result<Vec<Model>, sea_orm::DbErr> {
    Entity::find()
        .filter(Column::UserId.eq(owner))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await
}

/// One book, only if it belongs to `owner`. A foreign book resolves to `None`
/// exactly like a missing id.
pub async fn find_for_owner(
    db: &DatabaseConnection,
    owner: Uuid,
    id: Uuid,
) -> Result<Option<Model>, sea_orm::DbErr> {
    Entity::find()
        .filter(Column::Id.eq(id))
        .filter(Column::UserId.eq(owner))
        .one(db)
        .await
}

pub async fn create(
    db: &DatabaseConnection,
    owner: Uuid,
    title: &str,
    author: &str,
    no_of_pages: i32,
    published_at: Date,
) -> Result<Model, sea_orm::DbErr> {
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(owner),
        title: Set(title.to_string()),
        author: Set(author.to_string()),
        no_of_pages: Set(no_of_pages),
        published_at: Set(published_at),
        current_page: Set(0),
        rating: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await
}

#[cfg(test)]
mod derivation_tests {
    use super::*;

    fn book(no_of_pages: i32, current_page: i32) -> Model {
        let now = Utc::now().into();
        Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "The Pale King".into(),
            author: "D. F. Wallace".into(),
            no_of_pages,
            published_at: chrono::NaiveDate::from_ymd_opt(2011, 4, 15).unwrap(),
            current_page,
            rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn untouched_book_is_want_to_read() {
        let b = book(300, 0);
        assert_eq!(b.reading_status(), "want to read");
        assert_eq!(b.progress_percent(), 0);
    }

    #[test]
    fn finished_book_is_read() {
        let b = book(300, 300);
        assert_eq!(b.reading_status(), "read");
        assert_eq!(b.progress_percent(), 100);
    }

    #[test]
    fn halfway_book_is_reading() {
        let b = book(300, 150);
        assert_eq!(b.reading_status(), "reading");
        assert_eq!(b.progress_percent(), 50);
    }

    #[test]
    fn percent_truncates_toward_zero() {
        let b = book(3, 1);
        assert_eq!(b.progress_percent(), 33);
    }

    #[test]
    fn percent_survives_very_large_page_counts() {
        let b = book(i32::MAX, i32::MAX - 1);
        assert_eq!(b.progress_percent(), 99);
        let b = book(i32::MAX, i32::MAX);
        assert_eq!(b.progress_percent(), 100);
    }

    #[test]
    fn owner_relation_is_wired_for_joins() {
        use sea_orm::{DbBackend, QueryTrait};

        let book_to_user = Entity::find()
            .find_also_related(user::Entity)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(book_to_user.contains("JOIN"), "{book_to_user}");

        let user_to_book = user::Entity::find()
            .find_also_related(Entity)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(user_to_book.contains("JOIN"), "{user_to_book}");
    }
}
