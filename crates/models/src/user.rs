use chrono::Utc;
use sea_orm::{entity::prelude::*, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    // Never leaves the server in a response body
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {
    Book,
}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Book => Entity::has_many(crate::book::Entity).into(),
        }
    }
}

impl Related<crate::book::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Book.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Basic RFC-shaped check: `local@domain.tld`, no whitespace.
pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    let shaped = || {
        let (local, domain) = email.split_once('@')?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return None;
        }
        let (name, tld) = domain.rsplit_once('.')?;
        if name.is_empty() || tld.is_empty() {
            return None;
        }
        if email.chars().any(char::is_whitespace) {
            return None;
        }
        Some(())
    };
    if shaped().is_none() {
        return Err(errors::ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), errors::ModelError> {
    if username.trim().is_empty() {
        return Err(errors::ModelError::Validation("username required".into()));
    }
    if username.len() > 64 {
        return Err(errors::ModelError::Validation("username too long (<=64)".into()));
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<Model, sea_orm::DbErr> {
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    // Unique violations surface as DbErr so callers can map them to conflicts
    am.insert(db).await
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<Model>, sea_orm::DbErr> {
    Entity::find().filter(Column::Email.eq(email)).one(db).await
}

pub async fn find_by_username_or_email(
    db: &DatabaseConnection,
    username: &str,
    email: &str,
) -> Result<Option<Model>, sea_orm::DbErr> {
    Entity::find()
        .filter(Column::Username.eq(username).or(Column::Email.eq(email)))
        .one(db)
        .await
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    #[test]
    fn accepts_shaped_emails() {
        assert!(validate_email("reader@example.com").is_ok());
        assert!(validate_email("a.b+c@sub.example.org").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in ["", "plain", "no@tld", "two@@at.com", "sp ace@x.com", "@x.com", "a@.com"] {
            assert!(validate_email(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_blank_username() {
        assert!(validate_username("   ").is_err());
        assert!(validate_username("ana").is_ok());
    }
}
