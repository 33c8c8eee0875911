use sea_orm::{DatabaseConnection, EntityTrait, SqlErr};
use uuid::Uuid;

use crate::auth::domain::AuthUser;
use crate::auth::errors::AuthError;
use crate::auth::repository::{AuthRepository, UserRecord};

pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmAuthRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
        let res = models::user::find_by_email(&self.db, email)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(|u| {
            let password_hash = u.password_hash.clone();
            UserRecord { user: u.into(), password_hash }
        }))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        let res = models::user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.map(Into::into))
    }

    async fn username_or_email_taken(
        &self,
        username: &str,
        email: &str,
    ) -> Result<bool, AuthError> {
        let res = models::user::find_by_username_or_email(&self.db, username, email)
            .await
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        Ok(res.is_some())
    }

    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<AuthUser, AuthError> {
        match models::user::create(&self.db, username, email, password_hash).await {
            Ok(u) => Ok(u.into()),
            // The schema constraint is the authoritative uniqueness check;
            // a race past the pre-check lands here.
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => Err(AuthError::Conflict),
                _ => Err(AuthError::Repository(e.to_string())),
            },
        }
    }
}
