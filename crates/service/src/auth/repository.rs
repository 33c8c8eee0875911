use async_trait::async_trait;
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::AuthError;

/// A stored user together with its password digest. Only the auth service
/// ever sees the digest; it is stripped before anything crosses the wire.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub user: AuthUser,
    pub password_hash: String,
}

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn username_or_email_taken(&self, username: &str, email: &str)
        -> Result<bool, AuthError>;

    /// Persist a new user. Implementations must enforce uniqueness of
    /// username and email at the store level and report races as
    /// [`AuthError::Conflict`].
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<AuthUser, AuthError>;
}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct MockAuthRepository {
        users: Mutex<HashMap<Uuid, UserRecord>>,
    }

    #[async_trait]
    impl AuthRepository for MockAuthRepository {
        async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.values().find(|r| r.user.email == email).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users.get(&id).map(|r| r.user.clone()))
        }

        async fn username_or_email_taken(
            &self,
            username: &str,
            email: &str,
        ) -> Result<bool, AuthError> {
            let users = self.users.lock().unwrap();
            Ok(users
                .values()
                .any(|r| r.user.username == username || r.user.email == email))
        }

        async fn create_user(
            &self,
            username: &str,
            email: &str,
            password_hash: &str,
        ) -> Result<AuthUser, AuthError> {
            let mut users = self.users.lock().unwrap();
            if users
                .values()
                .any(|r| r.user.username == username || r.user.email == email)
            {
                return Err(AuthError::Conflict);
            }
            let now = Utc::now().into();
            let user = AuthUser {
                id: Uuid::new_v4(),
                username: username.to_string(),
                email: email.to_string(),
                created_at: now,
                updated_at: now,
            };
            users.insert(
                user.id,
                UserRecord { user: user.clone(), password_hash: password_hash.to_string() },
            );
            Ok(user)
        }
    }
}
