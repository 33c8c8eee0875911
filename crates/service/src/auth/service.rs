use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{AuthSession, AuthUser, LoginInput, RegisterInput};
use super::errors::AuthError;
use super::repository::AuthRepository;
use super::token::{self, Claims};
use super::{password, token::DEFAULT_TTL_HOURS};

const MIN_PASSWORD_LEN: usize = 6;

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self { jwt_secret: jwt_secret.into(), token_ttl_hours: DEFAULT_TTL_HOURS }
    }
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self {
        Self { repo, cfg }
    }

    /// Register a new user and issue its first token.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::RegisterInput;
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret"));
    /// let input = RegisterInput { username: "ana".into(), email: "ana@example.com".into(), password: "Secret123".into() };
    /// let session = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(session.user.username, "ana");
    /// assert!(!session.token.is_empty());
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username, email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        models::user::validate_username(&input.username)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        models::user::validate_email(&input.email)
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        if input.password.is_empty() {
            return Err(AuthError::Validation("password required".into()));
        }
        if input.password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation("password too short (>=6)".into()));
        }

        // Pre-check for a friendly error; the schema constraint still
        // decides the winner under concurrent registrations.
        if self
            .repo
            .username_or_email_taken(&input.username, &input.email)
            .await?
        {
            debug!("username or email taken");
            return Err(AuthError::Conflict);
        }

        let digest = password::hash(&input.password)?;
        let user = self
            .repo
            .create_user(&input.username, &input.email, &digest)
            .await?;
        let token = token::issue(&user, &self.cfg.jwt_secret, self.cfg.token_ttl_hours)?;
        info!(user_id = %user.id, username = %user.username, "user_registered");
        Ok(AuthSession { user, token })
    }

    /// Authenticate by email and password and issue a token.
    ///
    /// Unknown email and wrong password both produce [`AuthError::Unauthorized`],
    /// nothing in the result distinguishes the two.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::domain::{RegisterInput, LoginInput};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let svc = AuthService::new(repo, AuthConfig::new("secret"));
    /// let _ = tokio_test::block_on(svc.register(RegisterInput { username: "ana".into(), email: "ana@example.com".into(), password: "Passw0rd".into() }));
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "ana@example.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "ana@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        if input.email.trim().is_empty() || input.password.is_empty() {
            return Err(AuthError::Validation("email and password required".into()));
        }

        let record = self
            .repo
            .find_by_email(&input.email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !password::verify(&input.password, &record.password_hash) {
            warn!(user_id = %record.user.id, "login_password_mismatch");
            return Err(AuthError::Unauthorized);
        }

        let token = token::issue(&record.user, &self.cfg.jwt_secret, self.cfg.token_ttl_hours)?;
        info!(user_id = %record.user.id, "user_logged_in");
        Ok(AuthSession { user: record.user, token })
    }

    /// Fresh profile lookup for an authenticated identity.
    pub async fn profile(&self, user_id: Uuid) -> Result<AuthUser, AuthError> {
        self.repo.find_by_id(user_id).await?.ok_or(AuthError::NotFound)
    }

    /// Resolve a bearer token to its claims.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        token::verify(token, &self.cfg.jwt_secret).map_err(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;
    use crate::auth::token::TokenRejection;

    fn svc() -> AuthService<MockAuthRepository> {
        AuthService::new(Arc::new(MockAuthRepository::default()), AuthConfig::new("test-secret"))
    }

    fn register_input() -> RegisterInput {
        RegisterInput {
            username: "ana".into(),
            email: "ana@example.com".into(),
            password: "Passw0rd".into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_resolves_same_user() {
        let svc = svc();
        let registered = svc.register(register_input()).await.unwrap();

        let session = svc
            .login(LoginInput { email: "ana@example.com".into(), password: "Passw0rd".into() })
            .await
            .unwrap();
        assert_eq!(session.user.id, registered.user.id);

        let claims = svc.verify_token(&session.token).unwrap();
        assert_eq!(claims.sub, registered.user.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let svc = svc();
        svc.register(register_input()).await.unwrap();

        let wrong_password = svc
            .login(LoginInput { email: "ana@example.com".into(), password: "nope".into() })
            .await
            .unwrap_err();
        let unknown_email = svc
            .login(LoginInput { email: "ghost@example.com".into(), password: "nope".into() })
            .await
            .unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AuthError::Unauthorized));
        assert!(matches!(unknown_email, AuthError::Unauthorized));
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let svc = svc();
        svc.register(register_input()).await.unwrap();

        let mut same_username = register_input();
        same_username.email = "other@example.com".into();
        assert!(matches!(svc.register(same_username).await, Err(AuthError::Conflict)));

        let mut same_email = register_input();
        same_email.username = "other".into();
        assert!(matches!(svc.register(same_email).await, Err(AuthError::Conflict)));
    }

    #[tokio::test]
    async fn register_validates_input_shape() {
        let svc = svc();

        let mut short_password = register_input();
        short_password.password = "abc".into();
        assert!(matches!(svc.register(short_password).await, Err(AuthError::Validation(_))));

        let mut bad_email = register_input();
        bad_email.email = "not-an-email".into();
        assert!(matches!(svc.register(bad_email).await, Err(AuthError::Validation(_))));

        let mut blank_username = register_input();
        blank_username.username = "  ".into();
        assert!(matches!(svc.register(blank_username).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn stored_hash_never_matches_other_plaintexts() {
        let svc = svc();
        svc.register(register_input()).await.unwrap();
        let record = svc.repo.find_by_email("ana@example.com").await.unwrap().unwrap();
        assert!(password::verify("Passw0rd", &record.password_hash));
        assert!(!password::verify("Passw0rd ", &record.password_hash));
        assert_ne!(record.password_hash, "Passw0rd");
    }

    #[tokio::test]
    async fn expired_token_is_rejected_with_expired_reason() {
        let repo = Arc::new(MockAuthRepository::default());
        let expired_cfg = AuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: -1 };
        let svc = AuthService::new(repo, expired_cfg);
        let session = svc.register(register_input()).await.unwrap();
        let err = svc.verify_token(&session.token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken(TokenRejection::Expired)));
    }

    #[tokio::test]
    async fn profile_of_unknown_id_is_not_found() {
        let svc = svc();
        assert!(matches!(svc.profile(Uuid::new_v4()).await, Err(AuthError::NotFound)));
    }
}
