use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::domain::AuthUser;
use super::errors::AuthError;

/// Fixed TTL of the primary token when no override is configured.
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Claims embedded in the bearer token. Verification needs nothing but the
/// token and the server secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Why a presented token was rejected. The reasons stay distinct for
/// logging even though clients see a single generic rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Malformed,
    InvalidSignature,
    Expired,
}

impl fmt::Display for TokenRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenRejection::Malformed => write!(f, "malformed"),
            TokenRejection::InvalidSignature => write!(f, "invalid signature"),
            TokenRejection::Expired => write!(f, "expired"),
        }
    }
}

/// Sign a token for `user`, expiring `ttl_hours` from now.
pub fn issue(user: &AuthUser, secret: &str, ttl_hours: i64) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenError(e.to_string()))
}

/// Verify signature and expiry; pure function of token and secret.
pub fn verify(token: &str, secret: &str) -> Result<Claims, TokenRejection> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    ) {
        Ok(data) => Ok(data.claims),
        Err(e) => Err(match e.kind() {
            ErrorKind::ExpiredSignature => TokenRejection::Expired,
            ErrorKind::InvalidSignature => TokenRejection::InvalidSignature,
            _ => TokenRejection::Malformed,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> AuthUser {
        let now = Utc::now().into();
        AuthUser {
            id: Uuid::new_v4(),
            username: "ana".into(),
            email: "ana@example.com".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn issued_token_resolves_to_subject() {
        let user = sample_user();
        let token = issue(&user, "secret", DEFAULT_TTL_HOURS).unwrap();
        let claims = verify(&token, "secret").unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.exp - claims.iat, DEFAULT_TTL_HOURS * 3600);
    }

    #[test]
    fn wrong_secret_is_signature_mismatch() {
        let token = issue(&sample_user(), "secret", DEFAULT_TTL_HOURS).unwrap();
        assert_eq!(
            verify(&token, "other-secret").unwrap_err(),
            TokenRejection::InvalidSignature
        );
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let token = issue(&sample_user(), "secret", -1).unwrap();
        assert_eq!(verify(&token, "secret").unwrap_err(), TokenRejection::Expired);
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(
            verify("not.a.jwt", "secret").unwrap_err(),
            TokenRejection::Malformed
        );
        assert_eq!(verify("", "secret").unwrap_err(), TokenRejection::Malformed);
    }
}
