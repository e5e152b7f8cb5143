//! JWT token handling
//!
//! Access tokens are signed with HS256 and carry the user id, role and a
//! token version; bumping `users.token_version` invalidates everything
//! outstanding for that user.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::db::entities::user::Role;
use crate::types::LyceumError;

/// Payload stored in JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Role granted at issue time
    pub role: Role,
    /// Token version at issue time
    pub version: i32,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Input for creating a new token
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub version: i32,
}

/// JWT validator and generator
#[derive(Clone)]
pub struct JwtValidator {
    secret: String,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a new JWT validator
    ///
    /// Returns an error if the secret is empty or too short.
    pub fn new(secret: String, expiry_seconds: u64) -> Result<Self, LyceumError> {
        if secret.is_empty() {
            return Err(LyceumError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }
        if secret.len() < 32 {
            return Err(LyceumError::Config(
                "JWT_SECRET must be at least 32 characters".into(),
            ));
        }

        Ok(Self {
            secret,
            expiry_seconds,
        })
    }

    /// Create a validator for dev mode (fixed secret)
    pub fn new_dev() -> Self {
        Self {
            secret: "dev-mode-secret-not-for-production-use-123456".into(),
            expiry_seconds: 3600,
        }
    }

    /// Generate a signed token
    pub fn generate_token(&self, input: TokenInput) -> Result<String, LyceumError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| LyceumError::Internal(format!("System clock error: {}", e)))?
            .as_secs();

        let claims = Claims {
            sub: input.user_id,
            email: input.email,
            role: input.role,
            version: input.version,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(Into::into)
    }

    /// Validate a token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, LyceumError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

/// Extract a bearer token from an Authorization header value
pub fn extract_token_from_header(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> JwtValidator {
        JwtValidator::new_dev()
    }

    fn input() -> TokenInput {
        TokenInput {
            user_id: Uuid::new_v4(),
            email: "learner@example.com".into(),
            role: Role::User,
            version: 1,
        }
    }

    #[test]
    fn test_round_trip() {
        let jwt = validator();
        let input = input();
        let token = jwt.generate_token(input.clone()).unwrap();
        let claims = jwt.validate_token(&token).unwrap();

        assert_eq!(claims.sub, input.user_id);
        assert_eq!(claims.email, input.email);
        assert!(!claims.is_admin());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = validator().generate_token(input()).unwrap();
        let other = JwtValidator::new(
            "another-secret-that-is-also-32-chars-long!".into(),
            3600,
        )
        .unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtValidator::new("short".into(), 3600).is_err());
        assert!(JwtValidator::new(String::new(), 3600).is_err());
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_token_from_header("bearer abc123"), Some("abc123"));
        assert_eq!(extract_token_from_header("Basic abc123"), None);
        assert_eq!(extract_token_from_header("Bearer "), None);
    }
}
