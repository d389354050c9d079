pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::DatabaseError;
use crate::types::Role;

pub use password::{hash_password, verify_password};

/// JWT claims. `role` and `school` are informational only: authorization always
/// re-reads them from the user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<Uuid>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(sub: Uuid, role: Role, school: Option<Uuid>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub,
            role,
            school,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingCredential,

    #[error("Authorization header must use Bearer token format")]
    MalformedCredential,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("User no longer exists")]
    UnknownUser,

    #[error("User record is unusable: {0}")]
    InvalidUserRecord(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AuthError {
    /// Whether this is the caller's fault (401) rather than a server failure
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCredential
                | AuthError::MalformedCredential
                | AuthError::InvalidToken(_)
                | AuthError::UnknownUser
                | AuthError::InvalidUserRecord(_)
                | AuthError::InvalidCredentials
        )
    }
}

/// Verifies an opaque bearer token and yields its claims
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HS256 signing and verification keys
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(expiry_hours as i64),
        })
    }

    /// Token lifetime in seconds
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.num_seconds()
    }

    pub fn issue(&self, user_id: Uuid, role: Role, school: Option<Uuid>) -> Result<String, AuthError> {
        self.sign(&Claims::new(user_id, role, school, self.ttl))
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }
}

impl CredentialVerifier for JwtKeys {
    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();
        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}
