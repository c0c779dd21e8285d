//! Stateless Bearer-token authentication.
//!
//! Tokens are HS256 JWTs signed by the external auth service with a secret
//! shared with this API. [`TokenVerifier`] checks them without touching the
//! database, [`AuthMiddleware`] applies it to every protected route, and
//! [`AuthenticatedUser`] hands the verified identity to handlers.

pub mod extractors;
pub mod middleware;
pub mod token;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use extractors::AuthenticatedUser;
pub use middleware::AuthMiddleware;
pub use token::{Claims, TokenIssuer, TokenVerifier};

/// Opaque identifier of a user, as asserted by a verified token's `sub` claim.
///
/// Task ownership is keyed on this value. It is only ever constructed from a
/// verified token (or by tests), never from request bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reasons a presented credential is refused.
///
/// All of them surface as HTTP 401; the `Display` text doubles as the
/// `detail` string of the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No token was supplied.
    #[error("Missing authentication token")]
    MissingCredential,
    /// The token (or the `Authorization` header carrying it) could not be parsed,
    /// or it lacks a usable subject.
    #[error("Invalid token")]
    MalformedCredential,
    /// The signature does not match under the shared secret.
    #[error("Token signature verification failed")]
    InvalidSignature,
    /// The `exp` claim lies in the past.
    #[error("Token expired")]
    Expired,
}

impl AuthError {
    /// Short label used in server-side logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing",
            AuthError::MalformedCredential => "malformed",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
        }
    }
}
