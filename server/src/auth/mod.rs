//! Caller authentication.
//!
//! Access tokens are minted by the hosted auth platform and validated here
//! against its HS256 secret. Role checks read the caller's role set from the
//! user directory.

mod extractor;
mod jwt;

pub use extractor::{require_admin, AuthUser};
pub use jwt::{Claims, JwtValidator};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Authorization header must use the Bearer scheme")]
    MalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("Token subject is not a user id")]
    InvalidSubject,
}
