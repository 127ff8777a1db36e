//! Unified error type for every session and authorization operation.
//!
//! Domain-specific errors (`TokenError`, `StoreError`, `ValidationError`)
//! are defined next to the code that produces them; this module folds them
//! into the single `AuthError` that all public operations return.

use std::error::Error as StdError;
use std::fmt;

use crate::auth::TokenError;
use crate::store::StoreError;
use crate::validators::ValidationError;

/// Central error type returned by the session authority.
///
/// Invalid credentials are reported identically whether the email was
/// unknown or the password was wrong, so callers cannot probe which
/// accounts exist.
#[derive(Debug)]
pub enum AuthError {
    /// Unknown email or wrong password. Deliberately indistinguishable.
    InvalidCredentials,
    /// Registration hit an email that already has an account.
    AlreadyExists,
    /// The user referenced by a profile operation does not exist.
    NotFound,
    /// An authenticated caller tried to change someone else's profile.
    Forbidden,
    /// A refresh operation was invoked without a refresh token.
    MissingCredential,
    /// The token verified fine but is the wrong kind for this operation.
    WrongType,
    /// The presented refresh token has no live record in the store: it was
    /// revoked by logout, swept as expired, or never issued by us.
    SessionRevoked,
    /// The token itself failed verification.
    Token(TokenError),
    /// One or more input fields violated validation rules; every violated
    /// rule is carried, not just the first.
    ValidationFailed(Vec<ValidationError>),
    /// The backing store failed.
    Store(StoreError),
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::AlreadyExists => write!(f, "User already exists"),
            AuthError::NotFound => write!(f, "User not found"),
            AuthError::Forbidden => write!(f, "Forbidden"),
            AuthError::MissingCredential => write!(f, "Refresh token is required"),
            AuthError::WrongType => write!(f, "Invalid token type"),
            AuthError::SessionRevoked => write!(f, "Invalid refresh token"),
            AuthError::Token(e) => write!(f, "{}", e),
            AuthError::ValidationFailed(errors) => {
                let joined = errors
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}", joined)
            }
            AuthError::Store(e) => write!(f, "{}", e),
            AuthError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AuthError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AuthError::Token(e) => Some(e),
            AuthError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            // Signing failures are faults of ours, not of the caller's token.
            TokenError::Signing(msg) => AuthError::Internal(msg),
            other => AuthError::Token(other),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Store(err)
    }
}

impl From<Vec<ValidationError>> for AuthError {
    fn from(errors: Vec<ValidationError>) -> Self {
        AuthError::ValidationFailed(errors)
    }
}
