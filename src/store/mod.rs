//! Storage abstraction for user accounts and refresh token records.
//!
//! The session authority talks to these traits only; what sits behind
//! them (a database, a cache, the in-memory adapter used in tests) is an
//! integration concern. Refresh tokens are keyed by a SHA-256 fingerprint
//! of the token string so the plaintext never reaches storage, and so a
//! lookup key can be computed even for strings that never were valid
//! tokens.

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// SHA-256 hex fingerprint of a refresh token string.
///
/// This is the only form in which a token ever touches the store.
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A user account. Profile fields are absent until the user fills them in.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    /// Normalized (lower-cased, trimmed); unique across the store.
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Server-side record of one issued refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    /// SHA-256 fingerprint of the token string. Primary key.
    pub fingerprint: String,
    /// The token's embedded unique ID, kept for audit trails.
    pub jti: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Replacement profile values. Updates are whole-profile: every field is
/// required, already validated, and overwrites what was there.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub address: String,
}

#[derive(Debug)]
pub enum StoreError {
    /// A uniqueness guarantee was violated (duplicate email).
    Duplicate(String),
    /// The backing store could not be reached or failed mid-operation.
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Duplicate(msg) => write!(f, "Duplicate entry: {}", msg),
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Persistence seam for user accounts.
///
/// Lookups return `Ok(None)` for absent records; `Err` is reserved for
/// store failures.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account with empty profile fields.
    ///
    /// # Errors
    /// Returns `StoreError::Duplicate` if the email is already taken.
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Overwrite the profile fields of the account with this email.
    /// Returns the updated user, or `Ok(None)` if no such account exists.
    async fn update_profile(
        &self,
        email: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, StoreError>;
}

/// Persistence seam for refresh token records.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), StoreError>;

    /// Look up a record by fingerprint, filtering out expired ones.
    /// An expired record is as good as absent.
    async fn find_valid(&self, fingerprint: &str) -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Delete the record with this fingerprint. Returns how many records
    /// were removed (0 or 1); deleting an absent record is not an error.
    async fn delete(&self, fingerprint: &str) -> Result<u64, StoreError>;

    /// Sweep every record whose expiry has passed. Returns the count.
    async fn delete_expired(&self) -> Result<u64, StoreError>;

    /// Drop every record belonging to one user. Returns the count.
    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let token = "some.refresh.token";
        assert_eq!(token_fingerprint(token), token_fingerprint(token));
    }

    #[test]
    fn test_fingerprint_never_echoes_plaintext() {
        let token = "some.refresh.token";
        let fingerprint = token_fingerprint(token);

        assert_ne!(fingerprint, token);
        // SHA-256 hex
        assert_eq!(fingerprint.len(), 64);
        assert!(fingerprint.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_different_tokens_different_fingerprints() {
        assert_ne!(token_fingerprint("token-a"), token_fingerprint("token-b"));
    }

    #[test]
    fn test_fingerprint_works_on_arbitrary_strings() {
        // logout must be able to look up strings that never were tokens
        assert_eq!(token_fingerprint("").len(), 64);
        assert_eq!(token_fingerprint("definitely not a JWT").len(), 64);
    }
}
