//! JWT claims payload (RFC 7519) carried by both token tiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::codec::TokenError;

/// The authenticated principal a verified token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// Which tier a token belongs to. The tag is fixed at mint time and
/// checked on every use; an access token can never be replayed as a
/// refresh token or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Token payload.
///
/// `jti` is present on refresh tokens only; access tokens are not
/// individually tracked and carry no identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub email: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Resolve the subject into a typed identity.
    ///
    /// # Errors
    /// Returns `TokenError::Malformed` if the subject is not a valid UUID.
    pub fn identity(&self) -> Result<Identity, TokenError> {
        let id = Uuid::parse_str(&self.sub).map_err(|_| {
            tracing::warn!("Token subject is not a valid UUID");
            TokenError::Malformed
        })?;
        Ok(Identity {
            id,
            email: self.email.clone(),
        })
    }
}
