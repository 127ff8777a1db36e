//! Token minting and verification.
//!
//! One codec instance holds the HMAC keys and the validation rules; it is
//! built once from settings and shared by reference. Verification is
//! strictly stateless: whether a refresh token is still honored is the
//! session authority's business, not the codec's.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, Identity, TokenType};
use crate::configuration::AuthSettings;

/// Why a token failed to mint or verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The current time is at or past the token's expiration.
    Expired,
    /// Bad structure, bad signature, or claims that do not decode.
    Malformed,
    /// Valid signature, but minted for a different issuer or audience.
    WrongIssuerOrAudience,
    /// The requested lifetime cannot produce a representable expiry.
    LifetimeOutOfRange,
    /// Signing failed while minting. A fault of ours, never the caller's.
    Signing(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Expired => write!(f, "JWT token has expired"),
            TokenError::Malformed => write!(f, "Invalid JWT token"),
            TokenError::WrongIssuerOrAudience => {
                write!(f, "JWT token issuer or audience mismatch")
            }
            TokenError::LifetimeOutOfRange => write!(f, "Token lifetime is out of range"),
            TokenError::Signing(msg) => write!(f, "Token generation failed: {}", msg),
        }
    }
}

impl std::error::Error for TokenError {}

/// A freshly minted token plus the metadata the caller needs to track it.
#[derive(Debug, Clone)]
pub struct MintedToken {
    pub token: String,
    /// Set for refresh tokens, `None` for access tokens.
    pub jti: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
}

impl TokenCodec {
    pub fn new(settings: &AuthSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&settings.issuer]);
        validation.set_audience(&[&settings.audience]);
        // A token is dead the instant its expiry is reached; the library's
        // default 60s grace window would keep it alive past that.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
        }
    }

    /// Mint a token of the given tier for an identity.
    ///
    /// Refresh tokens get a fresh random `jti`; access tokens do not.
    /// The TTL is taken as-is; minting an already-expired token is legal
    /// and verification will reject it.
    ///
    /// # Errors
    /// * `TokenError::LifetimeOutOfRange` if the TTL cannot be turned into
    ///   a representable expiry timestamp
    /// * `TokenError::Signing` if the HMAC signing step fails
    pub fn mint(
        &self,
        identity: &Identity,
        token_type: TokenType,
        ttl_seconds: i64,
    ) -> Result<MintedToken, TokenError> {
        let issued_at = Utc::now();
        // TTLs come straight from client payloads and can be anything an
        // i64 holds.
        let expires_at = Duration::try_seconds(ttl_seconds)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or(TokenError::LifetimeOutOfRange)?;
        let jti = match token_type {
            TokenType::Refresh => Some(Uuid::new_v4().to_string()),
            TokenType::Access => None,
        };

        let claims = Claims {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            token_type,
            jti: jti.clone(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(MintedToken {
            token,
            jti,
            issued_at,
            expires_at,
        })
    }

    /// Verify signature, expiry, issuer and audience, and return the
    /// decoded claims. Callers are responsible for checking the type tag
    /// against the operation they are gating.
    ///
    /// # Errors
    /// * `TokenError::Expired` if the current time is at or past `exp`
    /// * `TokenError::WrongIssuerOrAudience` on issuer/audience mismatch
    /// * `TokenError::Malformed` for everything else
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
                    TokenError::WrongIssuerOrAudience
                }
                _ => TokenError::Malformed,
            }
        })?;

        // The library only rejects exp strictly before now; a token at
        // exactly its expiry second must already be dead.
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}
