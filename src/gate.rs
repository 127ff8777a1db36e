//! Authorization gates.
//!
//! Three entry points cover the three protection levels an operation can
//! have: `mandatory` (a valid access token or nothing), `optional`
//! (anonymous callers pass through, bad credentials still fail), and
//! `refresh_only` (a valid refresh token, for the token-refresh path).
//! Gates are pure decision functions over an already-extracted header or
//! field value; they never touch the store, so a revoked-but-unexpired
//! access token still passes. That is the accepted trade-off of
//! stateless access tokens: revocation bites at the next refresh.

use crate::auth::{Identity, TokenCodec, TokenError, TokenType};

/// Why a credential was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No credential was presented where one is required.
    MissingCredential,
    /// The header did not follow the exact `Bearer <token>` form.
    MalformedCredential,
    /// A well-formed, verified token of the wrong tier.
    WrongType,
    Expired,
    /// Bad signature or undecodable claims.
    Invalid,
    WrongIssuerOrAudience,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::MissingCredential => write!(f, "no credential was provided"),
            RejectReason::MalformedCredential => write!(f, "authorization header is malformed"),
            RejectReason::WrongType => write!(f, "invalid token type"),
            RejectReason::Expired => write!(f, "token has expired"),
            RejectReason::Invalid => write!(f, "token is invalid"),
            RejectReason::WrongIssuerOrAudience => {
                write!(f, "token issuer or audience mismatch")
            }
        }
    }
}

/// Outcome of a gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Authenticated {
        identity: Identity,
        /// The refresh token's ID when the refresh gate admitted it;
        /// `None` for access tokens.
        jti: Option<String>,
    },
    /// No credential, on a route where that is allowed.
    Anonymous,
    Rejected(RejectReason),
}

impl AuthDecision {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthDecision::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }
}

/// Pull the token out of a `Bearer <token>` header value.
///
/// Exactly two space-separated parts and the first must be the literal
/// `Bearer`; anything else (wrong scheme, extra parts, empty token) is
/// malformed.
fn extract_bearer(header: &str) -> Option<&str> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) if !token.is_empty() => Some(token),
        _ => None,
    }
}

fn reject_reason(err: TokenError) -> RejectReason {
    match err {
        TokenError::Expired => RejectReason::Expired,
        TokenError::WrongIssuerOrAudience => RejectReason::WrongIssuerOrAudience,
        _ => RejectReason::Invalid,
    }
}

fn verify_access(codec: &TokenCodec, token: &str) -> AuthDecision {
    let claims = match codec.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "Access token rejected");
            return AuthDecision::Rejected(reject_reason(e));
        }
    };

    if claims.token_type != TokenType::Access {
        tracing::warn!(presented = %claims.token_type, "Non-access token presented at an access gate");
        return AuthDecision::Rejected(RejectReason::WrongType);
    }

    match claims.identity() {
        Ok(identity) => AuthDecision::Authenticated {
            identity,
            jti: None,
        },
        Err(_) => AuthDecision::Rejected(RejectReason::Invalid),
    }
}

/// Gate for operations that require an authenticated caller.
///
/// `authorization` is the raw `Authorization` header value, if the
/// request carried one. An empty or whitespace-only header counts as
/// absent.
pub fn mandatory(codec: &TokenCodec, authorization: Option<&str>) -> AuthDecision {
    let Some(header) = authorization.filter(|h| !h.trim().is_empty()) else {
        return AuthDecision::Rejected(RejectReason::MissingCredential);
    };
    let Some(token) = extract_bearer(header) else {
        return AuthDecision::Rejected(RejectReason::MalformedCredential);
    };
    verify_access(codec, token)
}

/// Gate for operations that serve both anonymous and authenticated
/// callers. No credential means `Anonymous`; a presented credential is
/// held to exactly the same standard as at a mandatory gate, so a bad
/// token is rejected, never downgraded to anonymous.
pub fn optional(codec: &TokenCodec, authorization: Option<&str>) -> AuthDecision {
    let Some(header) = authorization.filter(|h| !h.trim().is_empty()) else {
        return AuthDecision::Anonymous;
    };
    let Some(token) = extract_bearer(header) else {
        return AuthDecision::Rejected(RejectReason::MalformedCredential);
    };
    verify_access(codec, token)
}

/// Gate for the refresh path. Takes the refresh token string itself
/// (carried in the request body, not in a header) and admits only
/// verified refresh-type tokens, exposing their `jti`.
///
/// Store consultation is the session authority's job; this gate only
/// answers whether the token is cryptographically ours.
pub fn refresh_only(codec: &TokenCodec, refresh_token: Option<&str>) -> AuthDecision {
    let Some(token) = refresh_token.map(str::trim).filter(|t| !t.is_empty()) else {
        return AuthDecision::Rejected(RejectReason::MissingCredential);
    };

    let claims = match codec.verify(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!(error = %e, "Refresh token rejected");
            return AuthDecision::Rejected(reject_reason(e));
        }
    };

    if claims.token_type != TokenType::Refresh {
        tracing::warn!(presented = %claims.token_type, "Non-refresh token presented at the refresh gate");
        return AuthDecision::Rejected(RejectReason::WrongType);
    }

    match claims.identity() {
        Ok(identity) => AuthDecision::Authenticated {
            identity,
            jti: claims.jti,
        },
        Err(_) => AuthDecision::Rejected(RejectReason::Invalid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::AuthSettings;
    use uuid::Uuid;

    fn test_settings() -> AuthSettings {
        AuthSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 600,
            refresh_token_expiry: 86_400,
            issuer: "test-issuer".to_string(),
            audience: "test-audience".to_string(),
            bcrypt_cost: 4,
        }
    }

    fn test_identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
        }
    }

    fn bearer_header(codec: &TokenCodec, token_type: TokenType, ttl: i64) -> (Identity, String) {
        let identity = test_identity();
        let minted = codec
            .mint(&identity, token_type, ttl)
            .expect("Failed to mint token");
        (identity, format!("Bearer {}", minted.token))
    }

    #[test]
    fn test_mandatory_accepts_valid_access_token() {
        let codec = TokenCodec::new(&test_settings());
        let (identity, header) = bearer_header(&codec, TokenType::Access, 600);

        let decision = mandatory(&codec, Some(&header));
        match decision {
            AuthDecision::Authenticated {
                identity: resolved,
                jti,
            } => {
                assert_eq!(resolved, identity);
                assert!(jti.is_none());
            }
            other => panic!("Expected Authenticated, got {:?}", other),
        }
    }

    #[test]
    fn test_mandatory_rejects_missing_header() {
        let codec = TokenCodec::new(&test_settings());

        assert_eq!(
            mandatory(&codec, None),
            AuthDecision::Rejected(RejectReason::MissingCredential)
        );
        // an empty header value counts as absent
        assert_eq!(
            mandatory(&codec, Some("")),
            AuthDecision::Rejected(RejectReason::MissingCredential)
        );
    }

    #[test]
    fn test_mandatory_rejects_malformed_headers() {
        let codec = TokenCodec::new(&test_settings());
        let (_, header) = bearer_header(&codec, TokenType::Access, 600);
        let token = header.trim_start_matches("Bearer ").to_string();

        let malformed = vec![
            token.clone(),                    // no scheme at all
            format!("bearer {}", token),      // lowercase scheme
            format!("Basic {}", token),       // wrong scheme
            format!("Bearer {} extra", token), // trailing junk
            "Bearer".to_string(),             // scheme without token
            "Bearer ".to_string(),            // scheme with empty token
        ];
        for header in malformed {
            assert_eq!(
                mandatory(&codec, Some(&header)),
                AuthDecision::Rejected(RejectReason::MalformedCredential),
                "header {:?} should be malformed",
                header
            );
        }
    }

    #[test]
    fn test_mandatory_rejects_expired_token() {
        let codec = TokenCodec::new(&test_settings());
        let (_, header) = bearer_header(&codec, TokenType::Access, -30);

        assert_eq!(
            mandatory(&codec, Some(&header)),
            AuthDecision::Rejected(RejectReason::Expired)
        );
    }

    #[test]
    fn test_mandatory_rejects_garbage_token() {
        let codec = TokenCodec::new(&test_settings());

        assert_eq!(
            mandatory(&codec, Some("Bearer not.a.token")),
            AuthDecision::Rejected(RejectReason::Invalid)
        );
    }

    #[test]
    fn test_mandatory_rejects_refresh_token() {
        let codec = TokenCodec::new(&test_settings());
        let (_, header) = bearer_header(&codec, TokenType::Refresh, 600);

        assert_eq!(
            mandatory(&codec, Some(&header)),
            AuthDecision::Rejected(RejectReason::WrongType)
        );
    }

    #[test]
    fn test_mandatory_rejects_foreign_issuer() {
        let mut foreign = test_settings();
        foreign.issuer = "someone-elses-service".to_string();
        let foreign_codec = TokenCodec::new(&foreign);
        let (_, header) = bearer_header(&foreign_codec, TokenType::Access, 600);

        let codec = TokenCodec::new(&test_settings());
        assert_eq!(
            mandatory(&codec, Some(&header)),
            AuthDecision::Rejected(RejectReason::WrongIssuerOrAudience)
        );
    }

    #[test]
    fn test_optional_admits_anonymous() {
        let codec = TokenCodec::new(&test_settings());

        assert_eq!(optional(&codec, None), AuthDecision::Anonymous);
        assert_eq!(optional(&codec, Some("")), AuthDecision::Anonymous);
        assert_eq!(optional(&codec, Some("   ")), AuthDecision::Anonymous);
    }

    #[test]
    fn test_optional_still_rejects_bad_credentials() {
        let codec = TokenCodec::new(&test_settings());

        // a presented credential must be valid; it does not fall back to anonymous
        assert_eq!(
            optional(&codec, Some("Basic abc")),
            AuthDecision::Rejected(RejectReason::MalformedCredential)
        );
        assert_eq!(
            optional(&codec, Some("Bearer not.a.token")),
            AuthDecision::Rejected(RejectReason::Invalid)
        );

        let (_, expired) = bearer_header(&codec, TokenType::Access, -30);
        assert_eq!(
            optional(&codec, Some(&expired)),
            AuthDecision::Rejected(RejectReason::Expired)
        );
    }

    #[test]
    fn test_optional_authenticates_valid_token() {
        let codec = TokenCodec::new(&test_settings());
        let (identity, header) = bearer_header(&codec, TokenType::Access, 600);

        let decision = optional(&codec, Some(&header));
        assert_eq!(decision.identity(), Some(&identity));
    }

    #[test]
    fn test_refresh_gate_exposes_jti() {
        let codec = TokenCodec::new(&test_settings());
        let identity = test_identity();
        let minted = codec
            .mint(&identity, TokenType::Refresh, 3600)
            .expect("Failed to mint token");

        let decision = refresh_only(&codec, Some(&minted.token));
        match decision {
            AuthDecision::Authenticated {
                identity: resolved,
                jti,
            } => {
                assert_eq!(resolved, identity);
                assert_eq!(jti, minted.jti);
                assert!(jti.is_some());
            }
            other => panic!("Expected Authenticated, got {:?}", other),
        }
    }

    #[test]
    fn test_refresh_gate_rejects_access_token() {
        let codec = TokenCodec::new(&test_settings());
        let minted = codec
            .mint(&test_identity(), TokenType::Access, 600)
            .expect("Failed to mint token");

        assert_eq!(
            refresh_only(&codec, Some(&minted.token)),
            AuthDecision::Rejected(RejectReason::WrongType)
        );
    }

    #[test]
    fn test_refresh_gate_rejects_missing_and_expired() {
        let codec = TokenCodec::new(&test_settings());

        assert_eq!(
            refresh_only(&codec, None),
            AuthDecision::Rejected(RejectReason::MissingCredential)
        );
        assert_eq!(
            refresh_only(&codec, Some("")),
            AuthDecision::Rejected(RejectReason::MissingCredential)
        );

        let minted = codec
            .mint(&test_identity(), TokenType::Refresh, -30)
            .expect("Failed to mint token");
        assert_eq!(
            refresh_only(&codec, Some(&minted.token)),
            AuthDecision::Rejected(RejectReason::Expired)
        );
    }
}
