//! Session lifecycle: registration, login, token refresh, logout, and
//! profile access.
//!
//! `SessionAuthority` owns the policy; transports stay thin. It talks to
//! storage through the `store` traits and never sees a database, and it
//! hands out tokens through the codec and never sees raw key material
//! twice. Password hashing runs on the blocking pool so a burst of
//! logins cannot stall the async runtime.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::{hash_password, verify_password, Identity, TokenCodec, TokenType};
use crate::configuration::AuthSettings;
use crate::error::AuthError;
use crate::store::{
    token_fingerprint, ProfileUpdate, RefreshTokenRecord, RefreshTokenStore, StoreError, User,
    UserStore,
};
use crate::validators::{self, ValidationError};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login accepts optional per-session lifetime overrides, mainly so
/// tests and short-lived tooling can issue tokens that expire quickly.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(rename = "bearerExpiresInSeconds")]
    pub bearer_expires_in: Option<i64>,
    #[serde(rename = "refreshExpiresInSeconds")]
    pub refresh_expires_in: Option<i64>,
}

#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize)]
pub struct LogoutRequest {
    #[serde(rename = "refreshToken")]
    pub refresh_token: Option<String>,
}

/// Whole-profile replacement. All four fields are required; fields are
/// optional here only so their absence can be reported as a validation
/// error rather than a deserialization failure.
#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub dob: Option<String>,
    pub address: Option<String>,
}

/// One issued token with the metadata a client needs to use it.
#[derive(Debug, Serialize)]
pub struct TokenEnvelope {
    pub token: String,
    pub token_type: String,
    /// Seconds until expiry, echoing what was applied at mint time.
    pub expires_in: i64,
}

/// The pair a successful login produces.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    #[serde(rename = "bearerToken")]
    pub bearer: TokenEnvelope,
    #[serde(rename = "refreshToken")]
    pub refresh: TokenEnvelope,
}

/// What registration returns. Deliberately token-free: a new account
/// still has to log in.
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub id: String,
    pub email: String,
}

/// A profile as seen by some viewer. Owners get the whole record;
/// everyone else gets the public subset, with `dob` and `address` not
/// just nulled but absent.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProfileView {
    Public {
        email: String,
        #[serde(rename = "firstName")]
        first_name: Option<String>,
        #[serde(rename = "lastName")]
        last_name: Option<String>,
    },
    Owner {
        email: String,
        #[serde(rename = "firstName")]
        first_name: Option<String>,
        #[serde(rename = "lastName")]
        last_name: Option<String>,
        dob: Option<String>,
        address: Option<String>,
    },
}

fn public_view(user: &User) -> ProfileView {
    ProfileView::Public {
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
    }
}

fn owner_view(user: &User) -> ProfileView {
    ProfileView::Owner {
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        dob: user.dob.map(|d| d.format("%Y-%m-%d").to_string()),
        address: user.address.clone(),
    }
}

/// The one place session decisions are made.
pub struct SessionAuthority {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn RefreshTokenStore>,
    codec: TokenCodec,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    bcrypt_cost: u32,
}

impl SessionAuthority {
    pub fn new(
        settings: &AuthSettings,
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        Self {
            users,
            tokens,
            codec: TokenCodec::new(settings),
            access_token_expiry: settings.access_token_expiry,
            refresh_token_expiry: settings.refresh_token_expiry,
            bcrypt_cost: settings.bcrypt_cost,
        }
    }

    /// The codec this authority mints with. Authorization gates share it
    /// so they verify against the same keys and rules.
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create a new account.
    ///
    /// Email and password are validated together and every violated rule
    /// is reported. The email is stored normalized; the password is
    /// hashed on the blocking pool and the plaintext is dropped.
    ///
    /// # Errors
    /// * `AuthError::ValidationFailed` listing all violated field rules
    /// * `AuthError::AlreadyExists` if the email already has an account
    pub async fn register(&self, request: RegisterRequest) -> Result<RegisteredUser, AuthError> {
        let email_result = validators::validate_email(request.email.as_deref());
        let password_result = validators::validate_password(request.password.as_deref());

        let (email, password) = match (email_result, password_result) {
            (Ok(email), Ok(password)) => (email, password),
            (email_result, password_result) => {
                let mut errors = Vec::new();
                if let Err(e) = email_result {
                    errors.extend(e);
                }
                if let Err(e) = password_result {
                    errors.extend(e);
                }
                return Err(AuthError::ValidationFailed(errors));
            }
        };

        if self.users.find_by_email(&email).await?.is_some() {
            tracing::warn!("Registration attempt for an email that already exists");
            return Err(AuthError::AlreadyExists);
        }

        let cost = self.bcrypt_cost;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))??;

        // the store's uniqueness guarantee backstops the pre-check above
        let user = self
            .users
            .insert_user(&email, &password_hash)
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AuthError::AlreadyExists,
                other => AuthError::Store(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered successfully");
        Ok(RegisteredUser {
            id: user.id.to_string(),
            email: user.email,
        })
    }

    /// Authenticate and open a session.
    ///
    /// Unknown email and wrong password produce the same
    /// `AuthError::InvalidCredentials`; nothing in the result reveals
    /// whether the account exists.
    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AuthError> {
        let mut errors = Vec::new();
        let email = match request.email.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(validators::normalize_email(value)),
            _ => {
                errors.push(ValidationError::Required("email"));
                None
            }
        };
        let password = match request.password.as_deref() {
            Some(value) if !value.is_empty() => Some(value.to_string()),
            _ => {
                errors.push(ValidationError::Required("password"));
                None
            }
        };
        let (Some(email), Some(password)) = (email, password) else {
            return Err(AuthError::ValidationFailed(errors));
        };

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                tracing::warn!("Login attempt for unknown email");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let stored_hash = user.password_hash.clone();
        let password_ok =
            tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
                .await
                .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))??;
        if !password_ok {
            tracing::warn!(user_id = %user.id, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let bearer_expiry = request.bearer_expires_in.unwrap_or(self.access_token_expiry);
        let refresh_expiry = request
            .refresh_expires_in
            .unwrap_or(self.refresh_token_expiry);

        let identity = Identity {
            id: user.id,
            email: user.email.clone(),
        };
        let access = self.codec.mint(&identity, TokenType::Access, bearer_expiry)?;
        let refresh = self
            .codec
            .mint(&identity, TokenType::Refresh, refresh_expiry)?;
        let jti = refresh
            .jti
            .clone()
            .ok_or_else(|| AuthError::Internal("Refresh token minted without a jti".to_string()))?;

        self.tokens
            .insert(RefreshTokenRecord {
                fingerprint: token_fingerprint(&refresh.token),
                jti: jti.clone(),
                user_id: user.id,
                expires_at: refresh.expires_at,
                created_at: refresh.issued_at,
            })
            .await?;

        tracing::info!(user_id = %user.id, jti = %jti, "User logged in successfully");
        Ok(TokenPair {
            bearer: TokenEnvelope {
                token: access.token,
                token_type: "Bearer".to_string(),
                expires_in: bearer_expiry,
            },
            refresh: TokenEnvelope {
                token: refresh.token,
                token_type: "Refresh".to_string(),
                expires_in: refresh_expiry,
            },
        })
    }

    /// Trade a live refresh token for a fresh access token.
    ///
    /// The token must verify as refresh-type *and* still have a live
    /// record in the store; a token revoked by logout is turned away no
    /// matter how much validity its signature claims. The refresh token
    /// itself is left untouched and stays valid until it expires or is
    /// revoked.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<TokenEnvelope, AuthError> {
        let token = match request.refresh_token.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => return Err(AuthError::MissingCredential),
        };

        let claims = self.codec.verify(token)?;
        if claims.token_type != TokenType::Refresh {
            tracing::warn!(presented = %claims.token_type, "Refresh attempted with a non-refresh token");
            return Err(AuthError::WrongType);
        }

        let record = self
            .tokens
            .find_valid(&token_fingerprint(token))
            .await?
            .ok_or_else(|| {
                tracing::warn!("Refresh attempted with a token that has no live record");
                AuthError::SessionRevoked
            })?;

        let identity = claims.identity()?;
        let access = self
            .codec
            .mint(&identity, TokenType::Access, self.access_token_expiry)?;

        tracing::info!(user_id = %record.user_id, jti = %record.jti, "Access token refreshed");
        Ok(TokenEnvelope {
            token: access.token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Close a session by revoking its refresh token.
    ///
    /// Total over its input: expired, malformed, foreign, or
    /// never-stored tokens all log out cleanly, because the store lookup
    /// key is a fingerprint of the raw string. Verification runs only to
    /// enrich the logs. The operation is idempotent; only a missing
    /// token field or a store failure is an error.
    pub async fn logout(&self, request: LogoutRequest) -> Result<(), AuthError> {
        let token = match request.refresh_token.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => value,
            _ => {
                return Err(AuthError::ValidationFailed(vec![ValidationError::Required(
                    "refreshToken",
                )]))
            }
        };

        match self.codec.verify(token) {
            Ok(claims) if claims.token_type != TokenType::Refresh => {
                tracing::warn!(presented = %claims.token_type, "Logout called with a non-refresh token");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::info!(error = %e, "Logout token failed verification; revoking anyway");
            }
        }

        let deleted = self.tokens.delete(&token_fingerprint(token)).await?;
        if deleted == 0 {
            tracing::info!("Logout for a token with no stored record");
        } else {
            tracing::info!("Session revoked");
        }
        Ok(())
    }

    /// Revoke every live session of one user at once.
    pub async fn logout_all(&self, identity: &Identity) -> Result<u64, AuthError> {
        let removed = self.tokens.delete_all_for_user(identity.id).await?;
        tracing::info!(user_id = %identity.id, removed, "All sessions revoked");
        Ok(removed)
    }

    /// Sweep expired refresh token records out of the store. Intended to
    /// run periodically; expired records are already unusable, this just
    /// reclaims the space.
    pub async fn purge_expired(&self) -> Result<u64, AuthError> {
        let removed = self.tokens.delete_expired().await?;
        if removed > 0 {
            tracing::info!(removed, "Expired refresh token records purged");
        }
        Ok(removed)
    }

    /// Fetch a profile as seen by `viewer` (the outcome of an optional
    /// gate; `None` means anonymous). Owners see everything, everyone
    /// else the public subset.
    ///
    /// # Errors
    /// Returns `AuthError::NotFound` if no account has this email.
    pub async fn profile(
        &self,
        email: &str,
        viewer: Option<&Identity>,
    ) -> Result<ProfileView, AuthError> {
        let normalized = validators::normalize_email(email);
        let user = self
            .users
            .find_by_email(&normalized)
            .await?
            .ok_or(AuthError::NotFound)?;

        let is_owner =
            viewer.map_or(false, |v| validators::normalize_email(&v.email) == normalized);
        if is_owner {
            Ok(owner_view(&user))
        } else {
            Ok(public_view(&user))
        }
    }

    /// Replace the profile of the account with this email.
    ///
    /// Only the owner may update a profile, and ownership is checked
    /// before the body is validated: probing someone else's profile with
    /// a broken payload still reads as `Forbidden`.
    pub async fn update_profile(
        &self,
        email: &str,
        viewer: &Identity,
        request: UpdateProfileRequest,
    ) -> Result<ProfileView, AuthError> {
        let normalized = validators::normalize_email(email);
        if validators::normalize_email(&viewer.email) != normalized {
            tracing::warn!(user_id = %viewer.id, "Profile update attempted on another user's profile");
            return Err(AuthError::Forbidden);
        }

        let update = validate_profile_request(request)?;
        let user = self
            .users
            .update_profile(&normalized, &update)
            .await?
            .ok_or(AuthError::NotFound)?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(owner_view(&user))
    }
}

fn validate_profile_request(request: UpdateProfileRequest) -> Result<ProfileUpdate, AuthError> {
    let mut errors = Vec::new();
    if request.first_name.is_none() {
        errors.push(ValidationError::Required("firstName"));
    }
    if request.last_name.is_none() {
        errors.push(ValidationError::Required("lastName"));
    }
    let dob = match request.dob.as_deref() {
        Some(raw) => validators::validate_dob(raw)
            .map_err(|e| errors.push(e))
            .ok(),
        None => {
            errors.push(ValidationError::Required("dob"));
            None
        }
    };
    if request.address.is_none() {
        errors.push(ValidationError::Required("address"));
    }

    match (request.first_name, request.last_name, dob, request.address) {
        (Some(first_name), Some(last_name), Some(dob), Some(address)) => Ok(ProfileUpdate {
            first_name,
            last_name,
            dob,
            address,
        }),
        _ => Err(AuthError::ValidationFailed(errors)),
    }
}
