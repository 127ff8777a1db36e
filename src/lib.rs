//! Authentication and session lifecycle authority.
//!
//! Two-tier JWT scheme: short-lived access tokens prove identity on
//! ordinary requests without any store lookup, while longer-lived
//! refresh tokens are tracked server-side (as SHA-256 fingerprints,
//! never plaintext) so a session can actually be ended. `session` holds
//! the lifecycle operations, `gate` the per-request authorization
//! checks, and `store` the persistence seam with an in-memory adapter.
//!
//! ```no_run
//! use std::sync::Arc;
//! use ticketbooth::configuration::get_configuration;
//! use ticketbooth::session::{LoginRequest, SessionAuthority};
//! use ticketbooth::store::InMemoryStore;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = get_configuration()?;
//! let store = Arc::new(InMemoryStore::new());
//! let authority = SessionAuthority::new(&settings.auth, store.clone(), store);
//!
//! let pair = authority
//!     .login(LoginRequest {
//!         email: Some("alice@example.com".to_string()),
//!         password: Some("secret1".to_string()),
//!         bearer_expires_in: None,
//!         refresh_expires_in: None,
//!     })
//!     .await?;
//! println!("access token expires in {}s", pair.bearer.expires_in);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod configuration;
pub mod error;
pub mod gate;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod validators;

pub use error::AuthError;
pub use gate::AuthDecision;
pub use session::SessionAuthority;
