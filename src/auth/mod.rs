//! Token minting/verification and password hashing.

mod claims;
mod codec;
mod password;

pub use claims::Claims;
pub use claims::Identity;
pub use claims::TokenType;
pub use codec::MintedToken;
pub use codec::TokenCodec;
pub use codec::TokenError;
pub use password::hash_password;
pub use password::verify_password;
