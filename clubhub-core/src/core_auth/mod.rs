//! Credentials: password hashing and signed session tokens

pub mod password;
pub mod token;

pub use password::{PasswordError, PasswordHasher};
pub use token::{SessionClaims, TokenError, TokenSigner};
