//! Credential & token service
//!
//! Password hashing for login and signed access tokens for the gate.

mod password;
mod token;

pub use password::{PasswordError, PasswordService};
pub use token::{TokenClaims, TokenError, TokenService};
