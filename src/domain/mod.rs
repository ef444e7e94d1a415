//! Domain module
//!
//! Core domain types and business rules.

pub mod account;
pub mod amount;
pub mod context;
pub mod error;

pub use account::{Account, AccountId, AccountNumber, NewAccount};
pub use amount::{Amount, AmountError, Balance};
pub use context::{AuthenticatedAccount, OperationContext};
pub use error::DomainError;
