//! bank_api Library
//!
//! Re-exports modules for integration testing and the binaries.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod handlers;
pub mod store;

mod error;

pub use config::Config;
pub use domain::{Account, Amount, AmountError, Balance, DomainError, OperationContext};
pub use error::{AppError, AppResult, ErrorResponse};
