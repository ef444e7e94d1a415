//! Command Handlers module
//!
//! Handlers that orchestrate business operations over the account store,
//! the password service and the token service.

mod account_handler;
mod commands;
mod login_handler;
mod transfer_handler;

#[cfg(test)]
mod tests;

pub use account_handler::{CreateAccountHandler, UpdateAccountHandler};
pub use commands::*;
pub use login_handler::LoginHandler;
pub use transfer_handler::TransferHandler;
