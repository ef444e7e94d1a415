//! Operation Context
//!
//! Contains metadata about the current operation for tracing and
//! authorization checks inside handlers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::{AccountId, AccountNumber};

/// Identity proven by a valid access token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedAccount {
    pub account_id: AccountId,
    pub account_number: AccountNumber,
}

/// Context for an operation, used for tracing and authorization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationContext {
    /// Account proven by the request's access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<AuthenticatedAccount>,

    /// Correlation ID for request tracing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
}

impl OperationContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with an authenticated account
    pub fn with_account(mut self, account: AuthenticatedAccount) -> Self {
        self.account = Some(account);
        self
    }

    /// Create context with correlation ID
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// Generate a new correlation ID if not present
    pub fn ensure_correlation_id(&mut self) -> Uuid {
        *self.correlation_id.get_or_insert_with(Uuid::new_v4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_builder() {
        let correlation_id = Uuid::new_v4();
        let account = AuthenticatedAccount {
            account_id: 1,
            account_number: 100_000_001,
        };

        let context = OperationContext::new()
            .with_account(account)
            .with_correlation_id(correlation_id);

        assert_eq!(context.account, Some(account));
        assert_eq!(context.correlation_id, Some(correlation_id));
    }

    #[test]
    fn test_ensure_correlation_id() {
        let mut context = OperationContext::new();
        assert!(context.correlation_id.is_none());

        let id = context.ensure_correlation_id();
        assert_eq!(context.correlation_id, Some(id));

        // Calling again should return the same ID
        assert_eq!(context.ensure_correlation_id(), id);
    }
}
