//! Handler tests
//!
//! These run against the in-memory store; no database is needed.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::Duration;

    use crate::auth::{PasswordService, TokenService};
    use crate::config::SigningSecret;
    use crate::domain::{
        Account, AccountId, AccountNumber, AuthenticatedAccount, DomainError, NewAccount,
        OperationContext,
    };
    use crate::error::AppError;
    use crate::handlers::{
        CreateAccountCommand, CreateAccountHandler, LoginCommand, LoginHandler, TransferCommand,
        TransferHandler, UpdateAccountCommand, UpdateAccountHandler,
    };
    use crate::store::{InMemoryStorage, Storage, StoreError, StoreResult};

    fn passwords() -> Arc<PasswordService> {
        Arc::new(PasswordService::with_params(1024, 1, 1).unwrap())
    }

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(
            SigningSecret::new("handler-test-secret"),
            Duration::minutes(5),
        ))
    }

    async fn seed(store: &dyn Storage, number: AccountNumber, balance: i64) -> Account {
        let mut draft = NewAccount::new("Test", "Holder", "$argon2id$unused");
        draft.number = number;
        let account = store.create(draft).await.unwrap();
        if balance > 0 {
            store.update_balance(account.id, balance).await.unwrap()
        } else {
            account
        }
    }

    fn context_for(account: &Account) -> OperationContext {
        OperationContext::new().with_account(AuthenticatedAccount {
            account_id: account.id,
            account_number: account.number,
        })
    }

    async fn balance(store: &dyn Storage, number: AccountNumber) -> i64 {
        store.get_by_number(number).await.unwrap().balance
    }

    // =========================================================================
    // Account creation
    // =========================================================================

    #[tokio::test]
    async fn test_create_account_hashes_password() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let handler = CreateAccountHandler::new(Arc::clone(&store), passwords());

        let account = handler
            .execute(CreateAccountCommand::new(" Ada ", "Lovelace", "analytical-engine"))
            .await
            .unwrap();

        assert_eq!(account.first_name, "Ada");
        assert_eq!(account.balance, 0);
        assert!(account.encrypted_password.starts_with("$argon2id$"));
        assert_ne!(account.encrypted_password, "analytical-engine");

        let fetched = store.get_by_id(account.id).await.unwrap();
        assert_eq!(fetched, account);
    }

    #[tokio::test]
    async fn test_create_account_validation() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let handler = CreateAccountHandler::new(Arc::clone(&store), passwords());

        for command in [
            CreateAccountCommand::new("", "Lovelace", "long-enough"),
            CreateAccountCommand::new("Ada", "   ", "long-enough"),
            CreateAccountCommand::new("Ada", "Lovelace", "short"),
        ] {
            let result = handler.execute(command).await;
            assert!(matches!(result, Err(AppError::InvalidRequest(_))));
        }
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_account_keeps_omitted_fields() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let account = seed(store.as_ref(), 1001, 0).await;
        let handler = UpdateAccountHandler::new(Arc::clone(&store));

        let updated = handler
            .execute(
                account.id,
                UpdateAccountCommand {
                    first_name: Some("Grace".to_string()),
                    last_name: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.first_name, "Grace");
        assert_eq!(updated.last_name, account.last_name);
        assert_eq!(updated.balance, account.balance);
    }

    // =========================================================================
    // Login
    // =========================================================================

    #[tokio::test]
    async fn test_login_issues_token_for_account() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let passwords = passwords();
        let tokens = tokens();
        let account = CreateAccountHandler::new(Arc::clone(&store), Arc::clone(&passwords))
            .execute(CreateAccountCommand::new("Ada", "Lovelace", "analytical-engine"))
            .await
            .unwrap();

        let login = LoginHandler::new(Arc::clone(&store), passwords, Arc::clone(&tokens));
        let result = login
            .execute(LoginCommand::new(account.number, "analytical-engine"))
            .await
            .unwrap();

        assert_eq!(result.number, account.number);
        let claims = tokens.validate_token(&result.token).unwrap();
        assert_eq!(claims.account_id, account.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let passwords = passwords();
        let account = CreateAccountHandler::new(Arc::clone(&store), Arc::clone(&passwords))
            .execute(CreateAccountCommand::new("Ada", "Lovelace", "analytical-engine"))
            .await
            .unwrap();

        let login = LoginHandler::new(Arc::clone(&store), passwords, tokens());

        let wrong_password = login
            .execute(LoginCommand::new(account.number, "difference-engine"))
            .await;
        let unknown_number = login
            .execute(LoginCommand::new(account.number + 1, "analytical-engine"))
            .await;

        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_number, Err(AppError::InvalidCredentials)));
    }

    // =========================================================================
    // Transfers
    // =========================================================================

    #[tokio::test]
    async fn test_transfer_scenario_insufficient_then_success() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let source = seed(store.as_ref(), 1001, 0).await;
        seed(store.as_ref(), 1002, 0).await;
        let handler = TransferHandler::new(Arc::clone(&store));
        let context = context_for(&source);

        let result = handler
            .execute(TransferCommand::new(1001, 1002, 50), &context)
            .await;
        assert!(matches!(
            result,
            Err(AppError::Domain(DomainError::InsufficientFunds {
                required: 50,
                available: 0
            }))
        ));
        assert_eq!(balance(store.as_ref(), 1001).await, 0);
        assert_eq!(balance(store.as_ref(), 1002).await, 0);

        // Out-of-band credit.
        store.update_balance(source.id, 100).await.unwrap();

        let result = handler
            .execute(TransferCommand::new(1001, 1002, 50), &context)
            .await
            .unwrap();

        assert_eq!(result.amount, 50);
        assert_eq!(result.source.balance, 50);
        assert_eq!(result.destination.balance, 50);
        assert_eq!(balance(store.as_ref(), 1001).await, 50);
        assert_eq!(balance(store.as_ref(), 1002).await, 50);
    }

    #[tokio::test]
    async fn test_transfer_conserves_total() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let source = seed(store.as_ref(), 2001, 700).await;
        seed(store.as_ref(), 2002, 300).await;
        let handler = TransferHandler::new(Arc::clone(&store));

        for amount in [1, 99, 250, 350] {
            let before = balance(store.as_ref(), 2001).await + balance(store.as_ref(), 2002).await;
            handler
                .execute(TransferCommand::new(2001, 2002, amount), &context_for(&source))
                .await
                .unwrap();
            let after = balance(store.as_ref(), 2001).await + balance(store.as_ref(), 2002).await;
            assert_eq!(before, after);
        }
        assert_eq!(balance(store.as_ref(), 2001).await, 0);
    }

    #[tokio::test]
    async fn test_transfer_from_balance_above_single_transfer_cap() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let large = crate::domain::amount::MAX_AMOUNT + 500;
        let source = seed(store.as_ref(), 2101, large).await;
        seed(store.as_ref(), 2102, 0).await;
        let handler = TransferHandler::new(Arc::clone(&store));

        let result = handler
            .execute(TransferCommand::new(2101, 2102, 500), &context_for(&source))
            .await
            .unwrap();

        assert_eq!(result.source.balance, large - 500);
        assert_eq!(result.destination.balance, 500);
    }

    #[tokio::test]
    async fn test_transfer_rejections_leave_balances_unchanged() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        let source = seed(store.as_ref(), 3001, 100).await;
        seed(store.as_ref(), 3002, 5).await;
        let handler = TransferHandler::new(Arc::clone(&store));
        let context = context_for(&source);

        let zero = handler
            .execute(TransferCommand::new(3001, 3002, 0), &context)
            .await;
        assert!(matches!(zero, Err(AppError::Domain(DomainError::InvalidAmount(_)))));

        let negative = handler
            .execute(TransferCommand::new(3001, 3002, -10), &context)
            .await;
        assert!(matches!(negative, Err(AppError::Domain(DomainError::InvalidAmount(_)))));

        let overdraft = handler
            .execute(TransferCommand::new(3001, 3002, 101), &context)
            .await;
        assert!(matches!(
            overdraft,
            Err(AppError::Domain(DomainError::InsufficientFunds { .. }))
        ));

        let to_self = handler
            .execute(TransferCommand::new(3001, 3001, 10), &context)
            .await;
        assert!(matches!(
            to_self,
            Err(AppError::Domain(DomainError::SameAccountTransfer))
        ));

        let unknown = handler
            .execute(TransferCommand::new(3001, 9999, 10), &context)
            .await;
        assert!(matches!(
            unknown,
            Err(AppError::Domain(DomainError::AccountNotFound(_)))
        ));

        assert_eq!(balance(store.as_ref(), 3001).await, 100);
        assert_eq!(balance(store.as_ref(), 3002).await, 5);
    }

    #[tokio::test]
    async fn test_transfer_requires_source_owner() {
        let store: Arc<dyn Storage> = Arc::new(InMemoryStorage::new());
        seed(store.as_ref(), 4001, 100).await;
        let other = seed(store.as_ref(), 4002, 0).await;
        let handler = TransferHandler::new(Arc::clone(&store));

        let anonymous = handler
            .execute(TransferCommand::new(4001, 4002, 10), &OperationContext::new())
            .await;
        assert!(matches!(anonymous, Err(AppError::Forbidden)));

        let not_owner = handler
            .execute(TransferCommand::new(4001, 4002, 10), &context_for(&other))
            .await;
        assert!(matches!(not_owner, Err(AppError::Forbidden)));

        assert_eq!(balance(store.as_ref(), 4001).await, 100);
    }

    // =========================================================================
    // Compensating envelope (default Storage::apply_transfer)
    // =========================================================================

    /// Store whose credits can be made to fail; uses the default transfer envelope
    struct FlakyCreditStorage {
        inner: InMemoryStorage,
        fail_credit_to: Option<AccountId>,
        fail_all_credits: bool,
    }

    #[async_trait]
    impl Storage for FlakyCreditStorage {
        async fn create(&self, account: NewAccount) -> StoreResult<Account> {
            self.inner.create(account).await
        }

        async fn delete(&self, id: AccountId) -> StoreResult<()> {
            self.inner.delete(id).await
        }

        async fn get_by_id(&self, id: AccountId) -> StoreResult<Account> {
            self.inner.get_by_id(id).await
        }

        async fn get_by_number(&self, number: AccountNumber) -> StoreResult<Account> {
            self.inner.get_by_number(number).await
        }

        async fn get_all(&self) -> StoreResult<Vec<Account>> {
            self.inner.get_all().await
        }

        async fn update_profile(
            &self,
            id: AccountId,
            first_name: &str,
            last_name: &str,
        ) -> StoreResult<Account> {
            self.inner.update_profile(id, first_name, last_name).await
        }

        async fn update_balance(&self, id: AccountId, delta: i64) -> StoreResult<Account> {
            if delta > 0 && (self.fail_all_credits || self.fail_credit_to == Some(id)) {
                return Err(StoreError::Unavailable("simulated outage".to_string()));
            }
            self.inner.update_balance(id, delta).await
        }
    }

    async fn flaky_pair(
        fail_all_credits: bool,
    ) -> (Arc<FlakyCreditStorage>, Account, Account) {
        let inner = InMemoryStorage::new();
        let source = seed(&inner, 5001, 100).await;
        let destination = seed(&inner, 5002, 0).await;
        let store = Arc::new(FlakyCreditStorage {
            inner,
            fail_credit_to: Some(destination.id),
            fail_all_credits,
        });
        (store, source, destination)
    }

    #[tokio::test]
    async fn test_failed_credit_reverses_debit() {
        let (store, source, _) = flaky_pair(false).await;
        let handler = TransferHandler::new(store.clone());

        let result = handler
            .execute(TransferCommand::new(5001, 5002, 40), &context_for(&source))
            .await;

        assert!(matches!(
            result,
            Err(AppError::Store(StoreError::Unavailable(_)))
        ));
        assert_eq!(balance(store.as_ref(), 5001).await, 100);
        assert_eq!(balance(store.as_ref(), 5002).await, 0);
    }

    #[tokio::test]
    async fn test_failed_compensation_reported_as_inconsistent() {
        let (store, source, _) = flaky_pair(true).await;
        let handler = TransferHandler::new(store.clone());

        let result = handler
            .execute(TransferCommand::new(5001, 5002, 40), &context_for(&source))
            .await;

        // Never reported as success.
        assert!(matches!(
            result,
            Err(AppError::Store(StoreError::Inconsistent(_)))
        ));
    }
}
