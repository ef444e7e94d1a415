//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Extension, Path, State},
    middleware::from_fn_with_state,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Account, AccountId, AccountNumber, OperationContext};
use crate::error::AppError;
use crate::handlers::{
    AccountBalance, CreateAccountCommand, CreateAccountHandler, LoginCommand, LoginHandler,
    TransferCommand, TransferHandler, UpdateAccountCommand, UpdateAccountHandler,
};

use super::extract::ApiJson;
use super::middleware::{account_gate, token_gate};
use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub number: AccountNumber,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub number: AccountNumber,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteAccountResponse {
    pub deleted: AccountId,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub source: AccountNumber,
    pub destination: AccountNumber,
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub transfer_id: Uuid,
    pub amount: i64,
    pub source: AccountBalance,
    pub destination: AccountBalance,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router.
///
/// `/account/:id` routes sit behind the account gate; `/transfer` needs a
/// valid token whose account owns the source.
pub fn create_router(state: AppState) -> Router<AppState> {
    let account_routes = Router::new()
        .route(
            "/account/:id",
            get(get_account).delete(delete_account).patch(update_account),
        )
        .route_layer(from_fn_with_state(state.clone(), account_gate));

    let transfer_routes = Router::new()
        .route("/transfer", post(transfer))
        .route_layer(from_fn_with_state(state, token_gate));

    Router::new()
        .route("/login", post(login))
        .route("/account", get(list_accounts).post(create_account))
        .merge(account_routes)
        .merge(transfer_routes)
}

// =========================================================================
// POST /login
// =========================================================================

/// Exchange account number and password for a token
async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let handler = LoginHandler::new(state.store, state.passwords, state.tokens);

    let result = handler
        .execute(LoginCommand::new(request.number, request.password))
        .await?;

    Ok(Json(LoginResponse {
        token: result.token,
        number: result.number,
    }))
}

// =========================================================================
// GET /account, POST /account
// =========================================================================

/// List every account
async fn list_accounts(State(state): State<AppState>) -> Result<Json<Vec<Account>>, AppError> {
    let accounts = state.store.get_all().await?;
    Ok(Json(accounts))
}

/// Open a new account
async fn create_account(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateAccountRequest>,
) -> Result<Json<Account>, AppError> {
    let handler = CreateAccountHandler::new(state.store, state.passwords);

    let command =
        CreateAccountCommand::new(request.first_name, request.last_name, request.password);
    let account = handler.execute(command).await?;

    Ok(Json(account))
}

// =========================================================================
// GET / PATCH / DELETE /account/:id
// =========================================================================

/// Fetch one account
async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<Json<Account>, AppError> {
    let account = state.store.get_by_id(id).await?;
    Ok(Json(account))
}

/// Change the account holder's names
async fn update_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
    ApiJson(request): ApiJson<UpdateAccountRequest>,
) -> Result<Json<Account>, AppError> {
    let handler = UpdateAccountHandler::new(state.store);

    let command = UpdateAccountCommand {
        first_name: request.first_name,
        last_name: request.last_name,
    };
    let account = handler.execute(id, command).await?;

    Ok(Json(account))
}

/// Remove an account
async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<AccountId>,
) -> Result<Json<DeleteAccountResponse>, AppError> {
    state.store.delete(id).await?;

    tracing::info!(account_id = id, "Account deleted");
    Ok(Json(DeleteAccountResponse { deleted: id }))
}

// =========================================================================
// POST /transfer
// =========================================================================

/// Move money from the caller's account to another
async fn transfer(
    State(state): State<AppState>,
    Extension(context): Extension<OperationContext>,
    ApiJson(request): ApiJson<TransferRequest>,
) -> Result<Json<TransferResponse>, AppError> {
    let command = TransferCommand::new(request.source, request.destination, request.amount);

    // Runs on its own task so a dropped connection cannot stop it between debit and credit.
    let handler = TransferHandler::new(state.store);
    let result = tokio::spawn(async move { handler.execute(command, &context).await })
        .await
        .map_err(|e| AppError::Internal(format!("transfer task failed: {}", e)))??;

    Ok(Json(TransferResponse {
        transfer_id: result.transfer_id,
        amount: result.amount,
        source: result.source,
        destination: result.destination,
    }))
}
