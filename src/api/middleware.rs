//! API Middleware
//!
//! Request context, request logging and the authorization gate.

use std::fmt;

use axum::{
    body::Body,
    extract::{FromRequestParts, Path, State},
    http::{header::AUTHORIZATION, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::auth::{TokenError, TokenService};
use crate::domain::{AccountId, AuthenticatedAccount, OperationContext};
use crate::error::AppError;

use super::AppState;

/// Header carrying the correlation ID (set by `SetRequestIdLayer`)
const REQUEST_ID_HEADER: &str = "x-request-id";

// =========================================================================
// Request context
// =========================================================================

/// Build the `OperationContext` for the request
pub async fn context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let mut context = OperationContext::new();
    if let Some(id) = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
    {
        context = context.with_correlation_id(id);
    }
    // Client-supplied ids that are not UUIDs get a fresh one
    context.ensure_correlation_id();

    request.extensions_mut().insert(context);

    next.run(request).await
}

// =========================================================================
// Authorization gate
// =========================================================================

/// Why the gate refused a request. Logged server-side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    MissingToken,
    InvalidToken(TokenError),
    MissingTarget,
    IdentityMismatch,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::MissingToken => write!(f, "missing token"),
            DenyReason::InvalidToken(e) => write!(f, "invalid token: {}", e),
            DenyReason::MissingTarget => write!(f, "missing or malformed account id"),
            DenyReason::IdentityMismatch => write!(f, "token does not match account"),
        }
    }
}

/// Raw token from the `Authorization` header. A `Bearer ` prefix is tolerated.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    (!token.is_empty()).then_some(token)
}

/// Validate the token and return the identity it proves
pub fn authenticate(
    tokens: &TokenService,
    token: Option<&str>,
) -> Result<AuthenticatedAccount, DenyReason> {
    let token = token.ok_or(DenyReason::MissingToken)?;
    let claims = tokens
        .validate_token(token)
        .map_err(DenyReason::InvalidToken)?;
    Ok(claims.identity())
}

/// Validate the token and require that it belongs to `target`
pub fn authorize(
    tokens: &TokenService,
    token: Option<&str>,
    target: Option<AccountId>,
) -> Result<AuthenticatedAccount, DenyReason> {
    let identity = authenticate(tokens, token)?;
    let target = target.ok_or(DenyReason::MissingTarget)?;

    if identity.account_id != target {
        return Err(DenyReason::IdentityMismatch);
    }
    Ok(identity)
}

fn deny(reason: DenyReason) -> Response {
    tracing::debug!(%reason, "Access denied");
    if let DenyReason::InvalidToken(TokenError::Crypto(ref e)) = reason {
        tracing::error!("Token verification unavailable: {}", e);
    }
    AppError::Forbidden.into_response()
}

fn admit(mut request: Request<Body>, identity: AuthenticatedAccount) -> Request<Body> {
    let context = request
        .extensions()
        .get::<OperationContext>()
        .cloned()
        .unwrap_or_default()
        .with_account(identity);

    request.extensions_mut().insert(identity);
    request.extensions_mut().insert(context);
    request
}

/// Gate for `/account/:id`: the token must be valid and issued for `:id`.
///
/// Every refusal produces the same `403 {"error":"Forbidden"}`.
pub async fn account_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let target = Path::<AccountId>::from_request_parts(&mut parts, &state)
        .await
        .ok()
        .map(|Path(id)| id);
    let decision = authorize(&state.tokens, token_from_headers(&parts.headers), target);

    match decision {
        Ok(identity) => {
            let request = admit(Request::from_parts(parts, body), identity);
            next.run(request).await
        }
        Err(reason) => deny(reason),
    }
}

/// Gate for routes that need a valid token but carry no account id in the path
pub async fn token_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match authenticate(&state.tokens, token_from_headers(request.headers())) {
        Ok(identity) => next.run(admit(request, identity)).await,
        Err(reason) => deny(reason),
    }
}

// =========================================================================
// mask_headers_for_logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

// =========================================================================
// Request Logging Middleware
// =========================================================================

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let version = request.version();

    let headers = mask_headers_for_logging(request.headers());

    let correlation_id = request
        .extensions()
        .get::<OperationContext>()
        .and_then(|ctx| ctx.correlation_id);

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        version = ?version,
        correlation_id = ?correlation_id,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        correlation_id = ?correlation_id,
        "Request completed"
    );

    response
}
