//! Access tokens
//!
//! Stateless HS256 tokens in JWT compact form
//! (`base64url(header).base64url(claims).base64url(hmac)`).
//! Only HS256 is accepted on validation, so `none` and asymmetric
//! algorithms cannot be substituted in.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::{Config, SigningSecret};
use crate::domain::{Account, AccountId, AccountNumber, AuthenticatedAccount};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

/// Token failures.
///
/// `Crypto` is an infrastructure fault; every other variant is an
/// authentication failure and must be reported uniformly to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token signing unavailable: {0}")]
    Crypto(String),

    #[error("Malformed token")]
    Malformed,

    #[error("Unexpected signing method: {0}")]
    UnexpectedAlgorithm(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,
}

impl TokenError {
    /// Check if this is an authentication failure rather than an infrastructure fault
    pub fn is_auth_error(&self) -> bool {
        !matches!(self, TokenError::Crypto(_))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub account_id: AccountId,
    pub account_number: AccountNumber,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn identity(&self) -> AuthenticatedAccount {
        AuthenticatedAccount {
            account_id: self.account_id,
            account_number: self.account_number,
        }
    }
}

/// Issues and validates access tokens with a process-wide secret
#[derive(Debug, Clone)]
pub struct TokenService {
    secret: SigningSecret,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: SigningSecret, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            Duration::seconds(config.token_ttl_seconds),
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `account` that expires `ttl` from now
    pub fn issue_token(&self, account: &Account) -> Result<String, TokenError> {
        self.issue_token_at(account, Utc::now())
    }

    /// Issue a token as if the current instant were `now`
    pub fn issue_token_at(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Crypto("token expiry out of range".to_string()))?;

        let claims = TokenClaims {
            account_id: account.id,
            account_number: account.number,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        self.sign(&claims)
    }

    /// Validate a token and return its claims
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims, TokenError> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validate a token as if the current instant were `now`
    pub fn validate_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        let mut parts = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(TokenError::Malformed),
            };

        let header: TokenHeader = decode_json(header_b64)?;
        if header.alg != ALGORITHM {
            return Err(TokenError::UnexpectedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| TokenError::Malformed)?;

        // Fail closed: an empty secret would make every MAC forgeable.
        let mut mac = self.mac().map_err(|_| TokenError::InvalidSignature)?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        let claims: TokenClaims = decode_json(claims_b64)?;
        if claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        let header = TokenHeader {
            alg: ALGORITHM.to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        };

        let header_b64 = encode_json(&header)?;
        let claims_b64 = encode_json(claims)?;
        let signing_input = format!("{}.{}", header_b64, claims_b64);

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        if self.secret.is_empty() {
            return Err(TokenError::Crypto("signing secret is not configured".to_string()));
        }
        HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| TokenError::Crypto(e.to_string()))
    }
}

fn encode_json<T: Serialize>(value: &T) -> Result<String, TokenError> {
    let bytes = serde_json::to_vec(value).map_err(|e| TokenError::Crypto(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

fn decode_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}
