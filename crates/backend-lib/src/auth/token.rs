// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed, time-limited bearer tokens.
//!
//! A token is an HS256 JWT carrying `userId`, `isAdmin` and `exp`. Nothing is
//! kept server-side: a token stays valid until `exp` and cannot be revoked.
//! Verification takes "now" as an argument so it is a pure function of
//! `(token, secret, now)`.
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;
use usergate_common::UserId;

/// Lifetime of an issued token (5 minutes)
pub const TOKEN_TTL_SECS: i64 = 5 * 60;

/// Token failures. All of them mean "unauthorized" to a caller.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("signing secret is empty")]
    MissingSecret,

    #[error("token has expired")]
    Expired,

    #[error("token signature does not match")]
    BadSignature,

    #[error("token claims are missing or malformed")]
    InvalidClaims,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token could not be signed: {0}")]
    Signing(String),
}

/// Identity and role extracted from a verified token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claims {
    pub user_id: UserId,
    pub is_admin: bool,
    pub expires_at: i64,
}

#[derive(Serialize)]
struct IssuedClaims {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "isAdmin")]
    is_admin: bool,
    exp: i64,
}

/// Claims as read back from the wire. `isAdmin` is taken loosely: absent or
/// non-boolean means "not admin".
#[derive(Deserialize)]
struct RawClaims {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "isAdmin", default)]
    is_admin: Option<serde_json::Value>,
    exp: i64,
}

/// Issues and verifies bearer tokens with a process-wide secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        Self::with_ttl(secret, TimeDelta::seconds(TOKEN_TTL_SECS))
    }

    pub fn with_ttl(secret: &[u8], ttl: TimeDelta) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        // Expiry is checked against the caller's clock, not the library's.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        })
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    /// Sign a token for `user_id` expiring `ttl` after `now`
    pub fn issue(
        &self,
        user_id: UserId,
        is_admin: bool,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = IssuedClaims {
            user_id,
            is_admin,
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Check signature, shape and expiry of a token as of `now`
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<RawClaims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => {
                    TokenError::InvalidClaims
                }
                _ => TokenError::Malformed(e.to_string()),
            }
        })?;

        let raw = data.claims;
        if now.timestamp() > raw.exp {
            return Err(TokenError::Expired);
        }

        Ok(Claims {
            user_id: raw.user_id,
            is_admin: raw
                .is_admin
                .as_ref()
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
            expires_at: raw.exp,
        })
    }
}
