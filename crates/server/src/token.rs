//! Session tokens
//!
//! Stateless HS256 JWTs carrying the user id and email. There is no
//! server-side session table; a token stays valid until it expires.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lifetime of every issued token
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Identity carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub email: String,
}

/// Wire form of the JWT payload
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    #[serde(flatten)]
    session: SessionClaims,
    iat: i64,
    exp: i64,
}

/// Token was malformed, tampered with, or expired.
///
/// The reason is only logged, never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid or expired token")]
pub struct TokenRejected;

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against our own clock in `verify_at`.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, claims: &SessionClaims) -> anyhow::Result<String> {
        self.issue_at(claims, Utc::now())
    }

    pub fn issue_at(&self, claims: &SessionClaims, now: DateTime<Utc>) -> anyhow::Result<String> {
        let iat = now.timestamp();
        let exp = (now + Duration::days(TOKEN_TTL_DAYS)).timestamp();
        let payload = Claims {
            session: claims.clone(),
            iat,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.encoding)
            .map_err(|e| anyhow::anyhow!("Token error: {}", e))
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenRejected> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenRejected> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature => debug!("[Token] Signature mismatch"),
                kind => debug!("[Token] Malformed token: {:?}", kind),
            }
            TokenRejected
        })?;

        if now.timestamp() >= data.claims.exp {
            debug!(
                "[Token] Expired token for user {} (exp={})",
                data.claims.session.user_id, data.claims.exp
            );
            return Err(TokenRejected);
        }

        Ok(data.claims.session)
    }
}
