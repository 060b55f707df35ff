use crate::error::{Error, Result};
use crate::token::SessionClaims;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Identity of the caller, placed in request extensions by the auth gate
#[derive(Clone, Debug)]
pub struct Ctx {
    user_id: i64,
    email: String,
}

impl Ctx {
    pub fn new(user_id: i64, email: String) -> Self {
        Self { user_id, email }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<SessionClaims> for Ctx {
    fn from(claims: SessionClaims) -> Self {
        Self::new(claims.user_id, claims.email)
    }
}

impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<Ctx>()
            .cloned()
            .ok_or(Error::CtxMissing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctx_carries_token_identity() {
        let ctx = Ctx::from(SessionClaims {
            user_id: 7,
            email: "a@b.com".to_string(),
        });
        assert_eq!(ctx.user_id(), 7);
        assert_eq!(ctx.email(), "a@b.com");
    }
}
