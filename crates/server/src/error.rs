use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::store::StoreError;

/// Message returned to clients for any fault whose detail stays server-side.
pub const GENERIC_FAILURE: &str = "Something went wrong";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("auth context missing from request")]
    CtxMissing,

    #[error("internal: {0}")]
    Internal(String),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::InvalidInput(_) | Error::Conflict(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Upstream(_) | Error::CtxMissing | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Error::InvalidInput(msg)
            | Error::Unauthorized(msg)
            | Error::Conflict(msg)
            | Error::NotFound(msg) => msg,
            Error::Upstream(detail) => {
                error!("[Chat] Provider failure: {}", detail);
                "Failed to generate response from AI".to_string()
            }
            Error::CtxMissing => {
                error!("[Auth] Ctx not found in request extensions");
                GENERIC_FAILURE.to_string()
            }
            Error::Internal(detail) => {
                error!("[Server] Internal error: {}", detail);
                GENERIC_FAILURE.to_string()
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(email) => {
                tracing::debug!("[Store] Duplicate email {}", email);
                Error::Conflict("User with this email already exists".to_string())
            }
            StoreError::NotFound { entity, id } => {
                tracing::debug!("[Store] {} {} does not exist", entity, id);
                Error::NotFound(format!("{} not found", entity))
            }
            other => Error::Internal(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal(format!("{:#}", err))
    }
}

impl From<bcrypt::BcryptError> for Error {
    fn from(err: bcrypt::BcryptError) -> Self {
        Error::Internal(format!("password hashing: {}", err))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Internal(format!("blocking task: {}", err))
    }
}

impl From<axum::extract::rejection::JsonRejection> for Error {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        tracing::debug!("[Server] Rejected request body: {}", rejection.body_text());
        Error::InvalidInput("Invalid request body".to_string())
    }
}

impl From<axum::extract::rejection::PathRejection> for Error {
    fn from(rejection: axum::extract::rejection::PathRejection) -> Self {
        tracing::debug!("[Server] Rejected path: {}", rejection.body_text());
        Error::InvalidInput("Invalid path parameter".to_string())
    }
}
