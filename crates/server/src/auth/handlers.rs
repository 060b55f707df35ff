//! Auth handlers

use crate::config::AppState;
use crate::ctx::Ctx;
use crate::error::Result;
use crate::models::UserInfo;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct ProfileUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: ProfileUser,
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;
    info!("POST /api/auth/signup - {}", req.email);

    let (user, token) = state
        .auth
        .signup(&req.email, &req.password, req.username.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            token,
            user: UserInfo::from(&user),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>> {
    let Json(req) = payload?;
    info!("POST /api/auth/login - {}", req.email);

    let (user, token) = state.auth.login(&req.email, &req.password).await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: UserInfo::from(&user),
    }))
}

/// GET /api/auth/profile
pub async fn profile(State(state): State<AppState>, ctx: Ctx) -> Result<Json<ProfileResponse>> {
    // The gate has already verified the token; only the lookup can fail here.
    let user = state.auth.profile(ctx.user_id()).await?;

    Ok(Json(ProfileResponse {
        user: ProfileUser {
            id: user.id,
            email: user.email,
            username: user.username.unwrap_or_else(|| "User".to_string()),
            created_at: user.created_at,
        },
    }))
}
