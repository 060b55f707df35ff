//! Auth gate
//!
//! Runs in front of every route. Public and asset paths pass straight
//! through; everything else needs a valid session token. Rejected API calls
//! get a JSON 401, rejected page loads are redirected to the login page.

use crate::config::AppState;
use crate::ctx::Ctx;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use headers::{authorization::Bearer, Authorization, Cookie, HeaderMapExt};
use serde_json::json;
use tracing::debug;

/// Cookie checked when no bearer token is sent
pub const TOKEN_COOKIE: &str = "gepetinho-token";

/// Where rejected page requests are sent
pub const LOGIN_PAGE: &str = "/login";

const PUBLIC_PATHS: &[&str] = &[
    "/login",
    "/signup",
    "/api/auth/login",
    "/api/auth/signup",
    "/health",
];

const ASSET_PREFIXES: &[&str] = &["/_next/", "/static/", "/assets/", "/favicon.ico"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Public,
    Asset,
    Api,
    Page,
}

impl RouteKind {
    pub fn classify(path: &str) -> Self {
        if PUBLIC_PATHS.contains(&path) {
            return RouteKind::Public;
        }

        let last_segment = path.rsplit('/').next().unwrap_or_default();
        if ASSET_PREFIXES.iter().any(|p| path.starts_with(p)) || last_segment.contains('.') {
            return RouteKind::Asset;
        }

        if path == "/api" || path.starts_with("/api/") {
            RouteKind::Api
        } else {
            RouteKind::Page
        }
    }

    fn reject(self, message: &'static str) -> Response {
        match self {
            RouteKind::Page => Redirect::temporary(LOGIN_PAGE).into_response(),
            _ => (StatusCode::UNAUTHORIZED, Json(json!({ "message": message }))).into_response(),
        }
    }
}

/// Bearer token if present, otherwise the session cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    headers
        .typed_get::<Cookie>()
        .and_then(|cookie| cookie.get(TOKEN_COOKIE).map(str::to_string))
        .filter(|token| !token.is_empty())
}

pub async fn mw_require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let kind = RouteKind::classify(req.uri().path());

    if matches!(kind, RouteKind::Public | RouteKind::Asset) {
        return next.run(req).await;
    }

    debug!("MIDDLEWARE: require_auth {} ({:?})", req.uri().path(), kind);

    let token = match extract_token(req.headers()) {
        Some(token) => token,
        None => return kind.reject("Authentication required"),
    };

    let claims = match state.tokens.verify(&token) {
        Ok(claims) => claims,
        Err(_) => return kind.reject("Invalid or expired token"),
    };

    req.extensions_mut().insert(Ctx::from(claims));

    next.run(req).await
}
