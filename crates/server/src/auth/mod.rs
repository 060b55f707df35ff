//! Authentication Module
//!
//! Handles user signup, login and profile lookup. Passwords are stored as
//! bcrypt hashes; sessions are stateless tokens from [`TokenService`].

pub mod handlers;
pub mod middleware;

use crate::error::{Error, Result};
use crate::models::User;
use crate::store::ConversationStore;
use crate::token::{SessionClaims, TokenService};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const DUPLICATE_EMAIL: &str = "User with this email already exists";

/// Auth manager handles all authentication
pub struct AuthManager {
    store: Arc<dyn ConversationStore>,
    tokens: Arc<TokenService>,
    bcrypt_cost: u32,
    /// Hash checked against on unknown emails so both failures cost one bcrypt verify
    decoy_hash: OnceCell<String>,
}

impl AuthManager {
    pub fn new(store: Arc<dyn ConversationStore>, tokens: Arc<TokenService>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            tokens,
            bcrypt_cost,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Register a new user and issue a session token
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        username: Option<&str>,
    ) -> Result<(User, String)> {
        require_credentials(email, password)?;

        // Fast path for the common case; the store re-checks atomically.
        if self.store.get_user_by_email(email).await?.is_some() {
            return Err(Error::Conflict(DUPLICATE_EMAIL.to_string()));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let username = username.filter(|u| !u.is_empty());
        let user = self
            .store
            .create_user(email, &password_hash, username)
            .await?;

        let token = self.issue_token(&user)?;

        info!("[Auth] User registered: {} (id {})", user.email, user.id);

        Ok((user, token))
    }

    /// Check credentials and issue a session token
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String)> {
        require_credentials(email, password)?;

        let user = match self.store.get_user_by_email(email).await? {
            Some(user) => user,
            None => {
                warn!("[Auth] Login attempt for unknown email {}", email);
                let decoy = self
                    .decoy_hash
                    .get_or_try_init(|| hash_password("decoy-password", self.bcrypt_cost))
                    .await?;
                verify_password(password, decoy).await?;
                return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !verify_password(password, &user.password_hash).await? {
            warn!("[Auth] Failed login attempt for {}", email);
            return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.issue_token(&user)?;

        info!("[Auth] User logged in: {}", user.email);

        Ok((user, token))
    }

    /// Get user by ID
    pub async fn profile(&self, user_id: i64) -> Result<User> {
        self.store
            .get_user_by_id(user_id)
            .await?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))
    }

    fn issue_token(&self, user: &User) -> Result<String> {
        let claims = SessionClaims {
            user_id: user.id,
            email: user.email.clone(),
        };
        Ok(self.tokens.issue(&claims)?)
    }
}

fn require_credentials(email: &str, password: &str) -> Result<()> {
    if email.is_empty() || password.is_empty() {
        return Err(Error::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }
    Ok(())
}

async fn hash_password(password: &str, cost: u32) -> Result<String> {
    let password = password.to_string();
    Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    Ok(tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}
