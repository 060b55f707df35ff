//! Server configuration and shared state

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::ai::orchestrator::Orchestrator;
use crate::ai::{AiConfig, CompletionProvider};
use crate::auth::AuthManager;
use crate::store::ConversationStore;
use crate::token::TokenService;

/// Signing secret used when `JWT_SECRET` is unset in development or test mode
pub const INSECURE_DEFAULT_SECRET: &str = "default-secret-change-in-production";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JWT_SECRET must be set unless GEPETINHO_MODE is development or test")]
    MissingSecret,

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppMode {
    Production,
    Development,
    Test,
}

impl AppMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(AppMode::Production),
            "development" | "dev" => Ok(AppMode::Development),
            "test" => Ok(AppMode::Test),
            _ => Err(ConfigError::Invalid {
                key: "GEPETINHO_MODE",
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Memory,
}

/// Configuration for the Gepetinho server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub mode: AppMode,
    /// Token signing secret
    pub jwt_secret: String,
    pub bind_addr: SocketAddr,
    pub store: StoreKind,
    /// Data directory for the SQLite database
    pub data_dir: PathBuf,
    /// bcrypt work factor
    pub bcrypt_cost: u32,
    pub ai: AiConfig,
}

impl ServerConfig {
    /// Load from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Unset mode is production; the default secret needs an explicit opt-in.
        let mode = match lookup("GEPETINHO_MODE") {
            Some(v) => AppMode::parse(&v)?,
            None => AppMode::Production,
        };

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None if mode == AppMode::Production => return Err(ConfigError::MissingSecret),
            None => {
                warn!(
                    "[Config] JWT_SECRET not set, using insecure default secret ({:?} mode only)",
                    mode
                );
                INSECURE_DEFAULT_SECRET.to_string()
            }
        };

        let bind_addr = parse_or(&lookup, "GEPETINHO_BIND", SocketAddr::from(([0, 0, 0, 0], 3001)))?;

        let store = match lookup("GEPETINHO_STORE").as_deref() {
            None | Some("sqlite") => StoreKind::Sqlite,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "GEPETINHO_STORE",
                    value: other.to_string(),
                })
            }
        };

        let data_dir = lookup("GEPETINHO_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("gepetinho_data"));

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let mut ai = AiConfig::default();
        if let Some(model) = lookup("GEPETINHO_MODEL") {
            ai.model = model;
        }
        ai.timeout = Duration::from_secs(parse_or(
            &lookup,
            "GEPETINHO_PROVIDER_TIMEOUT_SECS",
            ai.timeout.as_secs(),
        )?);

        Ok(Self {
            mode,
            jwt_secret,
            bind_addr,
            store,
            data_dir,
            bcrypt_cost,
            ai,
        })
    }

    /// Config for tests: in-memory store, fixed secret, cheapest bcrypt cost
    pub fn for_tests() -> Self {
        Self {
            mode: AppMode::Test,
            jwt_secret: INSECURE_DEFAULT_SECRET.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            store: StoreKind::Memory,
            data_dir: PathBuf::from("gepetinho_data"),
            bcrypt_cost: 4,
            ai: AiConfig::default(),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("gepetinho.sqlite")
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

/// App state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    pub tokens: Arc<TokenService>,
    pub auth: Arc<AuthManager>,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(
        config: &ServerConfig,
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        let tokens = Arc::new(TokenService::new(config.jwt_secret.as_bytes()));
        let auth = Arc::new(AuthManager::new(
            store.clone(),
            tokens.clone(),
            config.bcrypt_cost,
        ));
        let orchestrator = Arc::new(Orchestrator::new(store.clone(), provider, &config.ai));

        Self {
            store,
            tokens,
            auth,
            orchestrator,
        }
    }
}
