//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Conversation engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Numeric Telegram identity of the administrator.
    pub admin_id: i64,
    /// Session idle timeout (sessions are pruned after this duration).
    pub session_idle_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            admin_id: 0,
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
        }
    }
}

/// Full bot configuration, assembled from the environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Path to the read-only club catalog file.
    pub clubs_path: PathBuf,
    /// Path to the read-write masterclass catalog file.
    pub masterclasses_path: PathBuf,
    /// Engine settings (admin identity, idle timeout).
    pub engine: EngineConfig,
}

impl BotConfig {
    /// Read configuration from the environment.
    ///
    /// Required: `VIKTOR_BOT_TOKEN`, `VIKTOR_ADMIN_ID`. Everything else
    /// has defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bot_token = require_env("VIKTOR_BOT_TOKEN")?;
        let admin_raw = require_env("VIKTOR_ADMIN_ID")?;
        let admin_id = parse_i64("VIKTOR_ADMIN_ID", &admin_raw)?;

        let clubs_path = std::env::var("VIKTOR_CLUBS_PATH")
            .unwrap_or_else(|_| "./data/clubs.json".to_string())
            .into();
        let masterclasses_path = std::env::var("VIKTOR_MASTERCLASSES_PATH")
            .unwrap_or_else(|_| "./data/masterclasses.json".to_string())
            .into();

        let idle_secs = match std::env::var("VIKTOR_SESSION_IDLE_SECS") {
            Ok(raw) => parse_u64("VIKTOR_SESSION_IDLE_SECS", &raw)?,
            Err(_) => 3600,
        };

        Ok(Self {
            bot_token,
            clubs_path,
            masterclasses_path,
            engine: EngineConfig {
                admin_id,
                session_idle_timeout: Duration::from_secs(idle_secs),
            },
        })
    }
}

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn parse_i64(key: &str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected an integer, got {raw:?}"),
    })
}

fn parse_u64(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("expected a non-negative integer, got {raw:?}"),
    })
}
