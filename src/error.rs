//! Error types for viktor-bot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog store error: {0}")]
    Store(#[from] StoreError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Catalog store errors.
///
/// These never crash a conversation: the engine reports a generic failure
/// message to the user and leaves the session untouched.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Catalog file {path} is unavailable: {reason}")]
    Unavailable { path: String, reason: String },

    #[error("Failed to parse catalog file {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("No masterclass at index {index} (catalog has {len} records)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Failed to write catalog file {path}: {reason}")]
    WriteFailed { path: String, reason: String },
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to deliver on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Channel {name} health check failed: {reason}")]
    HealthCheckFailed { name: String, reason: String },
}

/// Result type alias for the bot.
pub type Result<T> = std::result::Result<T, Error>;
