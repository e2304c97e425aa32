//! LightSNS-Mirror: a resumable offline mirror for LightSNS-based forums
//!
//! This crate walks the numeric ID spaces of a forum (posts, author profiles,
//! author info-cards), follows every paginated sub-resource beneath them, and
//! mirrors the static assets referenced by the saved pages so the copy can be
//! browsed offline. Progress is kept in per-kind cursor files so an
//! interrupted run resumes where it stopped.

pub mod config;
pub mod crawler;
pub mod mirror;
pub mod output;
pub mod shutdown;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for mirror operations
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    RetryExhausted(#[from] RetryExhausted),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Worker(String),
}

/// Raised when a request keeps failing at the transport level
///
/// The enclosing unit of work is abandoned once this surfaces; it is never
/// retried further.
#[derive(Debug, Error)]
#[error("Retries exhausted for {url} after {attempts} attempts: {last_error}")]
pub struct RetryExhausted {
    pub url: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for mirror operations
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use state::{ResourceKind, SubresourceKind};
pub use storage::CursorStore;
