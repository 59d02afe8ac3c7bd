//! Error types for Strider
//!
//! All modules use `StriderResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Strider operations
pub type StriderResult<T> = Result<T, StriderError>;

/// All errors that can occur in Strider
#[derive(Error, Debug)]
pub enum StriderError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid origin {origin}: {reason}")]
    OriginInvalid { origin: String, reason: String },

    // Lifecycle errors
    #[error("Installation failed for {version}: {reason}")]
    InstallFailed { version: String, reason: String },

    #[error("Cannot {action} while worker is {state}")]
    InvalidTransition { action: String, state: String },

    #[error("No worker registered")]
    NotRegistered,

    // Cache errors
    #[error("Invalid cache name: {0}")]
    CacheNameInvalid(String),

    #[error("Cache not found: {0}")]
    CacheNotFound(String),

    #[error("Cache storage error in {cache}: {reason}")]
    CacheStorage { cache: String, reason: String },

    #[error("Only GET requests can be cached, got {0}")]
    CacheMethodUnsupported(String),

    // Network errors
    #[error("Network request failed: {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Invalid URL {url}: {source}")]
    UrlParse {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Unsupported HTTP method: {0}")]
    MethodUnsupported(String),

    // Client errors
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StriderError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a cache storage error
    pub fn storage(cache: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CacheStorage {
            cache: cache.into(),
            reason: reason.into(),
        }
    }

    /// Create a URL parse error
    pub fn url(url: impl Into<String>, source: url::ParseError) -> Self {
        Self::UrlParse {
            url: url.into(),
            source,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::InstallFailed { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InstallFailed { .. } => {
                Some("Check that every manifest URL is reachable, then run: strider install")
            }
            Self::NotRegistered => Some("Run: strider install"),
            Self::InvalidTransition { action, .. } if action == "activate" => {
                Some("Run: strider install")
            }
            Self::ConfigInvalid { .. } => Some("Run: strider config show"),
            _ => None,
        }
    }
}
