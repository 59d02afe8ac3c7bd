//! Configuration schema for Strider
//!
//! Configuration is stored at `~/.config/strider/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Worker version, manifest and caching rules
    pub worker: WorkerSettings,

    /// Network settings for cache misses
    pub network: NetworkConfig,

    /// Push notification appearance
    pub notifications: NotificationConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append lifecycle events to the journal
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            journal: true,
        }
    }
}

/// Worker configuration
///
/// Changing `manifest` requires bumping `version`, otherwise clients keep
/// the assets cached under the old tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Version tag, also the Named Cache name
    pub version: String,

    /// Origin the application is served from
    pub origin: String,

    /// Seed URLs written at install time (absolute or origin-relative)
    pub manifest: Vec<String>,

    /// External hosts whose responses may be cached
    pub allowed_hosts: Vec<String>,

    /// Path of the application shell document
    pub root_path: String,

    /// Path opened by the "explore" notification action
    pub map_path: String,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            version: "gowalking-v1".to_string(),
            origin: "http://localhost:3000".to_string(),
            manifest: vec![
                "/".to_string(),
                "/static/js/bundle.js".to_string(),
                "/static/css/main.css".to_string(),
                "/manifest.json".to_string(),
                "https://unpkg.com/maplibre-gl@3.6.2/dist/maplibre-gl.js".to_string(),
                "https://unpkg.com/maplibre-gl@3.6.2/dist/maplibre-gl.css".to_string(),
                "https://fonts.googleapis.com/css2?family=Inter:wght@400;600;700&display=swap"
                    .to_string(),
                "https://fonts.googleapis.com/css2?family=Poppins:wght@500;700&display=swap"
                    .to_string(),
            ],
            allowed_hosts: vec![
                "fonts.googleapis.com".to_string(),
                "unpkg.com".to_string(),
                "tile.openstreetmap.org".to_string(),
            ],
            root_path: "/".to_string(),
            map_path: "/map".to_string(),
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Transport-level timeout for a single fetch
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("strider/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Notification appearance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Fixed notification title
    pub title: String,

    /// Body used when a push carries no text
    pub default_body: String,

    pub icon: String,

    pub badge: String,

    /// Vibration pattern in milliseconds (on, off, on, ...)
    pub vibrate: Vec<u32>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "GoWalking".to_string(),
            default_body: "Time for a walk! New routes are waiting for you.".to_string(),
            icon: "/icons/icon-192x192.png".to_string(),
            badge: "/icons/icon-72x72.png".to_string(),
            vibrate: vec![100, 50, 100],
        }
    }
}
