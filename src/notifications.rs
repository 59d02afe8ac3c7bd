//! Push notification display and click routing

use crate::config::schema::NotificationConfig;
use crate::error::StriderResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Identifier of the action that opens the map view
pub const ACTION_EXPLORE: &str = "explore";

/// Identifier of the action that only dismisses the notification
pub const ACTION_CLOSE: &str = "close";

/// Payload of an incoming push message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushPayload {
    pub text: Option<String>,
}

impl PushPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode raw push data; empty data means no payload
    pub fn from_bytes(data: &[u8]) -> Self {
        if data.is_empty() {
            return Self::empty();
        }
        Self::text(String::from_utf8_lossy(data))
    }
}

/// Button shown on a notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// A notification as handed to the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub vibrate: Vec<u32>,
    pub actions: Vec<NotificationAction>,
    pub arrived_at: DateTime<Utc>,
}

impl Notification {
    /// Build the notification shown for a push message
    pub fn from_push(payload: &PushPayload, config: &NotificationConfig) -> Self {
        let body = payload
            .text
            .clone()
            .unwrap_or_else(|| config.default_body.clone());

        Self {
            id: Uuid::new_v4(),
            title: config.title.clone(),
            body,
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            vibrate: config.vibrate.clone(),
            actions: vec![
                NotificationAction {
                    action: ACTION_EXPLORE.to_string(),
                    title: "Explore routes".to_string(),
                    icon: Some(config.icon.clone()),
                },
                NotificationAction {
                    action: ACTION_CLOSE.to_string(),
                    title: "Close".to_string(),
                    icon: None,
                },
            ],
            arrived_at: Utc::now(),
        }
    }
}

/// What a notification click asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickAction {
    /// Open or focus the map view
    Explore,
    /// Dismiss only
    Close,
    /// Body click or unknown action: open or focus the app root
    Default,
}

impl ClickAction {
    pub fn parse(action: Option<&str>) -> Self {
        match action {
            Some(ACTION_EXPLORE) => Self::Explore,
            Some(ACTION_CLOSE) => Self::Close,
            _ => Self::Default,
        }
    }
}

/// Platform notification display
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn show(&self, notification: Notification) -> StriderResult<()>;

    /// Dismiss a shown notification; unknown ids are ignored
    async fn close(&self, id: Uuid) -> StriderResult<()>;
}

/// Notifier that keeps shown notifications in memory
#[derive(Debug, Default)]
pub struct NotificationCenter {
    shown: Mutex<Vec<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications currently displayed, oldest first
    pub async fn shown(&self) -> Vec<Notification> {
        self.shown.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for NotificationCenter {
    async fn show(&self, notification: Notification) -> StriderResult<()> {
        debug!("Showing notification {}: {}", notification.id, notification.body);
        self.shown.lock().await.push(notification);
        Ok(())
    }

    async fn close(&self, id: Uuid) -> StriderResult<()> {
        self.shown.lock().await.retain(|n| n.id != id);
        Ok(())
    }
}
