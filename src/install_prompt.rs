//! Relay of install-prompt events to client windows

use crate::clients::{ClientMessage, Clients};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Handle to a deferred install prompt
///
/// The client passes `id` back to the platform when the user asks to install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallPrompt {
    pub id: Uuid,
    /// Platforms the prompt can install to (e.g. "web", "play")
    pub platforms: Vec<String>,
}

impl InstallPrompt {
    pub fn new(platforms: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            platforms,
        }
    }
}

/// Outcome of relaying an install prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptRelay {
    /// The browser's own prompt was suppressed
    pub default_prevented: bool,
    /// A client received the handle
    pub delivered: bool,
}

/// Forwards install-related platform events to the first client window
pub struct InstallPromptRelay {
    clients: Arc<Clients>,
}

impl InstallPromptRelay {
    pub fn new(clients: Arc<Clients>) -> Self {
        Self { clients }
    }

    /// Suppress the default prompt and hand it to the presentation layer
    pub async fn relay_prompt(&self, prompt: InstallPrompt) -> PromptRelay {
        debug!("Deferring install prompt {}", prompt.id);
        let delivered = self
            .clients
            .notify_clients(ClientMessage::InstallPromptAvailable { prompt })
            .await;

        PromptRelay {
            default_prevented: true,
            delivered,
        }
    }

    pub async fn relay_installed(&self) -> bool {
        info!("Application installed");
        self.clients.notify_clients(ClientMessage::AppInstalled).await
    }
}
