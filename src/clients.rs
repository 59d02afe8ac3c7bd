//! Client windows controlled by the worker and the messages sent to them
//!
//! The worker never calls into a client directly. Each registered client
//! gets an unbounded mailbox; the presentation layer drains it.

use crate::error::{StriderError, StriderResult};
use crate::install_prompt::InstallPrompt;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

/// Message posted from the worker to a client window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// The platform offered an install prompt; the client may trigger it later
    InstallPromptAvailable { prompt: InstallPrompt },
    /// The application was installed
    AppInstalled,
}

/// Unique identifier for a client window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(Uuid);

impl ClientId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0.simple())
    }
}

/// Snapshot of a client window
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    pub url: Url,
    pub focused: bool,
    /// Whether the current worker controls this client
    pub controlled: bool,
    mailbox: mpsc::UnboundedSender<ClientMessage>,
}

/// Result of routing a window request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAction {
    /// An existing window at the target URL was focused
    Focused(ClientId),
    /// A new window was opened
    Opened(ClientId),
}

impl WindowAction {
    pub fn client_id(&self) -> ClientId {
        match self {
            Self::Focused(id) | Self::Opened(id) => *id,
        }
    }
}

/// Registry of client windows, in registration order
#[derive(Debug, Default)]
pub struct Clients {
    clients: RwLock<Vec<Client>>,
    /// Mailboxes of windows the worker opened itself, until the window
    /// picks them up
    unclaimed: Mutex<HashMap<ClientId, mpsc::UnboundedReceiver<ClientMessage>>>,
}

impl Clients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an open window and return its mailbox
    pub async fn register(&self, url: Url) -> (ClientId, mpsc::UnboundedReceiver<ClientMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = ClientId::new();
        self.clients.write().await.push(Client {
            id,
            url,
            focused: false,
            controlled: false,
            mailbox: tx,
        });
        debug!("Registered {}", id);
        (id, rx)
    }

    /// Forget a closed window
    pub async fn unregister(&self, id: ClientId) -> bool {
        self.unclaimed.lock().await.remove(&id);
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|c| c.id != id);
        clients.len() != before
    }

    /// Take control of every open client without waiting for a reload
    pub async fn claim(&self) -> usize {
        let mut clients = self.clients.write().await;
        for client in clients.iter_mut() {
            client.controlled = true;
        }
        info!("Claimed {} client(s)", clients.len());
        clients.len()
    }

    pub async fn match_all(&self) -> Vec<Client> {
        self.clients.read().await.clone()
    }

    pub async fn get(&self, id: ClientId) -> Option<Client> {
        self.clients.read().await.iter().find(|c| c.id == id).cloned()
    }

    /// Focus one window, unfocusing the others
    pub async fn focus(&self, id: ClientId) -> StriderResult<()> {
        let mut clients = self.clients.write().await;
        if !clients.iter().any(|c| c.id == id) {
            return Err(StriderError::ClientNotFound(id.to_string()));
        }
        for client in clients.iter_mut() {
            client.focused = client.id == id;
        }
        Ok(())
    }

    /// Open a new focused window at `url`
    pub async fn open_window(&self, url: Url) -> (ClientId, mpsc::UnboundedReceiver<ClientMessage>) {
        let (id, rx) = self.register(url).await;
        // A freshly opened window always exists
        let _ = self.focus(id).await;
        (id, rx)
    }

    /// Focus a window already showing `url`, or open one
    pub async fn open_or_focus(&self, url: Url) -> WindowAction {
        let existing = self
            .clients
            .read()
            .await
            .iter()
            .find(|c| c.url == url)
            .map(|c| c.id);

        if let Some(id) = existing {
            if self.focus(id).await.is_ok() {
                return WindowAction::Focused(id);
            }
        }

        let (id, mailbox) = self.open_window(url).await;
        self.unclaimed.lock().await.insert(id, mailbox);
        WindowAction::Opened(id)
    }

    /// Hand over the mailbox of a window opened by `open_or_focus`
    ///
    /// Messages posted before the window took its mailbox are kept.
    pub async fn take_mailbox(
        &self,
        id: ClientId,
    ) -> Option<mpsc::UnboundedReceiver<ClientMessage>> {
        self.unclaimed.lock().await.remove(&id)
    }

    /// Deliver a message to one client
    pub async fn post_message(&self, id: ClientId, message: ClientMessage) -> StriderResult<()> {
        let client = self
            .get(id)
            .await
            .ok_or_else(|| StriderError::ClientNotFound(id.to_string()))?;

        client
            .mailbox
            .send(message)
            .map_err(|_| StriderError::ClientNotFound(format!("{} (disconnected)", id)))
    }

    /// Deliver a message to the first client still listening
    ///
    /// Clients whose mailbox was dropped are skipped. Returns whether a
    /// client received it. Delivery is fire-and-forget.
    pub async fn notify_clients(&self, message: ClientMessage) -> bool {
        let clients = self.clients.read().await;
        for client in clients.iter() {
            match client.mailbox.send(message.clone()) {
                Ok(()) => return true,
                Err(_) => debug!("Skipping disconnected {}", client.id),
            }
        }
        debug!("No client to notify");
        false
    }
}
