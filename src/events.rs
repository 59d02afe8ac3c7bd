//! Event dispatch table for the worker
//!
//! Every platform event is routed by kind to one asynchronous handler.
//! Push, notification-click and install-prompt handlers are fire-and-forget:
//! they log their own failures and always return `Ok`.

use crate::clients::{Clients, WindowAction};
use crate::config::schema::NotificationConfig;
use crate::error::StriderResult;
use crate::http::Request;
use crate::install_prompt::{InstallPrompt, InstallPromptRelay, PromptRelay};
use crate::notifications::{ClickAction, Notification, Notifier, PushPayload};
use crate::worker::{ActivationReport, AssetCache, FetchOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// Message type asking a waiting worker to activate immediately
pub const SKIP_WAITING_MESSAGE: &str = "SKIP_WAITING";

/// An event delivered to the worker
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    Push(PushPayload),
    NotificationClick {
        notification: Option<Uuid>,
        action: Option<String>,
    },
    BeforeInstallPrompt(InstallPrompt),
    AppInstalled,
    /// Message posted by a client
    Message(serde_json::Value),
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Install => EventKind::Install,
            Self::Activate => EventKind::Activate,
            Self::Fetch(_) => EventKind::Fetch,
            Self::Push(_) => EventKind::Push,
            Self::NotificationClick { .. } => EventKind::NotificationClick,
            Self::BeforeInstallPrompt(_) => EventKind::BeforeInstallPrompt,
            Self::AppInstalled => EventKind::AppInstalled,
            Self::Message(_) => EventKind::Message,
        }
    }
}

/// Key of the dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Push,
    NotificationClick,
    BeforeInstallPrompt,
    AppInstalled,
    Message,
}

/// What handling an event produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Installed { entries: usize },
    Activated(ActivationReport),
    Fetch(FetchOutcome),
    NotificationShown(Notification),
    /// Window focused or opened by a click; `None` when only dismissed
    Window(Option<WindowAction>),
    PromptRelayed(PromptRelay),
    InstalledRelayed { delivered: bool },
    Ignored,
}

/// Asynchronous handler for one or more event kinds
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: WorkerEvent) -> StriderResult<EventOutcome>;
}

/// Table from event kind to handler
#[derive(Default, Clone)]
pub struct Dispatcher {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one for this kind
    pub fn on(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) -> &mut Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Run the handler for this event; unregistered kinds are ignored
    pub async fn dispatch(&self, event: WorkerEvent) -> StriderResult<EventOutcome> {
        let kind = event.kind();
        match self.handlers.get(&kind) {
            Some(handler) => handler.handle(event).await,
            None => {
                debug!("No handler for {:?}", kind);
                Ok(EventOutcome::Ignored)
            }
        }
    }

    /// Handle the event on its own task
    pub fn spawn(self: &Arc<Self>, event: WorkerEvent) -> JoinHandle<StriderResult<EventOutcome>> {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move { dispatcher.dispatch(event).await })
    }

    /// Standard table: lifecycle and fetch on the cache manager, push and
    /// clicks on the notifier, install prompts relayed to the worker's clients
    pub fn for_worker(
        worker: Arc<AssetCache>,
        notifier: Arc<dyn Notifier>,
        notifications: NotificationConfig,
    ) -> Self {
        let clients = worker.clients().clone();
        let lifecycle: Arc<dyn EventHandler> = Arc::new(LifecycleHandler {
            worker: worker.clone(),
        });
        let push: Arc<dyn EventHandler> = Arc::new(PushHandler {
            notifier: notifier.clone(),
            config: notifications,
        });
        let click: Arc<dyn EventHandler> = Arc::new(ClickHandler {
            worker: worker.clone(),
            clients: clients.clone(),
            notifier,
        });
        let relay: Arc<dyn EventHandler> = Arc::new(RelayHandler {
            relay: InstallPromptRelay::new(clients),
        });
        let message: Arc<dyn EventHandler> = Arc::new(MessageHandler { worker });

        let mut dispatcher = Self::new();
        dispatcher
            .on(EventKind::Install, lifecycle.clone())
            .on(EventKind::Activate, lifecycle.clone())
            .on(EventKind::Fetch, lifecycle)
            .on(EventKind::Push, push)
            .on(EventKind::NotificationClick, click)
            .on(EventKind::BeforeInstallPrompt, relay.clone())
            .on(EventKind::AppInstalled, relay)
            .on(EventKind::Message, message);
        dispatcher
    }
}

struct LifecycleHandler {
    worker: Arc<AssetCache>,
}

#[async_trait]
impl EventHandler for LifecycleHandler {
    async fn handle(&self, event: WorkerEvent) -> StriderResult<EventOutcome> {
        match event {
            WorkerEvent::Install => Ok(EventOutcome::Installed {
                entries: self.worker.install().await?,
            }),
            WorkerEvent::Activate => Ok(EventOutcome::Activated(self.worker.activate().await?)),
            WorkerEvent::Fetch(request) => {
                Ok(EventOutcome::Fetch(self.worker.handle_fetch(&request).await))
            }
            _ => Ok(EventOutcome::Ignored),
        }
    }
}

struct PushHandler {
    notifier: Arc<dyn Notifier>,
    config: NotificationConfig,
}

#[async_trait]
impl EventHandler for PushHandler {
    async fn handle(&self, event: WorkerEvent) -> StriderResult<EventOutcome> {
        let WorkerEvent::Push(payload) = event else {
            return Ok(EventOutcome::Ignored);
        };

        let notification = Notification::from_push(&payload, &self.config);
        match self.notifier.show(notification.clone()).await {
            Ok(()) => Ok(EventOutcome::NotificationShown(notification)),
            Err(e) => {
                warn!("Failed to show notification: {}", e);
                Ok(EventOutcome::Ignored)
            }
        }
    }
}

struct ClickHandler {
    worker: Arc<AssetCache>,
    clients: Arc<Clients>,
    notifier: Arc<dyn Notifier>,
}

#[async_trait]
impl EventHandler for ClickHandler {
    async fn handle(&self, event: WorkerEvent) -> StriderResult<EventOutcome> {
        let WorkerEvent::NotificationClick {
            notification,
            action,
        } = event
        else {
            return Ok(EventOutcome::Ignored);
        };

        if let Some(id) = notification {
            if let Err(e) = self.notifier.close(id).await {
                warn!("Failed to close notification {}: {}", id, e);
            }
        }

        let target = match ClickAction::parse(action.as_deref()) {
            ClickAction::Close => return Ok(EventOutcome::Window(None)),
            ClickAction::Explore => self.worker.config().map_view.clone(),
            ClickAction::Default => self.worker.config().root.clone(),
        };

        let window = self.clients.open_or_focus(target).await;
        debug!("Notification click routed to {:?}", window);
        Ok(EventOutcome::Window(Some(window)))
    }
}

struct RelayHandler {
    relay: InstallPromptRelay,
}

#[async_trait]
impl EventHandler for RelayHandler {
    async fn handle(&self, event: WorkerEvent) -> StriderResult<EventOutcome> {
        match event {
            WorkerEvent::BeforeInstallPrompt(prompt) => Ok(EventOutcome::PromptRelayed(
                self.relay.relay_prompt(prompt).await,
            )),
            WorkerEvent::AppInstalled => Ok(EventOutcome::InstalledRelayed {
                delivered: self.relay.relay_installed().await,
            }),
            _ => Ok(EventOutcome::Ignored),
        }
    }
}

struct MessageHandler {
    worker: Arc<AssetCache>,
}

#[async_trait]
impl EventHandler for MessageHandler {
    async fn handle(&self, event: WorkerEvent) -> StriderResult<EventOutcome> {
        let WorkerEvent::Message(message) = event else {
            return Ok(EventOutcome::Ignored);
        };

        if message.get("type").and_then(|t| t.as_str()) == Some(SKIP_WAITING_MESSAGE) {
            debug!("Client requested skip waiting");
            self.worker.skip_waiting();
        }
        Ok(EventOutcome::Ignored)
    }
}
