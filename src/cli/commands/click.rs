//! Click command - route a notification click to a window

use super::event_dispatcher;
use crate::cli::args::ClickArgs;
use crate::clients::WindowAction;
use crate::config::Config;
use crate::error::StriderResult;
use crate::events::{EventOutcome, WorkerEvent};
use crate::notifications::NotificationCenter;
use crate::ui::{self, UiContext};
use std::sync::Arc;

/// Execute the click command
pub async fn execute(args: ClickArgs, config: &Config) -> StriderResult<()> {
    let ctx = UiContext::detect();
    let (dispatcher, clients) =
        event_dispatcher(config, Arc::new(NotificationCenter::new())).await?;

    let outcome = dispatcher
        .dispatch(WorkerEvent::NotificationClick {
            notification: None,
            action: args.action,
        })
        .await?;

    match outcome {
        EventOutcome::Window(Some(window)) => {
            let url = clients
                .get(window.client_id())
                .await
                .map(|client| client.url.to_string())
                .unwrap_or_default();
            let verb = match window {
                WindowAction::Focused(_) => "Focused",
                WindowAction::Opened(_) => "Opened",
            };
            ui::step_ok(&ctx, &format!("{} {}", verb, url));
        }
        _ => ui::step_info(&ctx, "Notification dismissed"),
    }

    Ok(())
}
