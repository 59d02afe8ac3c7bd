//! Push command - deliver a push message and show the notification

use super::event_dispatcher;
use crate::cli::args::{OutputFormat, PushArgs};
use crate::config::Config;
use crate::error::StriderResult;
use crate::events::{EventOutcome, WorkerEvent};
use crate::journal::Journal;
use crate::notifications::{NotificationCenter, PushPayload};
use crate::ui::{self, UiContext};
use console::style;
use serde_json::json;
use std::sync::Arc;

/// Execute the push command
pub async fn execute(args: PushArgs, config: &Config) -> StriderResult<()> {
    let ctx = UiContext::detect();
    let center = Arc::new(NotificationCenter::new());
    let (dispatcher, _clients) = event_dispatcher(config, center.clone()).await?;

    let payload = match args.body {
        Some(body) => PushPayload::text(body),
        None => PushPayload::empty(),
    };

    let EventOutcome::NotificationShown(notification) =
        dispatcher.dispatch(WorkerEvent::Push(payload)).await?
    else {
        ui::step_warn(&ctx, "No notification was shown");
        return Ok(());
    };

    Journal::new(config)
        .record(
            "push.shown",
            &json!({ "notification": notification.id, "body": notification.body }),
        )
        .await;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&notification)?),
        OutputFormat::Plain => println!("{}", notification.body),
        OutputFormat::Table => {
            println!("{}", style(&notification.title).bold());
            println!("  {}", notification.body);
            let actions: Vec<_> = notification
                .actions
                .iter()
                .map(|a| format!("[{}] {}", a.action, a.title))
                .collect();
            ui::key_value(&ctx, "actions", &actions.join("  "));
            ui::key_value(&ctx, "icon", &notification.icon);
            ui::key_value(&ctx, "id", &notification.id.to_string());
        }
    }

    Ok(())
}
