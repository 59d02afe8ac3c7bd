//! Status command - registration, caches and recent lifecycle events

use super::{load_registration, storage};
use crate::config::{Config, ConfigManager};
use crate::error::StriderResult;
use crate::journal::Journal;
use crate::registration::WorkerRecord;
use crate::ui::{self, UiContext};
use tracing::warn;

const RECENT_EVENTS: usize = 5;

/// Execute the status command
pub async fn execute(config: &Config) -> StriderResult<()> {
    let ctx = UiContext::detect();
    ui::heading(&ctx, "Strider Status");

    ui::section(&ctx, "Configuration:");
    ui::key_value(&ctx, "version", &config.worker.version);
    ui::key_value(&ctx, "origin", &config.worker.origin);
    ui::key_value(&ctx, "manifest", &config.worker.manifest.len().to_string());
    ui::key_value(&ctx, "state dir", &ConfigManager::state_dir().display().to_string());

    ui::section(&ctx, "Registration:");
    let registration = load_registration().await?;
    match &registration {
        None => ui::step_warn_hint(&ctx, "No worker registered", "Run: strider install"),
        Some(reg) => {
            ui::key_value(&ctx, "scope", &reg.scope);
            print_record(&ctx, "active", reg.active.as_ref());
            print_record(&ctx, "waiting", reg.waiting.as_ref());

            let configured = &config.worker.version;
            let current = reg.active.as_ref().is_some_and(|a| &a.version == configured)
                || reg.waiting.as_ref().is_some_and(|w| &w.version == configured);
            if !current {
                ui::step_warn_hint(
                    &ctx,
                    &format!("Configured version {} is not installed", configured),
                    "Run: strider install",
                );
            }
        }
    }

    ui::section(&ctx, "Caches:");
    match storage().keys().await {
        Ok(names) if names.is_empty() => ui::remark(&ctx, "none"),
        Ok(names) => {
            for name in names {
                ui::step_info(&ctx, &name);
            }
        }
        Err(e) => {
            warn!("Failed to list caches: {}", e);
            ui::step_warn(&ctx, "Cache storage unreadable");
        }
    }

    let recent = Journal::new(config).tail(RECENT_EVENTS).await;
    if !recent.is_empty() {
        ui::section(&ctx, "Recent events:");
        for entry in recent {
            ui::remark(
                &ctx,
                &format!(
                    "{} {} {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    entry.event,
                    entry.data
                ),
            );
        }
    }

    Ok(())
}

fn print_record(ctx: &UiContext, label: &str, record: Option<&WorkerRecord>) {
    match record {
        Some(record) => ui::key_value_status(
            ctx,
            label,
            &format!("{} ({}, {} entries)", record.version, record.state, record.entries),
            record.state.is_controlling() || label == "waiting",
        ),
        None => ui::key_value(ctx, label, "-"),
    }
}
