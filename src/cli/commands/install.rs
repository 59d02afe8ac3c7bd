//! Install command - seed the version's cache from the manifest

use super::{activate, build_worker, load_registration};
use crate::cli::args::InstallArgs;
use crate::config::Config;
use crate::error::StriderResult;
use crate::journal::Journal;
use crate::registration::{Registration, WorkerRecord};
use crate::ui::{self, UiContext};
use crate::worker::WorkerState;
use serde_json::json;
use tracing::debug;

/// Execute the install command
pub async fn execute(args: InstallArgs, config: &Config) -> StriderResult<()> {
    let ctx = UiContext::detect();
    let journal = Journal::new(config);
    let path = Registration::default_path();

    let worker = build_worker(config, None, WorkerState::Parsed, false)?;
    let version = worker.cache_name().to_string();

    let mut registration = load_registration()
        .await?
        .unwrap_or_else(|| Registration::new(worker.config().origin.as_str()));

    let already_active = registration
        .active
        .as_ref()
        .is_some_and(|active| active.version == version);
    if already_active && !args.force {
        ui::step_warn_hint(
            &ctx,
            &format!("Version {} is already active", version),
            "Use --force to reinstall",
        );
        return Ok(());
    }

    ui::heading(&ctx, &format!("Installing {}", version));
    ui::remark(
        &ctx,
        &format!("{} manifest entries", worker.config().manifest.len()),
    );

    let entries = match worker.install().await {
        Ok(entries) => entries,
        Err(e) => {
            journal
                .record(
                    "worker.install_failed",
                    &json!({
                        "version": version,
                        "reason": e.to_string(),
                        "retryable": e.is_retryable(),
                    }),
                )
                .await;
            return Err(e);
        }
    };

    registration.set_waiting(WorkerRecord::installed(&version, entries));
    registration.save(&path).await?;
    journal
        .record(
            "worker.installed",
            &json!({ "version": version, "entries": entries }),
        )
        .await;
    ui::step_ok_detail(&ctx, &format!("Cached {} entries", entries), &version);

    if args.no_activate {
        ui::step_warn_hint(&ctx, "Waiting to activate", "Run: strider activate");
        return Ok(());
    }

    if worker.is_skip_waiting() {
        debug!("Skip-waiting requested, activating {}", version);
        activate::activate_waiting(&ctx, &worker, &mut registration, &journal).await?;
    }

    Ok(())
}
