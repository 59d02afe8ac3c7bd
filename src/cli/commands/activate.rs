//! Activate command - promote the waiting version and purge stale caches

use super::{build_worker, load_registration};
use crate::config::Config;
use crate::error::{StriderError, StriderResult};
use crate::journal::Journal;
use crate::registration::Registration;
use crate::ui::{self, UiContext};
use crate::worker::{AssetCache, WorkerState};
use serde_json::json;

/// Execute the activate command
pub async fn execute(config: &Config) -> StriderResult<()> {
    let ctx = UiContext::detect();
    let journal = Journal::new(config);

    let mut registration = load_registration()
        .await?
        .ok_or(StriderError::NotRegistered)?;

    let Some(waiting) = registration.waiting.as_ref() else {
        let state = registration
            .active
            .as_ref()
            .map(|active| active.state.to_string())
            .unwrap_or_else(|| WorkerState::Parsed.to_string());
        return Err(StriderError::InvalidTransition {
            action: "activate".to_string(),
            state,
        });
    };

    let worker = build_worker(
        config,
        Some(&waiting.version),
        WorkerState::Installed,
        false,
    )?;
    activate_waiting(&ctx, &worker, &mut registration, &journal).await
}

/// Activate an installed worker and persist the promotion
pub(crate) async fn activate_waiting(
    ctx: &UiContext,
    worker: &AssetCache,
    registration: &mut Registration,
    journal: &Journal,
) -> StriderResult<()> {
    let report = worker.activate().await?;
    let previous = registration.promote_waiting()?;
    registration.save(&Registration::default_path()).await?;

    journal
        .record(
            "worker.activated",
            &json!({
                "version": worker.cache_name(),
                "deleted": report.deleted,
                "claimed": report.claimed,
                "previous": previous.as_ref().map(|p| p.version.as_str()),
            }),
        )
        .await;

    for name in &report.deleted {
        ui::step_info(ctx, &format!("Deleted stale cache {}", name));
    }
    ui::step_ok(ctx, &format!("Activated {}", worker.cache_name()));
    Ok(())
}
