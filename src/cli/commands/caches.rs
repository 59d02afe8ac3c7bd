//! Caches command - inspect and clear Named Caches

use super::{load_registration, storage};
use crate::cache::{validate_cache_name, CacheStorage};
use crate::cli::args::{CachesAction, CachesArgs, OutputFormat};
use crate::config::Config;
use crate::error::StriderResult;
use crate::journal::Journal;
use crate::registration::{Registration, WorkerRecord};
use crate::ui::{self, UiContext};
use console::style;
use serde::Serialize;
use std::sync::Arc;

/// Execute the caches command
pub async fn execute(args: CachesArgs, config: &Config) -> StriderResult<()> {
    let storage = storage();

    match args.action {
        CachesAction::List { format } => list(&storage, format).await,
        CachesAction::Show { name, format } => show(&storage, &name, format).await,
        CachesAction::Clear { stale } => clear(&storage, config, stale).await,
    }
}

#[derive(Serialize)]
struct CacheSummary {
    name: String,
    entries: usize,
    role: &'static str,
}

async fn list(storage: &Arc<dyn CacheStorage>, format: OutputFormat) -> StriderResult<()> {
    let registration = load_registration().await?;
    let mut summaries = Vec::new();

    for name in storage.keys().await? {
        let entries = storage.entries(&name).await?.len();
        let role = role_of(registration.as_ref(), &name);
        summaries.push(CacheSummary {
            name,
            entries,
            role,
        });
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Plain => {
            for summary in &summaries {
                println!("{}", summary.name);
            }
        }
        OutputFormat::Table => {
            if summaries.is_empty() {
                println!("No caches.");
                return Ok(());
            }
            println!("{:<24} {:>8}  {}", "NAME", "ENTRIES", "ROLE");
            for summary in &summaries {
                let role = match summary.role {
                    "active" => style(summary.role).green(),
                    "waiting" => style(summary.role).cyan(),
                    _ => style(summary.role).dim(),
                };
                println!("{:<24} {:>8}  {}", summary.name, summary.entries, role);
            }
        }
    }
    Ok(())
}

fn role_of(registration: Option<&Registration>, name: &str) -> &'static str {
    let is = |record: Option<&WorkerRecord>| record.is_some_and(|r| r.version == name);
    match registration {
        Some(reg) if is(reg.active.as_ref()) => "active",
        Some(reg) if is(reg.waiting.as_ref()) => "waiting",
        _ => "stale",
    }
}

async fn show(
    storage: &Arc<dyn CacheStorage>,
    name: &str,
    format: OutputFormat,
) -> StriderResult<()> {
    validate_cache_name(name)?;
    let entries = storage.entries(name).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Plain => {
            for entry in &entries {
                println!("{}", entry.key.url);
            }
        }
        OutputFormat::Table => {
            println!("{:<6} {:<8} {:<20} URL", "STATUS", "TYPE", "CACHED");
            for entry in &entries {
                println!(
                    "{:<6} {:<8} {:<20} {}",
                    entry.response.status,
                    entry.response.response_type,
                    entry.cached_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.key.url
                );
            }
        }
    }
    Ok(())
}

/// Delete every cache, or only those owned by neither the active nor the
/// waiting version
///
/// A full clear also drops the registration, since no version can serve
/// without its cache.
async fn clear(storage: &Arc<dyn CacheStorage>, config: &Config, stale: bool) -> StriderResult<()> {
    let ctx = UiContext::detect();
    let journal = Journal::new(config);
    let registration = load_registration().await?;

    let mut deleted = Vec::new();
    for name in storage.keys().await? {
        if stale && role_of(registration.as_ref(), &name) != "stale" {
            continue;
        }
        if storage.delete(&name).await? {
            ui::step_ok(&ctx, &format!("Deleted {}", name));
            deleted.push(name);
        }
    }

    if !stale && registration.is_some() {
        Registration::delete(&Registration::default_path()).await?;
        ui::step_info(&ctx, "Registration removed");
    }

    if deleted.is_empty() {
        ui::remark(&ctx, "Nothing to delete");
    }

    journal
        .record(
            "caches.cleared",
            &serde_json::json!({ "deleted": deleted, "stale_only": stale }),
        )
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_follow_registration() {
        let mut reg = Registration::new("http://localhost:3000/");
        reg.set_waiting(WorkerRecord::installed("v1", 2));
        reg.promote_waiting().unwrap();
        reg.set_waiting(WorkerRecord::installed("v2", 2));

        assert_eq!(role_of(Some(&reg), "v1"), "active");
        assert_eq!(role_of(Some(&reg), "v2"), "waiting");
        assert_eq!(role_of(Some(&reg), "v0"), "stale");
        assert_eq!(role_of(None, "v1"), "stale");
    }
}
