//! Fetch command - offer one request to the active worker

use super::{build_worker, fetcher, load_registration};
use crate::cli::args::{FetchArgs, OutputFormat};
use crate::config::Config;
use crate::error::StriderResult;
use crate::http::{Method, Request, Response};
use crate::worker::{FetchOutcome, WorkerState};
use console::style;
use serde_json::json;
use tracing::{debug, warn};

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> StriderResult<()> {
    let active = load_registration().await?.and_then(|r| r.active);
    let (version, state) = match &active {
        Some(record) => (Some(record.version.as_str()), WorkerState::Activated),
        None => {
            warn!("No active worker; request goes straight to the network");
            (None, WorkerState::Parsed)
        }
    };

    let worker = build_worker(config, version, state, args.offline)?;
    // Absolute URLs pass through join unchanged
    let url = worker.config().resolve(&args.url)?;
    let method: Method = args.method.parse()?;

    let request = if args.navigate {
        Request::navigate(url)
    } else {
        Request::new(method, url)
    };
    debug!("Offering {} {} to {}", request.method, request.url, worker.cache_name());

    let (response, source) = match worker.handle_fetch(&request).await {
        FetchOutcome::Respond { response, source } => (response, source.to_string()),
        FetchOutcome::Passthrough => {
            let network = fetcher(worker.config(), config, args.offline);
            (network.fetch(&request).await?, "passthrough".to_string())
        }
    };

    print_response(&request, &response, &source, args.format)
}

fn print_response(
    request: &Request,
    response: &Response,
    source: &str,
    format: OutputFormat,
) -> StriderResult<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "url": request.url.as_str(),
                "method": request.method.as_str(),
                "source": source,
                "status": response.status,
                "status_text": response.status_text,
                "type": response.response_type.to_string(),
                "headers": response.headers,
                "body": response.text(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Plain => {
            print!("{}", response.text());
        }
        OutputFormat::Table => {
            let status = format!("{} {}", response.status, response.status_text);
            let status = if response.ok() {
                style(status).green()
            } else {
                style(status).yellow()
            };
            println!("{} {}", style(request.method.as_str()).bold(), request.url);
            println!("  {:<8} {}", style("source").dim(), source);
            println!("  {:<8} {}", style("status").dim(), status);
            println!("  {:<8} {}", style("type").dim(), response.response_type);
            for (name, value) in &response.headers {
                println!("  {:<8} {}: {}", style("header").dim(), name, value);
            }
            println!("  {:<8} {} bytes", style("body").dim(), response.body.len());
        }
    }
    Ok(())
}
