//! Command-line driver for the resilient call engine.
//!
//! Issues one or more concurrent logical calls against the configured
//! endpoints and reports each outcome with its attempt history.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use futures_util::future::join_all;
use http::Method;
use serde_json::json;

use resilient_call::call::TracingObserver;
use resilient_call::config::loader::read_config;
use resilient_call::observability::{logging, metrics};
use resilient_call::{CallEngine, EngineConfig, PreparedRequest};

#[derive(Parser)]
#[command(name = "resilient-call")]
#[command(about = "Issue resilient HTTP calls against a replicated service", long_about = None)]
struct Cli {
    /// TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint base URL. Repeat to list several; replaces the config's list.
    #[arg(short, long = "endpoint")]
    endpoints: Vec<String>,

    #[arg(short, long, default_value = "/")]
    path: String,

    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Number of concurrent logical calls.
    #[arg(short = 'n', long, default_value_t = 1)]
    concurrency: usize,

    /// Print results with their attempt history as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => EngineConfig::default(),
    };
    if !cli.endpoints.is_empty() {
        config.endpoints = cli.endpoints.clone();
    }

    logging::init_logging(&config.observability.log_level);

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let method = Method::from_bytes(cli.method.to_uppercase().as_bytes())?;
    let engine = CallEngine::from_config(&config)?.with_observer(Arc::new(TracingObserver));

    tracing::info!(
        service = %config.service,
        method = %method,
        path = %cli.path,
        concurrency = cli.concurrency,
        "Issuing calls"
    );

    let calls = (0..cli.concurrency.max(1))
        .map(|_| engine.execute(PreparedRequest::new(method.clone(), cli.path.clone())));
    let results = join_all(calls).await;

    let mut failures = 0;
    for result in results {
        match result {
            Ok(done) => {
                if cli.json {
                    let report = json!({
                        "call_id": done.call_id,
                        "ok": true,
                        "status": done.response.status().as_u16(),
                        "endpoint": done.endpoint.as_str(),
                        "attempts": done.attempts,
                        "relocations": done.relocations,
                        "history": done.history,
                    });
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    println!(
                        "{} {} from {} after {} attempt(s)",
                        done.call_id,
                        done.response.status(),
                        done.endpoint,
                        done.attempts
                    );
                }
            }
            Err(err) => {
                failures += 1;
                if cli.json {
                    let report = json!({
                        "call_id": err.call_id,
                        "ok": false,
                        "error": err.kind().label(),
                        "message": err.to_string(),
                        "endpoint": err.last_endpoint.as_str(),
                        "attempts": err.attempts,
                        "history": err.history,
                    });
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    eprintln!("Error: {}", err);
                }
            }
        }
    }

    let limiter = engine.limiter(engine.service());
    tracing::info!(
        failures,
        limit = limiter.limit(),
        window = %limiter.window(),
        "Done"
    );

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
