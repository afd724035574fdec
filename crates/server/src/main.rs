//! telepull-server — trigger surface and scheduler for the channel puller.
//!
//! Wires the pointer store and the HTTP fetcher into a tick handler,
//! exposes it over HTTP for an external scheduler, and optionally drives
//! it from an internal cron loop.

mod api;
mod router;
mod scheduler;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::info;

use telepull_connector::{
    HttpFetcher, JsonPointerStore, MemoryPointerStore, PointerStore, TickHandler, TriggerKind,
};
use telepull_core::Config;

/// HTTP trigger surface for the Telegram channel puller.
#[derive(Parser, Debug)]
#[command(name = "telepull-server", version, about)]
struct Cli {
    /// Run a single tick and exit instead of serving (for external cron
    /// without an HTTP hop).
    #[arg(long)]
    once: bool,
}

fn build_store(config: &Config) -> Arc<dyn PointerStore> {
    match config.store.backend.as_str() {
        "memory" => Arc::new(MemoryPointerStore::new()),
        _ => Arc::new(JsonPointerStore::new(&config.store.path)),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    telepull_core::config::load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let store = build_store(&config);
    let fetcher = HttpFetcher::new(
        config.fetcher.base_url.clone(),
        Duration::from_secs(config.fetcher.timeout_secs),
    )
    .context("failed to build fetcher client")?;

    let handler = TickHandler::new(store.clone(), Arc::new(fetcher));

    if cli.once {
        let report = handler.run(TriggerKind::Scheduled).await?;
        info!(
            tick = %report.id,
            records = report.records_fetched,
            advanced = report.cursors_advanced.len(),
            "single tick complete"
        );
        return Ok(());
    }

    let state = Arc::new(state::AppState {
        runner: state::TickRunner::new(handler),
        store,
        started_at: Utc::now(),
        config,
    });

    tokio::spawn(scheduler::run_tick_scheduler(state.clone()));

    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("server listening on http://{}", addr);
    axum::serve(listener, router::build_router(state)).await?;

    Ok(())
}
