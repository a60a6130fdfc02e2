//! urlvault server entry point.
//!
//! Boots the MCP server on stdio transport. Logging goes to stderr to avoid
//! interfering with the JSON-RPC protocol on stdout. A background task runs
//! cache cleanup on a fixed schedule alongside request traffic.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use urlvault_client::UrlPipeline;
use urlvault_core::cache::CleanupOptions;
use urlvault_core::{AppConfig, CacheDb};

mod handler;
mod tools;

fn spawn_scheduled_cleanup(cache: CacheDb, config: &AppConfig) {
    let options = CleanupOptions {
        older_than_days: config.failed_retention_days,
        max_entries: config.max_cache_size,
        ..Default::default()
    };
    let interval = Duration::from_secs(config.cleanup_interval_secs);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; cleanup starts one interval in.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match cache.cleanup(options.clone()).await {
                Ok(report) if report.total_removed > 0 => {
                    tracing::info!(
                        expired = report.expired_removed,
                        failed = report.failed_removed,
                        evicted = report.evicted,
                        remaining = report.remaining_entries,
                        "scheduled cleanup removed entries"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "scheduled cleanup failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(db_path = %config.db_path.display(), "starting urlvault server on stdio transport");

    let cache = CacheDb::open(&config.db_path).await?;
    let pipeline = Arc::new(UrlPipeline::new(&config, cache.clone()).await?);

    spawn_scheduled_cleanup(cache, &config);

    let handler = handler::UrlVaultServer::new(config, Arc::clone(&pipeline));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    // Resource release on exit: the headless browser must not outlive us.
    pipeline.shutdown().await;

    Ok(())
}
