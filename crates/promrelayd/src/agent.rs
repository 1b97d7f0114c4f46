//! The agent loop: resolve sources once, then poll each one.

use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use promrelay_core::SourceConfig;
use promrelay_scrape::scrape;

use crate::flags::SourceFlag;

/// Resolve every `--source` flag into a scrape target.
///
/// The first malformed flag aborts resolution; a partially configured
/// agent never starts.
pub fn resolve_sources(flags: &[SourceFlag]) -> anyhow::Result<Vec<SourceConfig>> {
    flags
        .iter()
        .map(|flag| {
            SourceConfig::from_uri(&flag.key, &flag.uri)
                .with_context(|| format!("resolving --source {}:{}", flag.key, flag.uri))
        })
        .collect()
}

/// Run one scrape of a source under the caller-imposed deadline and log
/// the outcome.
pub async fn scrape_once(config: &SourceConfig, timeout: Duration) {
    // scrape() inserts the path separator itself.
    let path = config.path.trim_start_matches('/');
    let result = tokio::time::timeout(
        timeout,
        scrape(&config.host, config.port, path, config.matchers.as_deref()),
    )
    .await;

    match result {
        Err(_) => warn!(
            component = %config.component,
            timeout_secs = timeout.as_secs(),
            "scrape timed out"
        ),
        Ok(Err(e)) => warn!(component = %config.component, error = %e, "scrape failed"),
        Ok(Ok(families)) => {
            let samples: usize = families.values().map(|f| f.samples.len()).sum();
            info!(
                component = %config.component,
                families = families.len(),
                samples,
                "scrape complete"
            );
        }
    }
}

/// Spawn one polling task per source and run until Ctrl-C.
pub async fn run(flags: Vec<SourceFlag>, interval: Duration, timeout: Duration) -> anyhow::Result<()> {
    if flags.is_empty() {
        anyhow::bail!("no --source flags given; nothing to scrape");
    }
    let sources = resolve_sources(&flags)?;

    info!(
        sources = sources.len(),
        interval_secs = interval.as_secs(),
        "agent starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut handles = Vec::new();
    for config in sources {
        let mut shutdown = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            info!(
                component = %config.component,
                host = %config.host,
                port = config.port,
                path = %config.path,
                "source loop starting"
            );
            // First scrape happens immediately; the interval paces the rest.
            scrape_once(&config, timeout).await;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        scrape_once(&config, timeout).await;
                    }
                    _ = shutdown.changed() => {
                        debug!(component = %config.component, "source loop shutting down");
                        break;
                    }
                }
            }
        }));
    }

    tokio::signal::ctrl_c()
        .await
        .expect("failed to install CTRL+C handler");
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }

    info!("agent stopped");
    Ok(())
}
