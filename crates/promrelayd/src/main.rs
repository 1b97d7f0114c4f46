//! promrelayd — the Promrelay agent.
//!
//! Single binary that turns `--source` flags into scrape targets and
//! polls each target's exposition endpoint on a fixed interval:
//! - Source resolution (promrelay-core)
//! - Scraping + decoding (promrelay-scrape)
//! - Per-source polling loops with a shared shutdown signal
//!
//! Decoded family and sample counts are surfaced through structured
//! logs; a forwarding stage consumes the same decoded families once one
//! is wired in.
//!
//! # Usage
//!
//! ```text
//! promrelayd run \
//!     --source kube-state-metrics:http://localhost:8080/metrics?whitelisted=a,b \
//!     --source 'federation:http://prom:9090/federate?match[]={job="api"}' \
//!     --scrape-interval 60 --scrape-timeout 10
//! ```

mod agent;
mod flags;

use std::time::Duration;

use clap::{Parser, Subcommand};

use flags::SourceFlag;

#[derive(Parser)]
#[command(name = "promrelayd", about = "Promrelay metrics agent")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll every configured source on a fixed interval.
    Run {
        /// Scrape source as component:uri. Repeatable.
        #[arg(long = "source", value_name = "COMPONENT:URI")]
        sources: Vec<SourceFlag>,

        /// Seconds between scrapes of each source.
        #[arg(long, default_value = "60")]
        scrape_interval: u64,

        /// Deadline in seconds imposed on each scrape attempt.
        #[arg(long, default_value = "10")]
        scrape_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,promrelayd=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            sources,
            scrape_interval,
            scrape_timeout,
        } => {
            agent::run(
                sources,
                Duration::from_secs(scrape_interval),
                Duration::from_secs(scrape_timeout),
            )
            .await
        }
    }
}
