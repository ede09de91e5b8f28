//! Source manager — binary entrypoint.
//!
//! Loads the policy config, restores (or seeds) the registry and then runs
//! optimization cycles on an interval until Ctrl-C. Each cycle first drains
//! `$SOURCES_EVENTS_PATH` for new engagement events. `SOURCES_RUN_ONCE=1`
//! runs a single cycle, prints the performance report as JSON and exits.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use newsletter_sources::config::load_policy_config_default;
use newsletter_sources::discovery::{curated::CuratedListFeed, DiscoveryFeed};
use newsletter_sources::scheduler::{spawn_evaluation_scheduler, SchedulerCfg};
use newsletter_sources::{telemetry, SourceManager};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const ENV_EVENTS_PATH: &str = "SOURCES_EVENTS_PATH";
const ENV_CURATED_PATH: &str = "SOURCES_CURATED_PATH";
const ENV_RUN_ONCE: &str = "SOURCES_RUN_ONCE";
const ENV_LOG_JSON: &str = "SOURCES_LOG_JSON";

fn env_flag(name: &str) -> bool {
    std::env::var(name).ok().is_some_and(|v| v == "1")
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("newsletter_sources=info,warn"));

    if env_flag(ENV_LOG_JSON) {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

fn discovery_feeds() -> anyhow::Result<Vec<Box<dyn DiscoveryFeed>>> {
    let curated = match std::env::var(ENV_CURATED_PATH) {
        Ok(p) => CuratedListFeed::load_from_file(PathBuf::from(p))?,
        Err(_) => CuratedListFeed::builtin(),
    };
    let feeds: Vec<Box<dyn DiscoveryFeed>> = vec![Box::new(curated)];
    Ok(feeds)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    if !telemetry::serve_from_env()? {
        telemetry::ensure_metrics_described();
    }

    let cfg = load_policy_config_default().context("loading policy config")?;
    tracing::info!(
        target: "main",
        floor = cfg.engagement_floor,
        min_sample = cfg.min_sample_size,
        max_sources = cfg.max_sources,
        metrics_file = %cfg.metrics_file.display(),
        "policy config loaded"
    );

    let events_file = std::env::var(ENV_EVENTS_PATH).ok().map(PathBuf::from);
    let mut manager = SourceManager::open(&cfg, discovery_feeds()?)?.with_events_file(events_file);

    if env_flag(ENV_RUN_ONCE) {
        manager.run_cycle().await;
        let report = serde_json::to_string_pretty(&manager.report())?;
        println!("{report}");
        return manager.shutdown();
    }

    let manager = Arc::new(tokio::sync::Mutex::new(manager));
    let task = spawn_evaluation_scheduler(
        SchedulerCfg {
            interval_secs: cfg.interval_secs,
        },
        manager.clone(),
    );

    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    task.abort();
    // The aborted task may still be dropping; wait so the manager is ours again.
    let _ = task.await;

    let manager = Arc::try_unwrap(manager)
        .map_err(|_| anyhow::anyhow!("source manager still shared at shutdown"))?
        .into_inner();
    manager.shutdown()
}
