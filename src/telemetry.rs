// src/telemetry.rs
use anyhow::Context;
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::net::SocketAddr;

pub const ENV_METRICS_ADDR: &str = "SOURCES_METRICS_ADDR";

/// One-time metrics registration (so series show up in the exposition).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "sources_events_total",
            "Articles counted against tracked sources."
        );
        describe_counter!(
            "sources_events_dropped_total",
            "Events dropped because the source is not tracked."
        );
        describe_counter!(
            "sources_events_malformed_total",
            "Event lines that failed to parse."
        );
        describe_counter!("sources_added_total", "Sources added to the registry.");
        describe_counter!(
            "sources_removed_total",
            "Sources removed from the registry."
        );
        describe_counter!(
            "sources_evaluations_total",
            "Lifecycle evaluations performed."
        );
        describe_gauge!("sources_tracked", "Number of currently tracked sources.");
        describe_gauge!(
            "sources_last_cycle_ts",
            "Unix ts when the last optimization cycle ran."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder in-process. Rendering is up to the caller.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Serve the exposition on `$SOURCES_METRICS_ADDR` using the exporter's own
/// listener. Returns `Ok(false)` when the variable is unset.
/// Must be called from inside a tokio runtime.
pub fn serve_from_env() -> anyhow::Result<bool> {
    let Ok(raw) = std::env::var(ENV_METRICS_ADDR) else {
        return Ok(false);
    };
    let addr: SocketAddr = raw
        .trim()
        .parse()
        .with_context(|| format!("{ENV_METRICS_ADDR}='{raw}' is not a socket address"))?;
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("prometheus: install listener")?;
    ensure_metrics_described();
    tracing::info!(target: "telemetry", %addr, "prometheus exporter listening");
    Ok(true)
}
