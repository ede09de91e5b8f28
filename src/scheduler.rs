// src/scheduler.rs
use metrics::gauge;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::manager::SourceManager;

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval_secs: u64,
}

/// Spawn a task that runs an optimization cycle every `interval_secs`.
/// The first cycle runs immediately.
pub fn spawn_evaluation_scheduler(
    cfg: SchedulerCfg,
    manager: Arc<Mutex<SourceManager>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs.max(1)));
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now().timestamp().max(0) as u64;

            let outcome = manager.lock().await.run_cycle().await;

            gauge!("sources_last_cycle_ts").set(now as f64);
            tracing::info!(
                target: "scheduler",
                removed = outcome.removed.len(),
                added = outcome.added.len(),
                tracked = outcome.tracked,
                "scheduled cycle"
            );
        }
    })
}
