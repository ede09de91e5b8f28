//! # Source Manager
//!
//! Owns one registry instance together with the policy and discovery feeds
//! that act on it. Created with [`SourceManager::open`], which restores saved
//! metrics and rejected names (or seeds defaults), and closed with
//! [`SourceManager::shutdown`], which persists both.

use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::PolicyConfig;
use crate::discovery::{self, curated, Candidate, DiscoveryFeed};
use crate::policy::LifecyclePolicy;
use crate::registry::SourceRegistry;
use crate::report::{self, PerformanceReport};
use crate::{collector, store};

/// What one optimization cycle changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub tracked: usize,
}

pub struct SourceManager {
    registry: Arc<SourceRegistry>,
    policy: LifecyclePolicy,
    feeds: Vec<Box<dyn DiscoveryFeed>>,
    /// `None` keeps everything in memory.
    metrics_file: Option<PathBuf>,
    /// JSON-lines event file drained at the start of every cycle.
    events_file: Option<PathBuf>,
}

impl SourceManager {
    /// Restore from `cfg.metrics_file`, seeding the default feeds on first run.
    pub fn open(cfg: &PolicyConfig, feeds: Vec<Box<dyn DiscoveryFeed>>) -> Result<Self> {
        let (registry, rejected) =
            store::open_state(&cfg.metrics_file, curated::default_seed())?;
        Ok(Self {
            registry: Arc::new(registry),
            policy: LifecyclePolicy::from_config(cfg).with_rejected(rejected),
            feeds,
            metrics_file: Some(cfg.metrics_file.clone()),
            events_file: None,
        })
    }

    /// In-memory manager around an existing registry; nothing is persisted.
    pub fn in_memory(
        registry: Arc<SourceRegistry>,
        policy: LifecyclePolicy,
        feeds: Vec<Box<dyn DiscoveryFeed>>,
    ) -> Self {
        Self {
            registry,
            policy,
            feeds,
            metrics_file: None,
            events_file: None,
        }
    }

    /// Drain `path` for engagement events before each evaluation.
    pub fn with_events_file(mut self, path: Option<PathBuf>) -> Self {
        self.events_file = path;
        self
    }

    /// Shared handle for event producers.
    pub fn registry(&self) -> Arc<SourceRegistry> {
        self.registry.clone()
    }

    pub fn policy(&self) -> &LifecyclePolicy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut LifecyclePolicy {
        &mut self.policy
    }

    /// Drain pending events, evaluate, top up from discovery, then persist.
    ///
    /// A failed drain or save is logged; the in-memory state stays
    /// authoritative and the next cycle (or shutdown) tries again.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        if let Some(path) = &self.events_file {
            if let Err(e) = collector::drain_file(&self.registry, path) {
                tracing::warn!(target: "manager", error = ?e, "draining events failed");
            }
        }

        let removed = self.policy.evaluate_configured(&self.registry);
        let candidates: Vec<Candidate> =
            discovery::gather_candidates(&self.feeds, &self.registry).await;
        let added = self.policy.consider_candidates(&self.registry, candidates);

        if let Err(e) = self.persist() {
            tracing::warn!(target: "manager", error = ?e, "saving source metrics failed");
        }

        let outcome = CycleOutcome {
            removed,
            added,
            tracked: self.registry.len(),
        };
        tracing::info!(
            target: "manager",
            removed = ?outcome.removed,
            added = ?outcome.added,
            tracked = outcome.tracked,
            "optimization cycle finished"
        );
        outcome
    }

    pub fn report(&self) -> PerformanceReport {
        report::build_report(&self.registry.snapshot(), self.policy.weights(), Utc::now())
    }

    pub fn persist(&self) -> Result<()> {
        match &self.metrics_file {
            Some(path) => {
                store::save_state(path, &self.registry.snapshot(), self.policy.rejected())
            }
            None => Ok(()),
        }
    }

    /// Persist and release the registry.
    pub fn shutdown(self) -> Result<()> {
        self.persist()?;
        tracing::info!(target: "manager", tracked = self.registry.len(), "source manager stopped");
        Ok(())
    }
}
