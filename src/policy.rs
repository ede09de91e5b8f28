//! # Scoring & Lifecycle Policy
//!
//! Decides which sources stay tracked. The policy never schedules itself;
//! callers trigger [`LifecyclePolicy::evaluate`] (see `scheduler`).
//!
//! - Sources with fewer than `min_sample_size` articles are exempt.
//! - Everything else below `engagement_floor` is removed and remembered as
//!   rejected, so discovery does not bring it straight back.
//! - Candidates are added in the order given, skipping tracked and rejected
//!   names, until the registry holds `max_sources`.

use metrics::counter;
use std::collections::BTreeSet;
use tracing::{info, warn};

use crate::config::PolicyConfig;
use crate::discovery::Candidate;
use crate::registry::SourceRegistry;
use crate::scoring::EngagementWeights;

#[derive(Debug, Clone)]
pub struct LifecyclePolicy {
    weights: EngagementWeights,
    min_sample_size: u64,
    engagement_floor: f64,
    /// `None` = no cap.
    max_sources: Option<usize>,
    rejected: BTreeSet<String>,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}

impl LifecyclePolicy {
    pub fn new(weights: EngagementWeights) -> Self {
        let cfg = PolicyConfig::default();
        Self {
            weights: weights.sanitized(),
            min_sample_size: cfg.min_sample_size,
            engagement_floor: cfg.engagement_floor,
            max_sources: None,
            rejected: BTreeSet::new(),
        }
    }

    pub fn from_config(cfg: &PolicyConfig) -> Self {
        Self {
            weights: cfg.weights.sanitized(),
            min_sample_size: cfg.min_sample_size,
            engagement_floor: cfg.engagement_floor,
            max_sources: cfg.max_sources_cap(),
            rejected: BTreeSet::new(),
        }
    }

    pub fn with_max_sources(mut self, max: Option<usize>) -> Self {
        self.max_sources = max;
        self
    }

    /// Start from names rejected in an earlier run.
    pub fn with_rejected<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.rejected
            .extend(names.into_iter().map(|n| n.trim().to_string()));
        self
    }

    pub fn weights(&self) -> &EngagementWeights {
        &self.weights
    }

    /// Names removed by this policy so far.
    pub fn rejected(&self) -> &BTreeSet<String> {
        &self.rejected
    }

    /// Let a previously removed name be considered by discovery again.
    pub fn forget_rejection(&mut self, name: &str) -> bool {
        self.rejected.remove(name.trim())
    }

    /// Evaluate with the configured sample size and floor.
    pub fn evaluate_configured(&mut self, registry: &SourceRegistry) -> Vec<String> {
        let (min, floor) = (self.min_sample_size, self.engagement_floor);
        self.evaluate(registry, min, floor)
    }

    /// Remove every source with `total_articles >= min_sample_size` whose
    /// engagement rate is below `engagement_floor`. Returns the removed
    /// names in registry (name) order.
    ///
    /// Holds the registry lock for the whole pass so no event lands between
    /// scoring and removal.
    pub fn evaluate(
        &mut self,
        registry: &SourceRegistry,
        min_sample_size: u64,
        engagement_floor: f64,
    ) -> Vec<String> {
        let mut entries = registry.lock();

        let doomed: Vec<(String, f64)> = entries
            .iter()
            .filter(|s| s.total_articles >= min_sample_size)
            .filter_map(|s| {
                let e = s.engagement_rate(&self.weights);
                (e < engagement_floor).then(|| (s.name.clone(), e))
            })
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for (name, engagement) in doomed {
            match entries.remove(&name) {
                Ok(_) => {
                    info!(
                        target: "policy",
                        source = %name,
                        engagement,
                        floor = engagement_floor,
                        "source below engagement floor"
                    );
                    self.rejected.insert(name.clone());
                    removed.push(name);
                }
                // Cannot happen under the held lock; keep going regardless.
                Err(e) => warn!(target: "policy", error = %e, "removal failed"),
            }
        }

        counter!("sources_evaluations_total").increment(1);
        info!(
            target: "policy",
            removed = removed.len(),
            remaining = entries.len(),
            "evaluation finished"
        );
        removed
    }

    /// Add new candidates in sequence order. Returns the names added.
    pub fn consider_candidates<I, C>(&mut self, registry: &SourceRegistry, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = C>,
        C: Into<Candidate>,
    {
        let mut entries = registry.lock();
        let mut added = Vec::new();

        for c in candidates {
            let c: Candidate = c.into();
            let name = c.name.trim();
            if self.max_sources.is_some_and(|max| entries.len() >= max) {
                info!(target: "policy", max = ?self.max_sources, "source cap reached");
                break;
            }
            if entries.contains(name) || self.rejected.contains(name) {
                continue;
            }
            match entries.add(name, c.location) {
                Ok(()) => added.push(name.to_string()),
                Err(e) => warn!(target: "policy", error = %e, "candidate skipped"),
            }
        }
        added
    }
}
