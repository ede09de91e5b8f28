//! # Source Registry
//!
//! Owns the mapping from source name to [`Source`] and is the only writer of
//! its counters. All mutations go through one `RwLock`, so concurrent
//! ingestion workers can share a registry behind an `Arc`.
//!
//! Names are trimmed before use; `" wired "` and `"wired"` are the same key.

use chrono::Utc;
use metrics::{counter, gauge};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

use crate::error::{Result, SourceError};
use crate::source::{Source, SourceLocation};
use crate::telemetry;

/// The tracked set itself. Reached through [`SourceRegistry::lock`] when a
/// caller needs several operations to run under one exclusive hold.
#[derive(Debug, Default)]
pub struct Entries {
    map: BTreeMap<String, Source>,
}

impl Entries {
    pub fn add(&mut self, name: &str, location: SourceLocation) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SourceError::InvalidName);
        }
        if self.map.contains_key(name) {
            return Err(SourceError::duplicate(name));
        }
        self.map
            .insert(name.to_string(), Source::new(name, location.clone(), Utc::now()));

        counter!("sources_added_total").increment(1);
        gauge!("sources_tracked").set(self.map.len() as f64);
        info!(target: "registry", source = name, location = %location, "source added");
        Ok(())
    }

    /// Delete a record and hand it back. Other sources are untouched.
    pub fn remove(&mut self, name: &str) -> Result<Source> {
        let name = name.trim();
        let removed = self
            .map
            .remove(name)
            .ok_or_else(|| SourceError::unknown(name))?;

        counter!("sources_removed_total").increment(1);
        gauge!("sources_tracked").set(self.map.len() as f64);
        info!(
            target: "registry",
            source = name,
            total_articles = removed.total_articles,
            "source removed"
        );
        Ok(removed)
    }

    /// Returns `false` (and changes nothing) when `name` is not tracked.
    pub fn record_event(&mut self, name: &str, relevant: bool, clicked: bool, downloaded: bool) -> bool {
        let name = name.trim();
        match self.map.get_mut(name) {
            Some(s) => {
                s.record(relevant, clicked, downloaded, Utc::now());
                counter!("sources_events_total").increment(1);
                true
            }
            None => {
                counter!("sources_events_dropped_total").increment(1);
                debug!(target: "registry", source = name, "event for untracked source dropped");
                false
            }
        }
    }

    /// Batch form of [`Entries::record_event`] for a processed fetch.
    pub fn record_batch(&mut self, name: &str, articles: u64, relevant: u64) -> bool {
        let name = name.trim();
        match self.map.get_mut(name) {
            Some(s) => {
                s.record_batch(articles, relevant, Utc::now());
                counter!("sources_events_total").increment(articles);
                true
            }
            None => {
                counter!("sources_events_dropped_total").increment(1);
                debug!(target: "registry", source = name, "batch for untracked source dropped");
                false
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<Source> {
        let name = name.trim();
        self.map
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::unknown(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name.trim())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Source> {
        self.map.values()
    }

    /// Copies of all records, ordered by name.
    pub fn snapshot(&self) -> Vec<Source> {
        self.map.values().cloned().collect()
    }
}

/// Thread-safe registry handle.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    inner: RwLock<Entries>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        telemetry::ensure_metrics_described();
        Self::default()
    }

    /// Rebuild a registry from previously saved records.
    ///
    /// Records with an empty name are skipped, later duplicates lose, and
    /// `relevant_articles` is capped at `total_articles`.
    pub fn restore<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Source>,
    {
        let mut entries = Entries::default();
        for mut s in records {
            let name = s.name.trim().to_string();
            if name.is_empty() || entries.map.contains_key(&name) {
                continue;
            }
            s.name = name.clone();
            s.sanitize();
            entries.map.insert(name, s);
        }
        gauge!("sources_tracked").set(entries.len() as f64);

        let reg = Self::new();
        *reg.write() = entries;
        reg
    }

    /// Exclusive access for multi-step updates (see `policy::LifecyclePolicy::evaluate`).
    pub fn lock(&self) -> RwLockWriteGuard<'_, Entries> {
        self.write()
    }

    pub fn add(&self, name: &str, location: impl Into<SourceLocation>) -> Result<()> {
        self.write().add(name, location.into())
    }

    pub fn remove(&self, name: &str) -> Result<Source> {
        self.write().remove(name)
    }

    /// Count one article for `name`. Events for unknown names are stale
    /// deliveries (e.g. racing a removal) and are silently dropped.
    pub fn record_event(&self, name: &str, relevant: bool, clicked: bool, downloaded: bool) {
        self.write().record_event(name, relevant, clicked, downloaded);
    }

    pub fn record_batch(&self, name: &str, articles: u64, relevant: u64) {
        self.write().record_batch(name, articles, relevant);
    }

    pub fn get(&self, name: &str) -> Result<Source> {
        self.read().get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn snapshot(&self) -> Vec<Source> {
        self.read().snapshot()
    }

    // Counter updates are single-field increments, so a panic while holding
    // the lock cannot leave a record half-written; poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
