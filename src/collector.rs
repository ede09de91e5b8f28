// src/collector.rs
//! Intake of per-article engagement events.
//!
//! Events arrive as JSON lines, one per processed article:
//! `{"source":"wired","relevant":true,"clicked":false,"downloaded":false}`.
//! Missing flags default to `false`.

use anyhow::{Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::registry::SourceRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub source: String,
    #[serde(default)]
    pub relevant: bool,
    #[serde(default)]
    pub clicked: bool,
    #[serde(default)]
    pub downloaded: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeStats {
    pub applied: usize,
    pub unknown: usize,
    pub malformed: usize,
}

/// Parse JSON lines, skipping blanks. Returns the events and the number of
/// lines that failed to parse.
pub fn parse_event_lines(s: &str) -> (Vec<EngagementEvent>, usize) {
    let mut events = Vec::new();
    let mut malformed = 0usize;
    for (lineno, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<EngagementEvent>(line) {
            Ok(ev) => events.push(ev),
            Err(e) => {
                malformed += 1;
                tracing::warn!(target: "collector", line = lineno + 1, error = %e, "malformed event");
            }
        }
    }
    (events, malformed)
}

/// Apply events in order. Events for untracked sources are dropped.
pub fn apply_events<'a, I>(registry: &SourceRegistry, events: I) -> IntakeStats
where
    I: IntoIterator<Item = &'a EngagementEvent>,
{
    let mut stats = IntakeStats::default();
    let mut entries = registry.lock();
    for ev in events {
        if entries.record_event(&ev.source, ev.relevant, ev.clicked, ev.downloaded) {
            stats.applied += 1;
        } else {
            stats.unknown += 1;
        }
    }
    stats
}

/// Read a JSON-lines event file and apply it.
pub fn ingest_file(registry: &SourceRegistry, path: &Path) -> Result<IntakeStats> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading events from {}", path.display()))?;
    let (events, malformed) = parse_event_lines(&content);
    counter!("sources_events_malformed_total").increment(malformed as u64);

    let mut stats = apply_events(registry, &events);
    stats.malformed = malformed;
    tracing::info!(
        target: "collector",
        path = %path.display(),
        applied = stats.applied,
        unknown = stats.unknown,
        malformed = stats.malformed,
        "events ingested"
    );
    Ok(stats)
}

/// Apply and consume the event file at `path`.
///
/// The file is first renamed to `<path>.draining`, so producers appending
/// after that point start a fresh file for the next call. A `.draining`
/// file left by an interrupted run is applied first. Missing files are not
/// an error.
pub fn drain_file(registry: &SourceRegistry, path: &Path) -> Result<IntakeStats> {
    let claimed = draining_path(path);
    let mut total = IntakeStats::default();

    for fresh in [false, true] {
        if fresh {
            if !path.exists() {
                break;
            }
            fs::rename(path, &claimed)
                .with_context(|| format!("claiming events file {}", path.display()))?;
        } else if !claimed.exists() {
            continue;
        }
        let stats = ingest_file(registry, &claimed)?;
        fs::remove_file(&claimed)
            .with_context(|| format!("removing drained {}", claimed.display()))?;
        total.applied += stats.applied;
        total.unknown += stats.unknown;
        total.malformed += stats.malformed;
    }
    Ok(total)
}

fn draining_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".draining");
    PathBuf::from(name)
}
