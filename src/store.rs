// src/store.rs
//! JSON persistence of registry state.
//!
//! ```text
//! {
//!   "sources":  { "wired": { "name": "wired", "location": {..}, "total_articles": 12, .. } },
//!   "rejected": ["quiet_blog"]
//! }
//! ```
//!
//! A bare `{ "<name>": {..} }` map (no rejected list) is still accepted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::discovery::Candidate;
use crate::registry::SourceRegistry;
use crate::source::Source;

/// Everything that must survive a restart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SavedState {
    pub sources: Vec<Source>,
    /// Names the lifecycle policy removed; discovery must not re-add them.
    pub rejected: BTreeSet<String>,
}

#[derive(Serialize)]
struct StateOut<'a> {
    sources: BTreeMap<&'a str, &'a Source>,
    rejected: &'a BTreeSet<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StateIn {
    Full {
        sources: BTreeMap<String, Source>,
        #[serde(default)]
        rejected: BTreeSet<String>,
    },
    SourcesOnly(BTreeMap<String, Source>),
}

/// Parse a state file body.
pub fn parse_state(content: &str) -> Result<SavedState> {
    let (map, rejected) = match serde_json::from_str::<StateIn>(content)? {
        StateIn::Full { sources, rejected } => (sources, rejected),
        StateIn::SourcesOnly(sources) => (sources, BTreeSet::new()),
    };
    let sources = map
        .into_iter()
        .map(|(key, mut s)| {
            // the map key is authoritative
            s.name = key;
            s
        })
        .collect();
    let rejected = rejected
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    Ok(SavedState { sources, rejected })
}

/// Load saved state. `Ok(None)` when the file does not exist yet.
pub fn load_state(path: &Path) -> Result<Option<SavedState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading source state from {}", path.display()))?;
    let state =
        parse_state(&content).with_context(|| format!("parsing source state {}", path.display()))?;
    Ok(Some(state))
}

/// Write the state next to `path` and rename it into place.
pub fn save_state(path: &Path, snapshot: &[Source], rejected: &BTreeSet<String>) -> Result<()> {
    let out = StateOut {
        sources: snapshot.iter().map(|s| (s.name.as_str(), s)).collect(),
        rejected,
    };
    let json = serde_json::to_string_pretty(&out).context("serializing source state")?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

/// Restore a registry and rejected set from `path`, or build a registry from
/// `seed` on first run.
///
/// A file that cannot be parsed (e.g. written by an older tool) is moved to
/// `<path>.bak` and the registry is reseeded. Read errors still fail.
pub fn open_state<I>(path: &Path, seed: I) -> Result<(SourceRegistry, BTreeSet<String>)>
where
    I: IntoIterator<Item = Candidate>,
{
    let loaded = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading source state from {}", path.display()))?;
        match parse_state(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                let aside = backup_path(path);
                tracing::warn!(
                    target: "store",
                    path = %path.display(),
                    moved_to = %aside.display(),
                    error = %e,
                    "unreadable source state, reseeding"
                );
                fs::rename(path, &aside)
                    .with_context(|| format!("moving {} aside", path.display()))?;
                None
            }
        }
    } else {
        None
    };

    match loaded {
        Some(state) => {
            let reg = SourceRegistry::restore(state.sources);
            tracing::info!(
                target: "store",
                path = %path.display(),
                sources = reg.len(),
                rejected = state.rejected.len(),
                "restored source state"
            );
            Ok((reg, state.rejected))
        }
        None => {
            let reg = SourceRegistry::new();
            for c in seed {
                if let Err(e) = reg.add(&c.name, c.location) {
                    tracing::warn!(target: "store", error = %e, "seed source skipped");
                }
            }
            tracing::info!(target: "store", sources = reg.len(), "seeded new registry");
            Ok((reg, BTreeSet::new()))
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::curated::default_seed;

    #[test]
    fn missing_file_seeds_registry() {
        let dir = tempfile::tempdir().unwrap();
        let (reg, rejected) = open_state(&dir.path().join("none.json"), default_seed()).unwrap();
        assert_eq!(reg.len(), 8);
        assert!(reg.contains("wired"));
        assert!(rejected.is_empty());
    }

    #[test]
    fn saved_counters_and_rejections_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let reg = SourceRegistry::new();
        reg.add("wired", "https://www.wired.com/feed/rss").unwrap();
        reg.record_event("wired", true, true, false);
        reg.record_event("wired", false, false, true);
        let rejected: BTreeSet<String> = ["quiet_blog".to_string()].into();
        save_state(&path, &reg.snapshot(), &rejected).unwrap();

        let (back, back_rejected) = open_state(&path, default_seed()).unwrap();
        assert_eq!(back.len(), 1, "seed must not be applied over saved state");
        let s = back.get("wired").unwrap();
        assert_eq!((s.total_articles, s.relevant_articles), (2, 1));
        assert_eq!((s.user_clicks, s.user_downloads), (1, 1));
        assert_eq!(back_rejected, rejected);
    }

    #[test]
    fn bare_source_map_still_loads() {
        let reg = SourceRegistry::new();
        reg.add("wired", "https://www.wired.com/feed/rss").unwrap();
        let map: BTreeMap<String, Source> = reg
            .snapshot()
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect();
        let state = parse_state(&serde_json::to_string(&map).unwrap()).unwrap();
        assert_eq!(state.sources.len(), 1);
        assert!(state.rejected.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error_for_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(load_state(&path).is_err());
    }

    #[test]
    fn legacy_file_is_moved_aside_and_registry_reseeded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source_metrics.json");
        // older layout: flat url, no location / timestamps
        let legacy = r#"{"wired": {"name": "wired", "url": "https://www.wired.com/feed/rss",
            "total_articles": 3, "relevant_articles": 1, "user_clicks": 0, "user_downloads": 0,
            "avg_relevance_score": 0.3, "last_updated": null, "is_active": true,
            "engagement_rate": 0.33}}"#;
        fs::write(&path, legacy).unwrap();

        let (reg, rejected) = open_state(&path, default_seed()).unwrap();
        assert_eq!(reg.len(), 8);
        assert_eq!(reg.get("wired").unwrap().total_articles, 0);
        assert!(rejected.is_empty());
        assert!(!path.exists());
        let aside = dir.path().join("source_metrics.json.bak");
        assert_eq!(fs::read_to_string(aside).unwrap(), legacy);
    }
}
