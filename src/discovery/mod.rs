// src/discovery/mod.rs
pub mod curated;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::registry::SourceRegistry;
use crate::source::SourceLocation;

/// A prospective source proposed by a discovery feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub location: SourceLocation,
    /// Which feed proposed it, e.g. "curated_list". Informational only.
    #[serde(default)]
    pub origin: String,
}

impl<N, L> From<(N, L)> for Candidate
where
    N: Into<String>,
    L: Into<SourceLocation>,
{
    fn from((name, location): (N, L)) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            origin: String::new(),
        }
    }
}

#[async_trait::async_trait]
pub trait DiscoveryFeed: Send + Sync {
    async fn candidates(&self) -> Result<Vec<Candidate>>;
    fn name(&self) -> &'static str;
}

/// Ask every feed for candidates, in feed order.
///
/// Names already tracked and repeats across feeds are dropped; the first
/// proposal of a name wins. A failing feed is logged and skipped.
pub async fn gather_candidates(
    feeds: &[Box<dyn DiscoveryFeed>],
    registry: &SourceRegistry,
) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for feed in feeds {
        match feed.candidates().await {
            Ok(list) => {
                let before = out.len();
                for c in list {
                    let key = c.name.trim().to_string();
                    if key.is_empty() || registry.contains(&key) || !seen.insert(key) {
                        continue;
                    }
                    out.push(c);
                }
                tracing::debug!(
                    target: "discovery",
                    feed = feed.name(),
                    new = out.len() - before,
                    "feed scanned"
                );
            }
            Err(e) => {
                tracing::warn!(target: "discovery", error = ?e, feed = feed.name(), "feed error");
            }
        }
    }
    out
}
