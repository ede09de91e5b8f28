//! # Source
//!
//! One tracked content origin and its accumulated performance counters.
//!
//! Counters only ever grow while a source is tracked. A removed source that
//! is added again starts over from zero, history is not carried over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring::{self, EngagementWeights};

/// Where a source is fetched from.
///
/// The variant records which capability the fetcher uses; the lifecycle
/// policy treats all variants the same.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum SourceLocation {
    Rss(String),
    Page(String),
    Api(String),
}

impl SourceLocation {
    pub fn address(&self) -> &str {
        match self {
            SourceLocation::Rss(u) | SourceLocation::Page(u) | SourceLocation::Api(u) => u,
        }
    }
}

/// Bare addresses are treated as feeds, which is what discovery produces.
impl From<&str> for SourceLocation {
    fn from(url: &str) -> Self {
        SourceLocation::Rss(url.trim().to_string())
    }
}

impl From<String> for SourceLocation {
    fn from(url: String) -> Self {
        SourceLocation::from(url.as_str())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.address())
    }
}

/// Fixed-schema performance record for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub location: SourceLocation,
    #[serde(default)]
    pub total_articles: u64,
    #[serde(default)]
    pub relevant_articles: u64,
    #[serde(default)]
    pub user_clicks: u64,
    #[serde(default)]
    pub user_downloads: u64,
    pub added_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Source {
    /// Zero-initialized record.
    pub fn new(name: impl Into<String>, location: SourceLocation, now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            location,
            total_articles: 0,
            relevant_articles: 0,
            user_clicks: 0,
            user_downloads: 0,
            added_at: now,
            last_updated: now,
        }
    }

    /// Count one processed article and the user actions it received.
    pub fn record(&mut self, relevant: bool, clicked: bool, downloaded: bool, now: DateTime<Utc>) {
        self.total_articles = self.total_articles.saturating_add(1);
        if relevant {
            self.relevant_articles = self.relevant_articles.saturating_add(1);
        }
        if clicked {
            self.user_clicks = self.user_clicks.saturating_add(1);
        }
        if downloaded {
            self.user_downloads = self.user_downloads.saturating_add(1);
        }
        self.last_updated = now;
    }

    /// Count a processed batch; `relevant` is capped at `articles`.
    pub fn record_batch(&mut self, articles: u64, relevant: u64, now: DateTime<Utc>) {
        self.total_articles = self.total_articles.saturating_add(articles);
        self.relevant_articles = self
            .relevant_articles
            .saturating_add(relevant.min(articles));
        self.last_updated = now;
    }

    /// Restore `relevant_articles <= total_articles` on records that did
    /// not go through `record` (e.g. loaded from disk).
    pub(crate) fn sanitize(&mut self) {
        if self.relevant_articles > self.total_articles {
            self.relevant_articles = self.total_articles;
        }
    }

    /// relevant / total, 0 when nothing was seen yet.
    pub fn avg_relevance_score(&self) -> f64 {
        scoring::rate(self.relevant_articles, self.total_articles)
    }

    pub fn engagement_rate(&self, weights: &EngagementWeights) -> f64 {
        weights.engagement_rate(self)
    }
}
