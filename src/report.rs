//! # Performance Report
//!
//! Read-only view of the registry for dashboards: per-source counters with
//! their derived rates, plus a few aggregates.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::scoring::EngagementWeights;
use crate::source::Source;

/// How long a source counts as a recent addition.
pub const RECENT_WINDOW_DAYS: i64 = 7;
pub const TOP_PERFORMERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourcePerformance {
    pub name: String,
    pub location: String,
    pub total_articles: u64,
    pub relevant_articles: u64,
    pub user_clicks: u64,
    pub user_downloads: u64,
    pub avg_relevance_score: f64,
    pub engagement_rate: f64,
}

impl SourcePerformance {
    pub fn of(s: &Source, weights: &EngagementWeights) -> Self {
        Self {
            name: s.name.clone(),
            location: s.location.address().to_string(),
            total_articles: s.total_articles,
            relevant_articles: s.relevant_articles,
            user_clicks: s.user_clicks,
            user_downloads: s.user_downloads,
            avg_relevance_score: s.avg_relevance_score(),
            engagement_rate: s.engagement_rate(weights),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub generated_at: DateTime<Utc>,
    pub total_sources: usize,
    /// Every tracked source is active; kept for dashboards that read it.
    pub active_sources: usize,
    pub total_articles_processed: u64,
    pub total_relevant_articles: u64,
    pub overall_relevance_rate: f64,
    pub top_performing_sources: Vec<String>,
    pub recent_additions: Vec<String>,
    pub sources: BTreeMap<String, SourcePerformance>,
}

/// Rank by engagement, then average relevance (both descending), then name.
pub fn top_sources(snapshot: &[Source], weights: &EngagementWeights, limit: usize) -> Vec<SourcePerformance> {
    let mut rows: Vec<SourcePerformance> = snapshot
        .iter()
        .map(|s| SourcePerformance::of(s, weights))
        .collect();
    rows.sort_by(|a, b| {
        b.engagement_rate
            .partial_cmp(&a.engagement_rate)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.avg_relevance_score
                    .partial_cmp(&a.avg_relevance_score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.name.cmp(&b.name))
    });
    rows.truncate(limit);
    rows
}

pub fn build_report(snapshot: &[Source], weights: &EngagementWeights, now: DateTime<Utc>) -> PerformanceReport {
    let total_articles: u64 = snapshot.iter().map(|s| s.total_articles).sum();
    let total_relevant: u64 = snapshot.iter().map(|s| s.relevant_articles).sum();

    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent_additions = snapshot
        .iter()
        .filter(|s| s.added_at > cutoff)
        .map(|s| s.name.clone())
        .collect();

    PerformanceReport {
        generated_at: now,
        total_sources: snapshot.len(),
        active_sources: snapshot.len(),
        total_articles_processed: total_articles,
        total_relevant_articles: total_relevant,
        overall_relevance_rate: crate::scoring::rate(total_relevant, total_articles),
        top_performing_sources: top_sources(snapshot, weights, TOP_PERFORMERS)
            .into_iter()
            .map(|p| p.name)
            .collect(),
        recent_additions,
        sources: snapshot
            .iter()
            .map(|s| (s.name.clone(), SourcePerformance::of(s, weights)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceLocation;

    fn src(name: &str, total: u64, relevant: u64, clicks: u64, added: DateTime<Utc>) -> Source {
        let mut s = Source::new(name, SourceLocation::from(format!("http://{name}")), added);
        s.total_articles = total;
        s.relevant_articles = relevant;
        s.user_clicks = clicks;
        s
    }

    #[test]
    fn ranking_uses_engagement_then_relevance_then_name() {
        let now = Utc::now();
        let snap = vec![
            src("b", 10, 5, 0, now),
            src("a", 10, 5, 0, now),
            src("c", 10, 9, 5, now),
            src("d", 0, 0, 0, now),
        ];
        let top = top_sources(&snap, &EngagementWeights::default(), 3);
        let names: Vec<_> = top.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn report_aggregates_and_recent_window() {
        let now = Utc::now();
        let snap = vec![
            src("old", 30, 15, 3, now - Duration::days(30)),
            src("new", 10, 5, 0, now - Duration::days(1)),
        ];
        let r = build_report(&snap, &EngagementWeights::default(), now);
        assert_eq!(r.total_sources, 2);
        assert_eq!(r.active_sources, 2);
        assert_eq!(r.total_articles_processed, 40);
        assert_eq!(r.total_relevant_articles, 20);
        assert!((r.overall_relevance_rate - 0.5).abs() < 1e-9);
        assert_eq!(r.recent_additions, vec!["new".to_string()]);
        assert_eq!(r.top_performing_sources[0], "old");

        let old = &r.sources["old"];
        assert!((old.avg_relevance_score - 0.5).abs() < 1e-9);
        assert!((old.engagement_rate - (0.25 + 0.03)).abs() < 1e-9);
    }

    #[test]
    fn empty_report_has_zero_rates() {
        let r = build_report(&[], &EngagementWeights::default(), Utc::now());
        assert_eq!((r.total_sources, r.active_sources), (0, 0));
        assert_eq!(r.overall_relevance_rate, 0.0);
        assert!(r.sources.is_empty());
    }
}
