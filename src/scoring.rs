//! # Scoring
//!
//! Engagement rate of a source: a fixed linear blend of three sub-rates,
//! each taken over `total_articles` and clamped to `[0.0, 1.0]`.
//!
//! ```text
//! engagement = w_relevance * relevant/total
//!            + w_click     * clicks/total
//!            + w_download  * downloads/total
//! ```
//!
//! The weights are configuration (see `config::PolicyConfig`), not
//! invariants. The result is clamped too, so weights that sum above 1 can
//! never produce a rate outside `[0.0, 1.0]`.

use serde::{Deserialize, Serialize};

use crate::source::Source;

pub const DEFAULT_RELEVANCE_WEIGHT: f64 = 0.5;
pub const DEFAULT_CLICK_WEIGHT: f64 = 0.3;
pub const DEFAULT_DOWNLOAD_WEIGHT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngagementWeights {
    #[serde(default = "default_relevance")]
    pub relevance: f64,
    #[serde(default = "default_click")]
    pub click: f64,
    #[serde(default = "default_download")]
    pub download: f64,
}

fn default_relevance() -> f64 {
    DEFAULT_RELEVANCE_WEIGHT
}
fn default_click() -> f64 {
    DEFAULT_CLICK_WEIGHT
}
fn default_download() -> f64 {
    DEFAULT_DOWNLOAD_WEIGHT
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            relevance: DEFAULT_RELEVANCE_WEIGHT,
            click: DEFAULT_CLICK_WEIGHT,
            download: DEFAULT_DOWNLOAD_WEIGHT,
        }
    }
}

impl EngagementWeights {
    /// Replace negative or non-finite weights with their defaults.
    pub fn sanitized(self) -> Self {
        fn fix(w: f64, fallback: f64) -> f64 {
            if w.is_finite() && w >= 0.0 {
                w
            } else {
                fallback
            }
        }
        Self {
            relevance: fix(self.relevance, DEFAULT_RELEVANCE_WEIGHT),
            click: fix(self.click, DEFAULT_CLICK_WEIGHT),
            download: fix(self.download, DEFAULT_DOWNLOAD_WEIGHT),
        }
    }

    pub fn engagement_rate(&self, s: &Source) -> f64 {
        let relevance = rate(s.relevant_articles, s.total_articles);
        let clicks = rate(s.user_clicks, s.total_articles);
        let downloads = rate(s.user_downloads, s.total_articles);
        clamp01(self.relevance * relevance + self.click * clicks + self.download * downloads)
    }
}

/// `num / den` clamped to `[0.0, 1.0]`; 0 when `den == 0`.
pub fn rate(num: u64, den: u64) -> f64 {
    if den == 0 {
        return 0.0;
    }
    clamp01(num as f64 / den as f64)
}

/// Clamp to [0.0, 1.0]. NaN maps to 0.
fn clamp01(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 {
        0.0
    } else if x > 1.0 {
        1.0
    } else {
        x
    }
}
