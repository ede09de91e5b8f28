// src/config/policy.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scoring::EngagementWeights;

pub const ENV_CONFIG_PATH: &str = "SOURCES_CONFIG_PATH";
pub const ENV_ENGAGEMENT_FLOOR: &str = "SOURCES_ENGAGEMENT_FLOOR";
pub const ENV_MIN_SAMPLE: &str = "SOURCES_MIN_SAMPLE";

pub const DEFAULT_TOML_PATH: &str = "config/sources.toml";
pub const DEFAULT_JSON_PATH: &str = "config/sources.json";

fn default_min_sample_size() -> u64 {
    20
}
fn default_engagement_floor() -> f64 {
    0.30
}
fn default_max_sources() -> usize {
    50
}
fn default_metrics_file() -> PathBuf {
    PathBuf::from("source_state.json")
}
fn default_interval_secs() -> u64 {
    24 * 3600
}

/// Tunables for the lifecycle policy and the evaluation loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub weights: EngagementWeights,
    /// Sources with fewer articles than this are never removed.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: u64,
    /// Removal threshold for the engagement rate, in [0, 1].
    #[serde(default = "default_engagement_floor")]
    pub engagement_floor: f64,
    /// 0 means unlimited.
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
    #[serde(default = "default_metrics_file")]
    pub metrics_file: PathBuf,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            weights: EngagementWeights::default(),
            min_sample_size: default_min_sample_size(),
            engagement_floor: default_engagement_floor(),
            max_sources: default_max_sources(),
            metrics_file: default_metrics_file(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl PolicyConfig {
    pub fn max_sources_cap(&self) -> Option<usize> {
        (self.max_sources > 0).then_some(self.max_sources)
    }

    /// Clamp and repair values a hand-edited file may get wrong.
    fn sanitize(mut self) -> Self {
        self.weights = self.weights.sanitized();
        if !self.engagement_floor.is_finite() {
            self.engagement_floor = default_engagement_floor();
        }
        self.engagement_floor = self.engagement_floor.clamp(0.0, 1.0);
        if self.interval_secs == 0 {
            self.interval_secs = default_interval_secs();
        }
        self
    }

    fn apply_env_overrides(mut self) -> Self {
        if let Some(floor) = parse_floor_env(std::env::var(ENV_ENGAGEMENT_FLOOR).ok()) {
            self.engagement_floor = floor;
        }
        if let Some(n) = std::env::var(ENV_MIN_SAMPLE)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.min_sample_size = n;
        }
        self
    }
}

// parse optional float env and clamp to <0.0..=1.0>
fn parse_floor_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0))
}

/// Load from an explicit path. Supports TOML or JSON, chosen by extension.
pub fn load_policy_config_from(path: &Path) -> Result<PolicyConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading policy config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg: PolicyConfig = if ext == "json" {
        serde_json::from_str(&content)
            .with_context(|| format!("parsing JSON policy config {}", path.display()))?
    } else {
        toml::from_str(&content)
            .with_context(|| format!("parsing TOML policy config {}", path.display()))?
    };
    Ok(cfg.sanitize())
}

/// Load using env var + fallbacks, then apply env overrides:
/// 1) $SOURCES_CONFIG_PATH
/// 2) config/sources.toml
/// 3) config/sources.json
/// 4) built-in defaults
pub fn load_policy_config_default() -> Result<PolicyConfig> {
    let base = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
        }
        load_policy_config_from(&pb)?
    } else if Path::new(DEFAULT_TOML_PATH).exists() {
        load_policy_config_from(Path::new(DEFAULT_TOML_PATH))?
    } else if Path::new(DEFAULT_JSON_PATH).exists() {
        load_policy_config_from(Path::new(DEFAULT_JSON_PATH))?
    } else {
        tracing::debug!(target: "config", "no policy config file, using defaults");
        PolicyConfig::default()
    };
    Ok(base.apply_env_overrides().sanitize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: PolicyConfig = toml::from_str(
            r#"
engagement_floor = 0.25

[weights]
click = 0.4
"#,
        )
        .unwrap();
        assert_eq!(cfg.engagement_floor, 0.25);
        assert_eq!(cfg.weights.click, 0.4);
        assert_eq!(cfg.weights.relevance, 0.5);
        assert_eq!(cfg.min_sample_size, 20);
        assert_eq!(cfg.max_sources, 50);
    }

    #[test]
    fn sanitize_clamps_floor() {
        let cfg = PolicyConfig {
            engagement_floor: 4.0,
            interval_secs: 0,
            ..PolicyConfig::default()
        }
        .sanitize();
        assert_eq!(cfg.engagement_floor, 1.0);
        assert_eq!(cfg.interval_secs, 86_400);
    }

    #[test]
    fn floor_env_parsing() {
        assert_eq!(parse_floor_env(Some(" 0.4 ".into())), Some(0.4));
        assert_eq!(parse_floor_env(Some("-2".into())), Some(0.0));
        assert_eq!(parse_floor_env(Some("NaN".into())), None);
        assert_eq!(parse_floor_env(Some("abc".into())), None);
        assert_eq!(parse_floor_env(None), None);
    }

    #[test]
    fn zero_max_sources_means_unlimited() {
        let cfg = PolicyConfig {
            max_sources: 0,
            ..PolicyConfig::default()
        };
        assert_eq!(cfg.max_sources_cap(), None);
        assert_eq!(PolicyConfig::default().max_sources_cap(), Some(50));
    }
}
