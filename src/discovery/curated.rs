//! # Curated Discovery
//!
//! Hand-maintained lists of technology feeds.
//!
//! - [`CuratedListFeed::builtin`] proposes well-known tech and AI blogs.
//! - [`CuratedListFeed::load_from_file`] reads a JSON list of
//!   `{"name": .., "location": {"kind": "rss", "url": ..}}` entries instead.
//! - [`default_seed`] is the starting set used when no saved state exists.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use super::{Candidate, DiscoveryFeed};

const ORIGIN: &str = "curated_list";

#[derive(Debug, Clone)]
pub struct CuratedListFeed {
    entries: Vec<Candidate>,
}

impl CuratedListFeed {
    pub fn new(entries: Vec<Candidate>) -> Self {
        let entries = entries
            .into_iter()
            .map(|mut c| {
                if c.origin.is_empty() {
                    c.origin = ORIGIN.to_string();
                }
                c
            })
            .collect();
        Self { entries }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading curated list from {}", path.display()))?;
        let entries: Vec<Candidate> = serde_json::from_str(&s)
            .with_context(|| format!("parsing curated list {}", path.display()))?;
        Ok(Self::new(entries))
    }

    pub fn builtin() -> Self {
        Self::new(pairs_to_candidates(&[
            ("hacker_news", "https://news.ycombinator.com/rss"),
            ("slashdot", "https://rss.slashdot.org/Slashdot/slashdotMain"),
            ("engadget", "https://www.engadget.com/rss.xml"),
            ("gizmodo", "https://gizmodo.com/rss"),
            ("tech_radar", "https://www.techradar.com/rss"),
            ("zdnet", "https://www.zdnet.com/news/rss.xml"),
            ("cnet", "https://www.cnet.com/rss/all/"),
            ("tech_republic", "https://www.techrepublic.com/rssfeeds/articles/"),
            ("information_week", "https://www.informationweek.com/rss_simple.asp"),
            ("computer_world", "https://www.computerworld.com/index.rss"),
            ("ai_news", "https://artificialintelligence-news.com/feed/"),
            ("machine_learning_mastery", "https://machinelearningmastery.com/feed/"),
            ("deep_learning_ai", "https://www.deeplearning.ai/feed/"),
            ("google_ai_blog", "https://ai.googleblog.com/feeds/posts/default"),
            ("openai_blog", "https://openai.com/blog/rss.xml"),
            ("nvidia_ai", "https://blogs.nvidia.com/feed/"),
            ("microsoft_ai", "https://blogs.microsoft.com/ai/feed/"),
            ("aws_ai", "https://aws.amazon.com/blogs/machine-learning/feed/"),
            (
                "google_cloud_ai",
                "https://cloud.google.com/blog/products/ai-machine-learning/rss",
            ),
            ("ibm_watson", "https://www.ibm.com/blogs/watson/feed/"),
            ("stack_overflow_blog", "https://stackoverflow.blog/feed/"),
            ("github_blog", "https://github.blog/feed/"),
            ("dev_to", "https://dev.to/feed"),
            ("medium_programming", "https://medium.com/feed/tag/programming"),
            ("hashnode", "https://hashnode.com/rss"),
        ]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl DiscoveryFeed for CuratedListFeed {
    async fn candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self.entries.clone())
    }

    fn name(&self) -> &'static str {
        ORIGIN
    }
}

/// Starting set of high-quality feeds.
pub fn default_seed() -> Vec<Candidate> {
    pairs_to_candidates(&[
        ("tech_crunch", "https://techcrunch.com/feed/"),
        ("venture_beat", "https://venturebeat.com/feed/"),
        ("wired", "https://www.wired.com/feed/rss"),
        ("arstechnica", "https://feeds.arstechnica.com/arstechnica/index"),
        ("the_verge", "https://www.theverge.com/rss/index.xml"),
        ("mit_tech_review", "https://www.technologyreview.com/feed/"),
        ("ieee_spectrum", "https://spectrum.ieee.org/rss"),
        (
            "science_daily",
            "https://www.sciencedaily.com/rss/computers_math/artificial_intelligence.xml",
        ),
    ])
    .into_iter()
    .map(|mut c| {
        c.origin = "default_seed".to_string();
        c
    })
    .collect()
}

fn pairs_to_candidates(pairs: &[(&str, &str)]) -> Vec<Candidate> {
    pairs.iter().map(|&(n, u)| Candidate::from((n, u))).collect()
}
