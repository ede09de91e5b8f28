// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod collector;
pub mod config;
pub mod discovery;
pub mod error;
pub mod manager;
pub mod policy;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod scoring;
pub mod source;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::config::PolicyConfig;
pub use crate::discovery::{Candidate, DiscoveryFeed};
pub use crate::error::SourceError;
pub use crate::manager::{CycleOutcome, SourceManager};
pub use crate::policy::LifecyclePolicy;
pub use crate::registry::SourceRegistry;
pub use crate::report::{PerformanceReport, SourcePerformance};
pub use crate::scoring::EngagementWeights;
pub use crate::source::{Source, SourceLocation};
