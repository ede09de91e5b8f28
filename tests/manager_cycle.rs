// tests/manager_cycle.rs
//
// End-to-end optimization cycles: evaluate -> discover -> add -> persist.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use newsletter_sources::discovery::curated::CuratedListFeed;
use newsletter_sources::scheduler::{spawn_evaluation_scheduler, SchedulerCfg};
use newsletter_sources::{
    collector, Candidate, DiscoveryFeed, LifecyclePolicy, PolicyConfig, SourceManager,
    SourceRegistry,
};

fn append_events(path: &Path, line: &str, times: usize) {
    use std::io::Write;
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    for _ in 0..times {
        writeln!(f, "{line}").unwrap();
    }
}

fn curated(pairs: &[(&str, &str)]) -> Vec<Box<dyn DiscoveryFeed>> {
    let entries = pairs.iter().map(|&p| Candidate::from(p)).collect();
    vec![Box::new(CuratedListFeed::new(entries))]
}

#[tokio::test]
async fn cycle_replaces_a_dud_with_a_candidate() {
    let reg = Arc::new(SourceRegistry::new());
    reg.add("keeper", "http://keeper").unwrap();
    reg.add("dud", "http://dud").unwrap();
    for _ in 0..30 {
        reg.record_event("keeper", true, true, false);
        reg.record_event("dud", false, false, false);
    }

    let mut mgr = SourceManager::in_memory(
        reg.clone(),
        LifecyclePolicy::default(),
        curated(&[("dud", "http://dud"), ("fresh", "http://fresh")]),
    );
    let out = mgr.run_cycle().await;

    assert_eq!(out.removed, vec!["dud".to_string()]);
    assert_eq!(out.added, vec!["fresh".to_string()]);
    assert_eq!(out.tracked, 2);
    assert!(reg.contains("keeper") && reg.contains("fresh"));

    let report = mgr.report();
    assert_eq!(report.total_sources, 2);
    assert_eq!(report.active_sources, 2);
    assert_eq!(report.top_performing_sources[0], "keeper");
    assert_eq!(report.sources["fresh"].total_articles, 0);
}

#[tokio::test]
async fn cycle_respects_source_cap() {
    let reg = Arc::new(SourceRegistry::new());
    reg.add("only", "http://only").unwrap();
    let mut mgr = SourceManager::in_memory(
        reg.clone(),
        LifecyclePolicy::default().with_max_sources(Some(2)),
        curated(&[("a", "http://a"), ("b", "http://b")]),
    );
    let out = mgr.run_cycle().await;
    assert_eq!(out.added, vec!["a".to_string()]);
    assert_eq!(reg.len(), 2);
}

#[tokio::test]
async fn open_seeds_then_shutdown_persists() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = PolicyConfig {
        metrics_file: dir.path().join("source_state.json"),
        ..PolicyConfig::default()
    };

    let mgr = SourceManager::open(&cfg, Vec::new()).unwrap();
    assert_eq!(mgr.registry().len(), 8);

    let events = dir.path().join("events.jsonl");
    std::fs::write(
        &events,
        "{\"source\":\"wired\",\"relevant\":true,\"clicked\":true}\n{\"source\":\"unknown\"}\n",
    )
    .unwrap();
    let stats = collector::ingest_file(&mgr.registry(), &events).unwrap();
    assert_eq!((stats.applied, stats.unknown, stats.malformed), (1, 1, 0));
    mgr.shutdown().unwrap();

    let again = SourceManager::open(&cfg, Vec::new()).unwrap();
    let wired = again.registry().get("wired").unwrap();
    assert_eq!(wired.total_articles, 1);
    assert_eq!(wired.user_clicks, 1);
}

#[tokio::test]
async fn scheduler_runs_first_cycle_immediately() {
    let reg = Arc::new(SourceRegistry::new());
    let mgr = SourceManager::in_memory(
        reg.clone(),
        LifecyclePolicy::default(),
        curated(&[("hacker_news", "https://news.ycombinator.com/rss")]),
    );
    let mgr = Arc::new(tokio::sync::Mutex::new(mgr));

    let task = spawn_evaluation_scheduler(SchedulerCfg { interval_secs: 3600 }, mgr.clone());

    let mut found = false;
    for _ in 0..50 {
        if reg.contains("hacker_news") {
            found = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    task.abort();
    assert!(found, "scheduled cycle should have added the candidate");
}

#[tokio::test]
async fn removed_source_stays_out_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = PolicyConfig {
        metrics_file: dir.path().join("source_state.json"),
        ..PolicyConfig::default()
    };
    let feed = [("wired", "https://www.wired.com/feed/rss")];

    let mut mgr = SourceManager::open(&cfg, curated(&feed)).unwrap();
    for _ in 0..30 {
        mgr.registry().record_event("wired", false, false, false);
    }
    let first = mgr.run_cycle().await;
    assert_eq!(first.removed, vec!["wired".to_string()]);
    assert!(first.added.is_empty());
    mgr.shutdown().unwrap();

    let mut mgr = SourceManager::open(&cfg, curated(&feed)).unwrap();
    assert!(mgr.policy().rejected().contains("wired"));
    assert!(!mgr.registry().contains("wired"));

    let second = mgr.run_cycle().await;
    assert!(second.added.is_empty(), "added again: {:?}", second.added);
    assert!(!mgr.registry().contains("wired"));
    assert_eq!(second.tracked, 7);
}

#[tokio::test]
async fn scheduler_drains_events_written_between_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.jsonl");
    let reg = Arc::new(SourceRegistry::new());
    reg.add("wired", "https://www.wired.com/feed/rss").unwrap();

    append_events(&events, r#"{"source":"wired","relevant":true}"#, 2);
    let mgr = SourceManager::in_memory(reg.clone(), LifecyclePolicy::default(), Vec::new())
        .with_events_file(Some(events.clone()));
    let mgr = Arc::new(tokio::sync::Mutex::new(mgr));
    let task = spawn_evaluation_scheduler(SchedulerCfg { interval_secs: 1 }, mgr.clone());

    let total = |n: u64| {
        let reg = reg.clone();
        async move {
            for _ in 0..150 {
                if reg.get("wired").map(|s| s.total_articles).unwrap_or(0) >= n {
                    return true;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            false
        }
    };

    assert!(total(2).await, "first tick should apply the pending events");
    assert!(!events.exists());

    append_events(&events, r#"{"source":"wired","clicked":true}"#, 3);
    assert!(total(5).await, "a later tick should pick up new events");
    task.abort();

    let wired = reg.get("wired").unwrap();
    assert_eq!(wired.total_articles, 5);
    assert_eq!(wired.relevant_articles, 2);
    assert_eq!(wired.user_clicks, 3);
}
