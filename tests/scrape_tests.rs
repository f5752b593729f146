use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cam_scan_rs::config::ScraperConfig;
use cam_scan_rs::error::{NetworkErrorKind, ScrapeError};
use cam_scan_rs::fetch::PageFetcher;
use cam_scan_rs::scraper::ScrapeOrchestrator;
use cam_scan_rs::types::{ResourceQuery, ScrapeState, ScrapeWarning};
use tokio_util::sync::CancellationToken;

const BASE: &str = "http://cams.test/en/bycountry/US";

/// Fetcher serving canned bodies per URL, with optional per-URL delays.
#[derive(Default)]
struct ScriptedFetcher {
    pages: HashMap<String, Result<String, ScrapeError>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    fn first(mut self, body: &str) -> Self {
        self.pages.insert(BASE.to_string(), Ok(body.to_string()));
        self
    }

    fn page(mut self, index: u64, body: &str) -> Self {
        self.pages.insert(page_url(index), Ok(body.to_string()));
        self
    }

    fn failing(mut self, index: u64, kind: NetworkErrorKind) -> Self {
        let url = page_url(index);
        self.pages
            .insert(url.clone(), Err(ScrapeError::network(url, kind)));
        self
    }

    fn delayed(mut self, index: u64, ms: u64) -> Self {
        self.delays.insert(page_url(index), Duration::from_millis(ms));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(d) = self.delays.get(url) {
            tokio::time::sleep(*d).await;
        }
        self.pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(ScrapeError::network(url, NetworkErrorKind::Status(404))))
    }
}

fn page_url(index: u64) -> String {
    format!("{BASE}/?page={index}")
}

fn marker(n: u64) -> String {
    format!(r#"<script>pagenavigator("?page=", {n}, 0);</script>"#)
}

fn orchestrator(fetcher: Arc<ScriptedFetcher>, concurrency: usize) -> ScrapeOrchestrator {
    let cfg = ScraperConfig {
        base_url: "http://cams.test".into(),
        concurrency,
        ..ScraperConfig::default()
    };
    ScrapeOrchestrator::with_fetcher(cfg, fetcher)
}

fn endpoint_strings(outcome: &cam_scan_rs::types::ScrapeOutcome) -> Vec<String> {
    outcome
        .endpoints
        .iter()
        .map(|e| e.as_str().to_string())
        .collect()
}

#[tokio::test]
async fn sequential_run_visits_pages_in_order() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .first(&marker(4))
            .page(0, "http://10.0.0.1:80")
            .page(1, "")
            .page(2, "http://10.0.0.3:80")
            .page(3, "http://10.0.0.4:80"),
    );
    let mut orch = orchestrator(fetcher.clone(), 1);
    let outcome = orch.run(&ResourceQuery::new("US")).await;

    assert_eq!(outcome.summary.state, ScrapeState::Completed);
    assert_eq!(orch.state(), &ScrapeState::Completed);
    assert_eq!(outcome.summary.pages_total, 4);
    assert_eq!(outcome.summary.pages_scanned, 4);
    assert_eq!(
        fetcher.calls(),
        vec![BASE.to_string(), page_url(0), page_url(1), page_url(2), page_url(3)]
    );
    assert_eq!(
        endpoint_strings(&outcome),
        vec!["http://10.0.0.1:80", "http://10.0.0.3:80", "http://10.0.0.4:80"]
    );
}

#[tokio::test]
async fn timeout_on_last_page_fails_with_partial_results() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .first(&marker(3))
            .page(0, "<img src=\"http://1.2.3.4:8080/video\">")
            .page(1, "<img src=\"http://1.2.3.4:8080/video\">")
            .failing(2, NetworkErrorKind::Timeout),
    );
    let mut orch = orchestrator(fetcher.clone(), 1);
    let outcome = orch.run(&ResourceQuery::new("US")).await;

    match &outcome.summary.state {
        ScrapeState::Failed { cause } => assert!(cause.contains("timed out"), "cause: {cause}"),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(!outcome.is_completed());
    assert_eq!(
        endpoint_strings(&outcome),
        vec!["http://1.2.3.4:8080", "http://1.2.3.4:8080"]
    );
    assert_eq!(outcome.summary.pages_scanned, 2);
    assert_eq!(outcome.summary.endpoints_found, 2);
}

#[tokio::test]
async fn failure_stops_remaining_pages() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .first(&marker(5))
            .page(0, "http://1.1.1.1:80")
            .failing(1, NetworkErrorKind::Status(503))
            .page(2, "http://3.3.3.3:80")
            .page(3, "http://4.4.4.4:80")
            .page(4, "http://5.5.5.5:80"),
    );
    let mut orch = orchestrator(fetcher.clone(), 1);
    let outcome = orch.run(&ResourceQuery::new("US")).await;

    assert!(matches!(outcome.summary.state, ScrapeState::Failed { .. }));
    assert_eq!(endpoint_strings(&outcome), vec!["http://1.1.1.1:80"]);
    assert_eq!(fetcher.calls(), vec![BASE.to_string(), page_url(0), page_url(1)]);
}

#[tokio::test]
async fn single_empty_page_completes_with_nothing() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .first(&marker(1))
            .page(0, "<html>no cameras</html>"),
    );
    let mut orch = orchestrator(fetcher, 1);
    let outcome = orch.run(&ResourceQuery::new("US")).await;

    assert_eq!(outcome.summary.state, ScrapeState::Completed);
    assert!(outcome.endpoints.is_empty());
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.summary.pages_scanned, 1);
}

#[tokio::test]
async fn unknown_page_count_scans_one_page() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .first("<html>layout changed</html>")
            .page(0, "http://7.7.7.7:81")
            .page(1, "http://8.8.8.8:81"),
    );
    let mut orch = orchestrator(fetcher.clone(), 1);
    let outcome = orch.run(&ResourceQuery::new("US")).await;

    assert_eq!(outcome.summary.state, ScrapeState::Completed);
    assert_eq!(outcome.warnings, vec![ScrapeWarning::PageCountUnknown]);
    assert_eq!(outcome.summary.pages_total, 1);
    assert_eq!(endpoint_strings(&outcome), vec!["http://7.7.7.7:81"]);
    assert_eq!(fetcher.calls().len(), 2);
}

#[tokio::test]
async fn first_page_failure_reports_nothing() {
    let fetcher = Arc::new(ScriptedFetcher::default());
    let mut orch = orchestrator(fetcher, 1);
    let outcome = orch.run(&ResourceQuery::new("US")).await;

    assert!(matches!(outcome.summary.state, ScrapeState::Failed { .. }));
    assert_eq!(outcome.summary.pages_total, 0);
    assert!(outcome.endpoints.is_empty());
}

#[tokio::test(start_paused = true)]
async fn parallel_fetches_report_in_page_order() {
    // Earlier pages answer last.
    let mut f = ScriptedFetcher::default().first(&marker(5));
    for i in 0..5u64 {
        f = f
            .page(i, &format!("http://10.0.0.{}:80", i + 1))
            .delayed(i, 100 - i * 20);
    }
    let fetcher = Arc::new(f);
    let mut orch = orchestrator(fetcher, 4);
    let progress = orch.progress();
    let outcome = orch.run(&ResourceQuery::new("US")).await;

    assert_eq!(outcome.summary.state, ScrapeState::Completed);
    assert_eq!(
        endpoint_strings(&outcome),
        (1..=5).map(|i| format!("http://10.0.0.{i}:80")).collect::<Vec<_>>()
    );
    assert_eq!(progress.pages_done.load(Ordering::Relaxed), 5);
    assert_eq!(progress.endpoints_found.load(Ordering::Relaxed), 5);
}

#[tokio::test(start_paused = true)]
async fn parallel_failure_keeps_completed_prefix() {
    let fetcher = Arc::new(
        ScriptedFetcher::default()
            .first(&marker(6))
            .page(0, "http://1.0.0.1:80")
            .page(1, "http://1.0.0.2:80")
            .failing(2, NetworkErrorKind::Connect)
            .delayed(2, 30)
            .page(3, "http://1.0.0.4:80")
            .delayed(3, 500)
            .page(4, "http://1.0.0.5:80")
            .delayed(4, 500)
            .page(5, "http://1.0.0.6:80")
            .delayed(5, 500),
    );
    let mut orch = orchestrator(fetcher, 3);
    let outcome = orch.run(&ResourceQuery::new("US")).await;

    assert!(matches!(outcome.summary.state, ScrapeState::Failed { .. }));
    assert_eq!(
        endpoint_strings(&outcome),
        vec!["http://1.0.0.1:80", "http://1.0.0.2:80"]
    );
    assert_eq!(outcome.summary.pages_scanned, 2);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_and_keeps_results() {
    let mut f = ScriptedFetcher::default().first(&marker(5));
    for i in 0..5u64 {
        f = f.page(i, &format!("http://2.0.0.{}:80", i + 1)).delayed(i, 100);
    }
    let fetcher = Arc::new(f);
    let mut orch = orchestrator(fetcher, 1);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        trigger.cancel();
    });

    let outcome = orch
        .run_with_cancel(&ResourceQuery::new("US"), cancel)
        .await;

    assert_eq!(outcome.summary.state, ScrapeState::Interrupted);
    assert_eq!(
        endpoint_strings(&outcome),
        vec!["http://2.0.0.1:80", "http://2.0.0.2:80"]
    );
    assert_eq!(orch.state(), &ScrapeState::Interrupted);
}

#[tokio::test]
async fn cancelled_before_start_fetches_nothing() {
    let fetcher = Arc::new(ScriptedFetcher::default().first(&marker(2)));
    let mut orch = orchestrator(fetcher.clone(), 1);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = orch
        .run_with_cancel(&ResourceQuery::new("US"), cancel)
        .await;

    assert_eq!(outcome.summary.state, ScrapeState::Interrupted);
    assert!(fetcher.calls().is_empty());
}
