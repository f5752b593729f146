use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::extract::{extract_endpoints_with, resolve_page_count};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::paginator::Paginator;
use crate::types::{
    Endpoint, ResourceQuery, ScrapeOutcome, ScrapeState, ScrapeSummary, ScrapeWarning,
};
use ::time::{format_description::well_known, OffsetDateTime};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MAX_CONCURRENCY: usize = 64;

/// Live counters for a run, readable from other tasks while it is in progress.
#[derive(Clone, Debug)]
pub struct SharedProgress {
    pub pages_total: Arc<AtomicU64>,
    pub pages_done: Arc<AtomicU64>,
    pub endpoints_found: Arc<AtomicU64>,
}

impl SharedProgress {
    pub fn new() -> Self {
        Self {
            pages_total: Arc::new(AtomicU64::new(0)),
            pages_done: Arc::new(AtomicU64::new(0)),
            endpoints_found: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for SharedProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// What a run has gathered so far. Whatever is in here is reported on every exit path.
#[derive(Default)]
struct Accumulated {
    pages_total: u64,
    pages_scanned: u64,
    endpoints: Vec<Endpoint>,
    warnings: Vec<ScrapeWarning>,
}

/// Drives one scrape: resolve the page count, walk the pages, collect endpoints.
///
/// - `concurrency == 1` fetches pages one at a time in index order.
/// - Higher values fetch through a `Semaphore`-bounded `JoinSet`; results are buffered
///   and committed in page-index order.
/// - The first failed fetch aborts every pending and in-flight page.
/// - Cancelling the token ends the run as `Interrupted`, keeping committed pages.
pub struct ScrapeOrchestrator {
    cfg: ScraperConfig,
    fetcher: Arc<dyn PageFetcher>,
    state: ScrapeState,
    progress: SharedProgress,
}

impl ScrapeOrchestrator {
    /// Orchestrator backed by a real HTTP client built from `cfg`.
    pub fn new(cfg: ScraperConfig) -> Result<Self, ScrapeError> {
        let fetcher = HttpFetcher::new(&cfg)?;
        Ok(Self::with_fetcher(cfg, Arc::new(fetcher)))
    }

    pub fn with_fetcher(cfg: ScraperConfig, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            cfg,
            fetcher,
            state: ScrapeState::Idle,
            progress: SharedProgress::new(),
        }
    }

    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn state(&self) -> &ScrapeState {
        &self.state
    }

    pub fn progress(&self) -> SharedProgress {
        self.progress.clone()
    }

    pub async fn run(&mut self, query: &ResourceQuery) -> ScrapeOutcome {
        self.run_with_cancel(query, CancellationToken::new()).await
    }

    /// Variant that stops early when `cancel` fires.
    pub async fn run_with_cancel(
        &mut self,
        query: &ResourceQuery,
        cancel: CancellationToken,
    ) -> ScrapeOutcome {
        let started_at = now_rfc3339();
        let mut acc = Accumulated::default();
        let base = self.cfg.collection_url(query.as_str());

        self.transition(ScrapeState::ResolvingPageCount);
        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return self.finish(query, started_at, acc, ScrapeState::Interrupted);
            }
            res = self.fetcher.fetch(&base) => res,
        };
        let body = match first {
            Ok(body) => body,
            Err(e) => {
                warn!(query = %query, "could not load first page: {e}");
                let cause = e.to_string();
                return self.finish(query, started_at, acc, ScrapeState::Failed { cause });
            }
        };

        let count = resolve_page_count(&body);
        drop(body);
        if let Some(w) = count.warning {
            warn!(query = %query, "could not determine the number of pages, checking the first page only");
            acc.warnings.push(w);
        }
        info!(query = %query, pages = count.pages, "found {} pages of cameras", count.pages);
        acc.pages_total = count.pages;
        self.progress.pages_total.store(count.pages, Ordering::Relaxed);

        let end = self
            .paginate(Paginator::new(base, count.pages), &cancel, &mut acc)
            .await;
        self.finish(query, started_at, acc, end)
    }

    async fn paginate(
        &mut self,
        pages: Paginator,
        cancel: &CancellationToken,
        acc: &mut Accumulated,
    ) -> ScrapeState {
        let total = pages.page_count();
        let mut requests = pages.peekable();
        // Child token: a failed page stops the run without touching the caller's token.
        let stop = cancel.child_token();
        let sem = Arc::new(Semaphore::new(self.cfg.concurrency.clamp(1, MAX_CONCURRENCY)));
        let mut set: JoinSet<(u64, Result<Vec<Endpoint>, ScrapeError>)> = JoinSet::new();
        let mut buffered: BTreeMap<u64, Vec<Endpoint>> = BTreeMap::new();
        let mut failure: Option<(u64, String)> = None;
        let mut stopped = false;

        self.transition(ScrapeState::Paginating { page: 0 });

        loop {
            let more = !stopped && requests.peek().is_some();
            if set.is_empty() && !more {
                break;
            }

            tokio::select! {
                biased;
                _ = stop.cancelled(), if !stopped => {
                    stopped = true;
                    set.abort_all();
                }
                Some(joined) = set.join_next(), if !set.is_empty() => match joined {
                    Ok((index, Ok(found))) => {
                        self.progress.pages_done.fetch_add(1, Ordering::Relaxed);
                        buffered.insert(index, found);
                        self.commit_ready(&mut buffered, total, acc);
                    }
                    Ok((index, Err(e))) => {
                        warn!(page = index + 1, "page fetch failed, aborting remaining pages: {e}");
                        if failure.as_ref().map_or(true, |(i, _)| index < *i) {
                            failure = Some((index, e.to_string()));
                        }
                        stop.cancel();
                    }
                    Err(e) if e.is_panic() => {
                        failure.get_or_insert((acc.pages_scanned, "page task panicked".to_string()));
                        stop.cancel();
                    }
                    Err(_) => {}
                },
                permit = sem.clone().acquire_owned(), if more => {
                    let (Ok(permit), Some(req)) = (permit, requests.next()) else {
                        break;
                    };
                    info!("scanning page {}/{}", req.index + 1, total);
                    let fetcher = Arc::clone(&self.fetcher);
                    let mode = self.cfg.extract_mode;
                    let stop = stop.clone();
                    set.spawn(async move {
                        let res = fetcher
                            .fetch(&req.url)
                            .await
                            .map(|body| extract_endpoints_with(&body, mode));
                        if res.is_err() {
                            // Cancel before the permit is released so no further page starts.
                            stop.cancel();
                        }
                        drop(permit);
                        (req.index, res)
                    });
                }
                else => break,
            }
        }

        if let Some((index, cause)) = failure {
            debug!(failed_page = index, committed = acc.pages_scanned, "pagination aborted");
            ScrapeState::Failed { cause }
        } else if acc.pages_scanned < total {
            ScrapeState::Interrupted
        } else {
            ScrapeState::Completed
        }
    }

    /// Move every buffered page that is next in index order into the result.
    fn commit_ready(
        &mut self,
        buffered: &mut BTreeMap<u64, Vec<Endpoint>>,
        total: u64,
        acc: &mut Accumulated,
    ) {
        while let Some(found) = buffered.remove(&acc.pages_scanned) {
            let page = acc.pages_scanned;
            if found.is_empty() {
                info!("no endpoints found on page {}/{}", page + 1, total);
            }
            for e in &found {
                debug!(page = page + 1, "found: {e}");
            }
            self.progress
                .endpoints_found
                .fetch_add(found.len() as u64, Ordering::Relaxed);
            acc.endpoints.extend(found);
            acc.pages_scanned += 1;
            if acc.pages_scanned < total {
                self.transition(ScrapeState::Paginating {
                    page: acc.pages_scanned,
                });
            }
        }
    }

    fn finish(
        &mut self,
        query: &ResourceQuery,
        started_at: String,
        acc: Accumulated,
        end: ScrapeState,
    ) -> ScrapeOutcome {
        self.transition(end.clone());
        let summary = ScrapeSummary {
            query: query.clone(),
            pages_total: acc.pages_total,
            pages_scanned: acc.pages_scanned,
            endpoints_found: acc.endpoints.len() as u64,
            state: end,
            started_at,
            finished_at: now_rfc3339(),
        };
        info!(
            query = %query,
            pages = summary.pages_scanned,
            endpoints = summary.endpoints_found,
            state = ?summary.state,
            "scrape finished"
        );
        ScrapeOutcome {
            summary,
            endpoints: acc.endpoints,
            warnings: acc.warnings,
        }
    }

    fn transition(&mut self, next: ScrapeState) {
        debug!(from = ?self.state, to = ?next, "scrape state");
        self.state = next;
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}
