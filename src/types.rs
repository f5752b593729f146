use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque selector for the remote collection being paged through (a country code).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct ResourceQuery(String);

impl ResourceQuery {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One extracted camera stream address, kept as the matched `http://ip:port` string.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Endpoint(String);

impl Endpoint {
    pub(crate) fn from_match(s: &str) -> Self {
        Self(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Dotted address part, e.g. `1.2.3.4`. Octets are not range checked.
    pub fn host(&self) -> &str {
        let rest = self.0.strip_prefix("http://").unwrap_or(&self.0);
        rest.rsplit_once(':').map(|(h, _)| h).unwrap_or(rest)
    }

    /// Port digits as matched. May exceed `u16` in lax extraction.
    pub fn port_str(&self) -> &str {
        self.0.rsplit_once(':').map(|(_, p)| p).unwrap_or("")
    }

    pub fn port(&self) -> Option<u16> {
        self.port_str().parse().ok()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Orchestrator lifecycle. `Completed`, `Failed` and `Interrupted` are terminal.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ScrapeState {
    Idle,
    ResolvingPageCount,
    Paginating { page: u64 },
    Completed,
    Failed { cause: String },
    Interrupted,
}

impl ScrapeState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ScrapeState::Completed | ScrapeState::Failed { .. } | ScrapeState::Interrupted
        )
    }
}

/// Non-fatal conditions surfaced alongside a run's results.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScrapeWarning {
    /// The page count marker was missing or malformed; only one page was scanned.
    PageCountUnknown,
}

/// Totals and terminal state of one run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSummary {
    pub query: ResourceQuery,
    pub pages_total: u64,
    pub pages_scanned: u64,
    pub endpoints_found: u64,
    pub state: ScrapeState,
    pub started_at: String,
    pub finished_at: String,
}

/// Everything a run produced: summary, endpoints in discovery order, warnings.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScrapeOutcome {
    pub summary: ScrapeSummary,
    pub endpoints: Vec<Endpoint>,
    pub warnings: Vec<ScrapeWarning>,
}

impl ScrapeOutcome {
    pub fn is_completed(&self) -> bool {
        self.summary.state == ScrapeState::Completed
    }
}
