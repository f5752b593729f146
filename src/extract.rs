use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::types::{Endpoint, ScrapeWarning};

const ENDPOINT_PATTERN: &str = r"http://\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}:\d+";
const PAGE_COUNT_PATTERN: &str = r#"pagenavigator\("\?page=", (\d+)"#;

static ENDPOINT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ENDPOINT_PATTERN).expect("endpoint pattern is valid"));
static PAGE_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PAGE_COUNT_PATTERN).expect("page count pattern is valid"));

/// How strictly matched endpoints are checked.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Purely syntactic: `999` is accepted as an octet, any digit run as a port.
    #[default]
    Lax,
    /// Drop matches with an octet above 255 or a port outside 1..=65535.
    Strict,
}

/// Page count read from the first page, plus a warning when it had to be guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCount {
    pub pages: u64,
    pub warning: Option<ScrapeWarning>,
}

/// Read the total number of result pages from the first page's body.
///
/// Looks for the `pagenavigator("?page=", N` marker. A missing marker, a zero or an
/// unparsable number degrades to a single page with `PageCountUnknown`.
pub fn resolve_page_count(body: &str) -> PageCount {
    let parsed = PAGE_COUNT_RE
        .captures(body)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .filter(|&n| n > 0);

    match parsed {
        Some(pages) => PageCount {
            pages,
            warning: None,
        },
        None => PageCount {
            pages: 1,
            warning: Some(ScrapeWarning::PageCountUnknown),
        },
    }
}

/// All `http://a.b.c.d:port` substrings of `body`, left to right.
pub fn extract_endpoints(body: &str) -> Vec<Endpoint> {
    extract_endpoints_with(body, ExtractMode::Lax)
}

pub fn extract_endpoints_with(body: &str, mode: ExtractMode) -> Vec<Endpoint> {
    ENDPOINT_RE
        .find_iter(body)
        .map(|m| Endpoint::from_match(m.as_str()))
        .filter(|e| mode == ExtractMode::Lax || in_range(e))
        .collect()
}

fn in_range(e: &Endpoint) -> bool {
    let octets_ok = e.host().split('.').all(|o| o.parse::<u8>().is_ok());
    let port_ok = matches!(e.port(), Some(p) if p > 0);
    octets_ok && port_ok
}
