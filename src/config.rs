use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::extract::ExtractMode;

pub const DEFAULT_BASE_URL: &str = "http://www.insecam.org";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux i686; rv:68.0) Gecko/20100101 Firefox/68.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_UPSTREAM_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro-latest";
pub const DEFAULT_ALLOWED_IPS: &[&str] = &["127.0.0.1", "::1"];
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for one scraper instance.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Max pages fetched at once. `1` keeps the sequential behavior.
    pub concurrency: usize,
    pub extract_mode: ExtractMode,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            concurrency: 1,
            extract_mode: ExtractMode::Lax,
        }
    }
}

impl ScraperConfig {
    /// `{base}/en/bycountry/{code}`, without a trailing slash.
    pub fn collection_url(&self, code: &str) -> String {
        format!("{}/en/bycountry/{}", self.base_url.trim_end_matches('/'), code)
    }
}

/// Settings for the chat proxy service.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub api_key: Option<String>,
    pub default_model: String,
    pub allowed_ips: HashSet<String>,
    pub upstream_url: String,
    pub upstream_timeout: Duration,
    pub static_dir: PathBuf,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_model: DEFAULT_MODEL.to_string(),
            allowed_ips: default_allowlist(),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
            static_dir: PathBuf::from("."),
        }
    }
}

pub fn default_allowlist() -> HashSet<String> {
    DEFAULT_ALLOWED_IPS.iter().map(|s| s.to_string()).collect()
}

/// Parse a comma separated allowlist. Blank entries are dropped; an empty result
/// falls back to the localhost defaults.
pub fn parse_allowlist(raw: &str) -> HashSet<String> {
    let set: HashSet<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if set.is_empty() {
        default_allowlist()
    } else {
        set
    }
}
