//! Error types for the scraper and the chat proxy.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// What went wrong on the wire for a single page fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Connect,
    Timeout,
    Status(u16),
    Other(String),
}

impl std::fmt::Display for NetworkErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkErrorKind::Connect => write!(f, "connection failed"),
            NetworkErrorKind::Timeout => write!(f, "request timed out"),
            NetworkErrorKind::Status(code) => write!(f, "HTTP status {code}"),
            NetworkErrorKind::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Errors raised while scraping the directory. All of them abort the current run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScrapeError {
    #[error("network error fetching {url}: {kind}")]
    Network { url: String, kind: NetworkErrorKind },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl ScrapeError {
    pub fn network(url: impl Into<String>, kind: NetworkErrorKind) -> Self {
        ScrapeError::Network {
            url: url.into(),
            kind,
        }
    }

    /// Classify a reqwest failure for `url`.
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            NetworkErrorKind::Connect
        } else if let Some(status) = err.status() {
            NetworkErrorKind::Status(status.as_u16())
        } else {
            NetworkErrorKind::Other(err.to_string())
        };
        ScrapeError::network(url, kind)
    }
}

/// Errors returned to chat proxy clients. Rendered as `{"detail": ...}`.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("IP not allowed: {0}")]
    Forbidden(String),

    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("blocked by model safety filters")]
    SafetyBlocked,

    #[error("empty response from model")]
    EmptyResponse,

    #[error("malformed response from model: {0}")]
    MalformedResponse(String),

    #[error("network error talking to upstream: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("{body}")]
    UpstreamStatus { status: StatusCode, body: String },
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Forbidden(_) => StatusCode::FORBIDDEN,
            ProxyError::MissingApiKey => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::SafetyBlocked => StatusCode::BAD_REQUEST,
            ProxyError::EmptyResponse
            | ProxyError::MalformedResponse(_)
            | ProxyError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamStatus { status, .. } => *status,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, "chat request failed: {}", self);
        } else {
            tracing::warn!(%status, "chat request rejected: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_message_names_url_and_kind() {
        let e = ScrapeError::network("http://x/?page=2", NetworkErrorKind::Timeout);
        assert_eq!(e.to_string(), "network error fetching http://x/?page=2: request timed out");
    }

    #[test]
    fn proxy_errors_map_to_statuses() {
        assert_eq!(ProxyError::SafetyBlocked.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::EmptyResponse.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ProxyError::MissingApiKey.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::Forbidden("10.0.0.1".into()).status(),
            StatusCode::FORBIDDEN
        );
    }
}
