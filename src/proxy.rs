use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use anyhow::Result;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::{config::ProxyConfig, error::ProxyError};

const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_CIVIC_INTEGRITY",
];
const NO_CONTENT: &str = "(no content)";

#[derive(Clone)]
pub struct AppState {
    inner: Arc<ProxyState>,
}

struct ProxyState {
    cfg: ProxyConfig,
    client: reqwest::Client,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: Role,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_instruction: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub text: String,
}

/// Build the proxy router: `/healthz`, the allowlisted `/api/chat`, static files for the rest.
pub fn build_router(cfg: ProxyConfig) -> Result<Router> {
    let client = reqwest::Client::builder()
        .timeout(cfg.upstream_timeout)
        .build()?;
    let static_svc = ServeDir::new(&cfg.static_dir).append_index_html_on_directories(true);
    let state = AppState {
        inner: Arc::new(ProxyState { cfg, client }),
    };

    let api = Router::new()
        .route("/chat", post(chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            enforce_allowlist,
        ));

    Ok(Router::new()
        .route("/healthz", get(healthz))
        .nest("/api", api)
        .fallback_service(static_svc)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

pub async fn spawn_server(bind: &str, cfg: ProxyConfig) -> Result<()> {
    let allowed = cfg.allowed_ips.len();
    let app = build_router(cfg)?;
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, allowed_ips = allowed, "chat proxy listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}

/// Caller address: first `X-Forwarded-For` hop when present, else the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match (forwarded, peer) {
        (Some(hop), _) => hop.to_string(),
        (None, Some(ip)) => ip.to_string(),
        (None, None) => String::new(),
    }
}

async fn enforce_allowlist(State(app): State<AppState>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let ip = client_ip(req.headers(), peer);
    if !app.inner.cfg.allowed_ips.contains(&ip) {
        return ProxyError::Forbidden(ip).into_response();
    }
    next.run(req).await
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "ok": true })))
}

async fn chat(
    State(app): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ProxyError> {
    let cfg = &app.inner.cfg;
    let api_key = cfg
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or(ProxyError::MissingApiKey)?;
    let model = req
        .model
        .as_deref()
        .filter(|m| !m.is_empty())
        .unwrap_or(cfg.default_model.as_str());
    let url = format!(
        "{}/models/{}:generateContent",
        cfg.upstream_url.trim_end_matches('/'),
        model
    );

    let resp = app
        .inner
        .client
        .post(&url)
        .query(&[("key", api_key)])
        .json(&upstream_payload(&req))
        .send()
        .await
        .map_err(|e| ProxyError::Upstream(e.without_url()))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ProxyError::Upstream(e.without_url()))?;
    if status.as_u16() != 200 {
        return Err(ProxyError::UpstreamStatus {
            status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            body,
        });
    }

    let data: Value =
        serde_json::from_str(&body).map_err(|e| ProxyError::MalformedResponse(e.to_string()))?;
    let text = reply_text(&data)?;
    Ok(Json(ChatResponse { text }))
}

/// `generateContent` body for a chat request. Absent options fall back to
/// temperature 1.0 and 2048 output tokens.
pub fn upstream_payload(req: &ChatRequest) -> Value {
    let safety: Vec<Value> = SAFETY_CATEGORIES
        .iter()
        .map(|c| json!({ "category": c, "threshold": "BLOCK_MEDIUM_AND_ABOVE" }))
        .collect();
    let mut payload = json!({
        "contents": req.contents,
        "generationConfig": {
            "temperature": req.temperature.unwrap_or(1.0),
            "maxOutputTokens": req.max_output_tokens.unwrap_or(2048),
        },
        "safetySettings": safety,
    });
    if let Some(sys) = req.system_instruction.as_deref().filter(|s| !s.is_empty()) {
        payload["systemInstruction"] = json!({ "role": "system", "parts": [{ "text": sys }] });
    }
    payload
}

/// Pull the reply text out of a `generateContent` response.
pub fn reply_text(data: &Value) -> Result<String, ProxyError> {
    let cand = data
        .get("candidates")
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .filter(|c| match c {
            Value::Null => false,
            Value::Object(m) => !m.is_empty(),
            _ => true,
        })
        .ok_or(ProxyError::EmptyResponse)?;

    if cand.get("finishReason").and_then(Value::as_str) == Some("SAFETY") {
        return Err(ProxyError::SafetyBlocked);
    }

    let text: String = cand
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    Ok(if text.is_empty() {
        NO_CONTENT.to_string()
    } else {
        text
    })
}
