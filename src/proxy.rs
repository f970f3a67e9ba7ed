//! HTTP relay that lets browser code read the CMS without cross-origin
//! restrictions.
//!
//! Unlike [`crate::gateway::Gateway`] the relay never substitutes content:
//! upstream failures reach the caller with their status and raw text.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, RawQuery, Request, State};
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::{FetchError, PathError};
use crate::source::RestSource;
use crate::types::ErrorBody;

pub const PATH_RELAY_ROUTE: &str = "/api/wp/{*path}";
pub const URL_RELAY_ROUTE: &str = "/api/proxy";

/// Failures the relay reports to its caller.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("URL parameter is required")]
    MissingUrl,

    #[error("invalid URL parameter: {0}")]
    InvalidUrl(String),

    #[error("invalid relay path: {0}")]
    InvalidPath(String),

    /// Upstream answered with a non-2xx status; relayed as-is.
    #[error("upstream responded with status {status}")]
    Upstream { status: u16, body: String },

    /// Upstream unreachable, timed out or returned something that is not JSON.
    #[error("relay failed: {0}")]
    Local(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingUrl | Self::InvalidUrl(_) | Self::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::Local(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for RelayError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Status { status, body } => Self::Upstream { status, body },
            FetchError::Path(e) => e.into(),
            other => Self::Local(other.to_string()),
        }
    }
}

impl From<PathError> for RelayError {
    fn from(e: PathError) -> Self {
        match e {
            PathError::DotSegment(_) => Self::InvalidPath(e.to_string()),
            // a bad base URL is our misconfiguration, not the caller's
            PathError::Base(_) => Self::Local(e.to_string()),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::MissingUrl => ErrorBody::new("URL parameter is required"),
            Self::InvalidUrl(details) => ErrorBody::with_details("Invalid URL parameter", details),
            Self::InvalidPath(details) => ErrorBody::with_details("Invalid path", details),
            Self::Upstream { body, .. } => ErrorBody::with_details("Upstream request failed", body),
            Self::Local(details) => ErrorBody::with_details("Failed to fetch data", details),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Clone)]
pub struct RelayState {
    source: Arc<RestSource>,
    timeout: Option<Duration>,
}

impl RelayState {
    pub fn new(source: RestSource, timeout: Option<Duration>) -> Self {
        Self { source: Arc::new(source), timeout }
    }

    pub fn from_config(cfg: &GatewayConfig) -> Result<Self> {
        Ok(Self::new(RestSource::from_config(cfg)?, cfg.relay_timeout()))
    }

    async fn relay(&self, url: &str) -> Result<Response, RelayError> {
        let fetch = self.source.fetch(url);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .unwrap_or(Err(FetchError::Timeout(limit))),
            None => fetch.await,
        };
        match result {
            Ok(resp) => {
                let status = StatusCode::from_u16(resp.status).unwrap_or(StatusCode::OK);
                Ok((status, Json(resp.body)).into_response())
            }
            Err(e @ FetchError::Status { .. }) => {
                warn!(%url, error = %e, "upstream rejected relayed request");
                Err(e.into())
            }
            Err(e) => {
                error!(%url, error = %e, "relay request failed");
                Err(e.into())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProxyParams {
    url: Option<String>,
}

async fn relay_path(
    State(state): State<RelayState>,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Response, RelayError> {
    let url = state.source.url_for(&path, query.as_deref())?;
    state.relay(url.as_str()).await
}

async fn relay_url(
    State(state): State<RelayState>,
    params: Result<Query<ProxyParams>, QueryRejection>,
) -> Result<Response, RelayError> {
    let Query(params) = params.map_err(|e| RelayError::InvalidUrl(e.body_text()))?;
    let target = params
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or(RelayError::MissingUrl)?;
    let parsed = Url::parse(target.trim()).map_err(|e| RelayError::InvalidUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RelayError::InvalidUrl(format!("unsupported scheme `{}`", parsed.scheme())));
    }
    state.relay(parsed.as_str()).await
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found")))
}

async fn apply_cors(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST, OPTIONS"));
    headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("Content-Type"));
    response
}

async fn request_tracing(request: Request, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!(
        "http.request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request completed"
        )
    });
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub fn router(state: RelayState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route(PATH_RELAY_ROUTE, get(relay_path).options(preflight))
        .route(URL_RELAY_ROUTE, get(relay_url).options(preflight))
        .fallback(not_found)
        .layer(middleware::map_response(apply_cors))
        .layer(middleware::from_fn(request_tracing))
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn serve(listener: TcpListener, state: RelayState) -> Result<()> {
    serve_with_shutdown(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
    })
    .await
}

pub async fn serve_with_shutdown<F>(listener: TcpListener, state: RelayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("reading listener address")?;
    info!(%addr, base_url = state.source.base_url(), "proxy relay listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("proxy relay server error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_status_codes() {
        assert_eq!(RelayError::MissingUrl.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::InvalidUrl("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(RelayError::InvalidPath("..".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            RelayError::Upstream { status: 404, body: String::new() }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            RelayError::Upstream { status: 503, body: String::new() }.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(RelayError::Local("dns".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn fetch_errors_map_to_relay_errors() {
        let upstream: RelayError = FetchError::Status { status: 401, body: "denied".into() }.into();
        assert!(matches!(upstream, RelayError::Upstream { status: 401, ref body } if body == "denied"));

        let dots: RelayError = FetchError::Path(PathError::DotSegment("../x".into())).into();
        assert!(matches!(dots, RelayError::InvalidPath(_)));

        let base: RelayError = PathError::Base("mailto:x".into()).into();
        assert!(matches!(base, RelayError::Local(_)));

        let local: RelayError = FetchError::Timeout(Duration::from_secs(1)).into();
        assert!(matches!(local, RelayError::Local(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn cors_headers_are_added_to_any_response() {
        let resp = apply_cors(RelayError::MissingUrl.into_response()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
    }
}
