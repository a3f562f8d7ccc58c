use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use once_cell::sync::Lazy;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use tower_cookies::Cookies;
use tracing::{debug, info, warn};
use url::Url;

use crate::config;
use crate::session::{self, SessionTokens};
use crate::token;

/// How many bytes of a non-JSON upstream body are echoed back in the 502
const PREVIEW_LIMIT: usize = 300;

/// Path of the backend's token refresh endpoint, relative to the base URL
const REFRESH_PATH: &str = "auth/token/refresh/";

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream returned non-JSON body ({status}): {preview}")]
    NonJson { status: StatusCode, preview: String },

    #[error("invalid upstream path: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("no refresh token in session")]
    NoRefreshToken,

    #[error("upstream rejected the refresh ({status})")]
    Rejected { status: StatusCode, body: Value },

    #[error("refresh response was missing a usable access token")]
    Malformed,

    #[error("invalid refresh path: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("refresh request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// Whether a call participates in session handling.
///
/// `Session` evaluates the access token before sending, attaches the
/// bearer, and performs the single refresh-and-retry on 401. `None` opts
/// out entirely: no bearer, no refresh, no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Session,
    None,
}

/// An upstream request held in reshapable form so the 401 path can retry
/// it verbatim with a new bearer.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ProxyRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// Status and JSON body of an upstream response, forwarded as-is.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        // bodiless statuses must stay bodiless
        if matches!(
            self.status,
            StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
        ) {
            return self.status.into_response();
        }
        (self.status, Json(self.body)).into_response()
    }
}

/// HTTP client for the external Notice Board backend. Built once at
/// startup; every outbound call carries the configured bounded timeout.
pub struct UpstreamClient {
    http: reqwest::Client,
    base: Url,
}

impl UpstreamClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // the base must end in a slash for relative joins to nest under it
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base = Url::parse(&normalized)
            .unwrap_or_else(|e| panic!("invalid upstream base url {}: {}", normalized, e));

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| panic!("failed to build upstream HTTP client: {}", e));

        Self { http, base }
    }

    fn from_config() -> Self {
        let cfg = config::config();
        Self::new(
            &cfg.upstream.base_url,
            Duration::from_secs(cfg.upstream.timeout_secs),
        )
    }

    /// Cheap reachability probe for the health endpoint.
    pub async fn reachable(&self) -> bool {
        self.http.head(self.base.clone()).send().await.is_ok()
    }

    /// Perform an upstream request, transparently keeping the access token
    /// fresh when `auth` is `Session`:
    ///
    /// 1. a stale or unknown access token is refreshed before the request
    ///    is sent;
    /// 2. a 401 response triggers exactly one refresh and one retry;
    /// 3. when refresh fails the original response is returned unchanged.
    pub async fn send(
        &self,
        request: ProxyRequest,
        cookies: &Cookies,
        auth: AuthMode,
    ) -> Result<UpstreamResponse, UpstreamError> {
        if auth == AuthMode::None {
            let response = self.execute(&request, None).await?;
            return Self::read_json(response).await;
        }

        let mut tokens = SessionTokens::from_jar(cookies);

        let leeway = config::config().session.refresh_leeway_secs;
        let wants_refresh = match tokens.access() {
            Some(access) => token::needs_refresh(access, token::epoch_now(), leeway),
            // no access token at all counts as unknown; refresh_session
            // no-ops without a refresh token
            None => true,
        };
        if wants_refresh {
            match self.refresh_session(cookies).await {
                Ok(access) => tokens.replace_access(access),
                Err(RefreshError::NoRefreshToken) => {}
                Err(err) => warn!("token refresh before request failed: {}", err),
            }
        }

        let response = self.execute(&request, tokens.bearer()).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            match self.refresh_session(cookies).await {
                Ok(access) => {
                    tokens.replace_access(access);
                    debug!("retrying {} {} after refresh", request.method, request.path);
                    let retried = self.execute(&request, tokens.bearer()).await?;
                    return Self::read_json(retried).await;
                }
                Err(RefreshError::NoRefreshToken) => {}
                Err(err) => warn!("token refresh after 401 failed: {}", err),
            }
        }

        Self::read_json(response).await
    }

    /// Exchange the refresh token for a new access token and persist the
    /// result into the cookie jar.
    ///
    /// A missing refresh token fails immediately, with no network call.
    /// Concurrent callers may each trigger their own backend refresh; the
    /// exchange is idempotent upstream, so duplicates are waste, not harm.
    pub async fn refresh_session(&self, cookies: &Cookies) -> Result<String, RefreshError> {
        let tokens = SessionTokens::from_jar(cookies);
        let refresh = tokens.refresh().ok_or(RefreshError::NoRefreshToken)?;

        let url = self.base.join(REFRESH_PATH)?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "refresh": refresh }))
            .send()
            .await?;

        let status = response.status();
        let body = match Self::read_json(response).await {
            Ok(parsed) => parsed.body,
            Err(UpstreamError::NonJson { preview, .. }) => Value::String(preview),
            Err(UpstreamError::Network(e)) => return Err(RefreshError::Network(e)),
            Err(UpstreamError::InvalidUrl(e)) => return Err(RefreshError::InvalidUrl(e)),
        };

        if !status.is_success() {
            warn!("upstream rejected token refresh: {}", status);
            return Err(RefreshError::Rejected { status, body });
        }

        let access = body
            .get("access")
            .or_else(|| body.get("access_token"))
            .and_then(Value::as_str)
            .ok_or(RefreshError::Malformed)?;

        session::store_access_token(cookies, access);
        if let Some(new_refresh) = body
            .get("refresh")
            .or_else(|| body.get("refresh_token"))
            .and_then(Value::as_str)
        {
            session::store_refresh_token(cookies, new_refresh);
        }

        info!("access token refreshed");
        Ok(access.to_string())
    }

    async fn execute(
        &self,
        request: &ProxyRequest,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, UpstreamError> {
        let url = self.base.join(&request.path)?;
        let mut builder = self.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(bearer) = bearer {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", bearer));
        }
        Ok(builder.send().await?)
    }

    /// Reshape an upstream response: JSON bodies are forwarded with their
    /// status intact, empty bodies become null, anything else is a
    /// non-JSON failure carrying a truncated preview.
    async fn read_json(response: reqwest::Response) -> Result<UpstreamResponse, UpstreamError> {
        let status = response.status();
        let text = response.text().await?;

        if text.trim().is_empty() {
            return Ok(UpstreamResponse {
                status,
                body: Value::Null,
            });
        }

        match serde_json::from_str(&text) {
            Ok(body) => Ok(UpstreamResponse { status, body }),
            Err(_) => Err(UpstreamError::NonJson {
                status,
                preview: truncate_preview(&text),
            }),
        }
    }
}

fn truncate_preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= PREVIEW_LIMIT {
        return trimmed.to_string();
    }
    let mut end = PREVIEW_LIMIT;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &trimmed[..end])
}

// Global singleton client - initialized on first use
pub static UPSTREAM: Lazy<UpstreamClient> = Lazy::new(UpstreamClient::from_config);

pub fn upstream() -> &'static UpstreamClient {
    &UPSTREAM
}
