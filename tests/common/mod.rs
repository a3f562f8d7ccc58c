// not every test binary uses every helper
#![allow(dead_code)]

use std::collections::HashMap;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use reqwest::header::SET_COOKIE;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const STUB_SECRET: &[u8] = b"stub-backend-secret";

static STACK: OnceLock<TestStack> = OnceLock::new();

/// The gateway under test plus the stub backend it proxies to.
pub struct TestStack {
    pub base_url: String,
    pub stub: Arc<StubState>,
    #[allow(dead_code)]
    child: Child,
}

/// Per-identity call counters so concurrent tests never share state.
#[derive(Debug, Default, Clone)]
pub struct IdentityCounts {
    pub refreshes: u64,
    pub registrations: u64,
    pub bookmarks: u64,
    pub applications: u64,
    pub news: u64,
    pub gen: u64,
}

#[derive(Default)]
pub struct StubState {
    identities: Mutex<HashMap<String, IdentityCounts>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StubClaims {
    exp: i64,
    email: String,
    #[serde(default)]
    gen: u64,
    token_type: String,
}

pub fn epoch_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_secs() as i64
}

impl StubState {
    pub fn counts(&self, email: &str) -> IdentityCounts {
        self.identities
            .lock()
            .expect("stub state lock")
            .entry(email.to_string())
            .or_default()
            .clone()
    }

    fn with_identity<R>(&self, email: &str, f: impl FnOnce(&mut IdentityCounts) -> R) -> R {
        let mut identities = self.identities.lock().expect("stub state lock");
        f(identities.entry(email.to_string()).or_default())
    }

    /// Invalidate all previously minted access tokens for this identity;
    /// the next refresh issues a token the backend accepts again.
    pub fn revoke_access(&self, email: &str) {
        self.with_identity(email, |id| id.gen += 1);
    }

    pub fn mint_access(&self, email: &str, exp: i64) -> String {
        let gen = self.counts(email).gen;
        mint(&StubClaims {
            exp,
            email: email.to_string(),
            gen,
            token_type: "access".to_string(),
        })
    }

    pub fn mint_refresh(&self, email: &str) -> String {
        mint(&StubClaims {
            exp: epoch_now() + 86_400,
            email: email.to_string(),
            gen: 0,
            token_type: "refresh".to_string(),
        })
    }

    /// A fresh access/refresh pair, as login would issue.
    pub fn issue(&self, email: &str) -> (String, String) {
        (
            self.mint_access(email, epoch_now() + 3_600),
            self.mint_refresh(email),
        )
    }
}

fn mint(claims: &StubClaims) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(STUB_SECRET),
    )
    .expect("failed to mint stub token")
}

fn verify(token: &str) -> Option<StubClaims> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    decode::<StubClaims>(token, &DecodingKey::from_secret(STUB_SECRET), &validation)
        .ok()
        .map(|data| data.claims)
}

fn bearer_claims(headers: &HeaderMap) -> Option<StubClaims> {
    let value = headers.get("authorization")?.to_str().ok()?;
    verify(value.strip_prefix("Bearer ")?)
}

// ---- stub backend routes ------------------------------------------------

async fn stub_root() -> StatusCode {
    StatusCode::OK
}

async fn stub_login(
    State(state): State<Arc<StubState>>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let email = payload["email"].as_str().unwrap_or_default().to_string();
    let password = payload["password"].as_str().unwrap_or_default();

    if email.is_empty() || password != "correct-horse" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": "Unable to log in with provided credentials." })),
        );
    }

    let (access, refresh) = state.issue(&email);
    (
        StatusCode::OK,
        Json(json!({
            "access": access,
            "refresh": refresh,
            "user": { "email": email }
        })),
    )
}

async fn stub_registration(
    State(state): State<Arc<StubState>>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let email = payload["email"].as_str().unwrap_or_default().to_string();
    if email.is_empty() || payload["password"].as_str().is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "email": ["This field is required."] })),
        );
    }

    state.with_identity(&email, |id| id.registrations += 1);
    (StatusCode::CREATED, Json(json!({ "detail": "Registered." })))
}

async fn stub_refresh(
    State(state): State<Arc<StubState>>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let claims = payload["refresh"].as_str().and_then(verify);
    let claims = match claims {
        Some(claims) if claims.token_type == "refresh" => claims,
        _ => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "detail": "Token is invalid or expired",
                    "code": "token_not_valid"
                })),
            );
        }
    };

    state.with_identity(&claims.email, |id| id.refreshes += 1);
    let access = state.mint_access(&claims.email, epoch_now() + 300);
    (StatusCode::OK, Json(json!({ "access": access })))
}

async fn stub_news(
    State(state): State<Arc<StubState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Json<Value> {
    let email = bearer_claims(&headers)
        .map(|c| c.email)
        .unwrap_or_else(|| "anon".to_string());
    state.with_identity(&email, |id| id.news += 1);

    Json(json!({
        "count": 2,
        "next": null,
        "previous": null,
        "results": [
            { "id": 7, "title": "Accra tech fair announced" },
            { "id": 8, "title": "New trade routes open" }
        ],
        "echo_query": query.unwrap_or_default()
    }))
}

async fn stub_news_detail(Path(id): Path<u64>) -> Json<Value> {
    Json(json!({ "id": id, "title": "Accra tech fair announced" }))
}

async fn stub_events() -> impl IntoResponse {
    // permanently broken, for the error-forwarding and fail-soft tests
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "events backend exploded" })),
    )
}

async fn stub_opportunities() -> impl IntoResponse {
    // misbehaving upstream: HTML where JSON belongs
    (
        StatusCode::OK,
        [("content-type", "text/html")],
        "<html><body>scheduled maintenance</body></html>".to_string(),
    )
}

fn token_rejection() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "detail": "Given token not valid for any token type",
            "code": "token_not_valid"
        })),
    )
}

async fn stub_bookmarks_list(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let claims = match bearer_claims(&headers) {
        Some(claims) => claims,
        None => return token_rejection(),
    };
    state.with_identity(&claims.email, |id| id.bookmarks += 1);

    (
        StatusCode::OK,
        Json(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{ "id": 11, "news": 7 }]
        })),
    )
}

async fn stub_bookmarks_create(headers: HeaderMap, Json(payload): Json<Value>) -> impl IntoResponse {
    if bearer_claims(&headers).is_none() {
        return token_rejection();
    }
    (
        StatusCode::CREATED,
        Json(json!({ "id": 12, "news": payload["news"] })),
    )
}

async fn stub_bookmarks_delete(headers: HeaderMap) -> impl IntoResponse {
    if bearer_claims(&headers).is_none() {
        return token_rejection().into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

/// Applications reject access tokens minted before the last revocation,
/// which is how the 401-then-retry path gets exercised.
async fn stub_applications(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let claims = bearer_claims(&headers);
    let email = claims
        .as_ref()
        .map(|c| c.email.clone())
        .unwrap_or_else(|| "anon".to_string());
    state.with_identity(&email, |id| id.applications += 1);

    let claims = match claims {
        Some(claims) => claims,
        None => return token_rejection(),
    };
    if claims.gen != state.counts(&claims.email).gen {
        return token_rejection();
    }

    (
        StatusCode::OK,
        Json(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{ "id": 21, "opportunity": 3, "status": "pending" }]
        })),
    )
}

fn stub_router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/", get(stub_root))
        .route("/auth/login/", post(stub_login))
        .route("/auth/registration/", post(stub_registration))
        .route("/auth/token/refresh/", post(stub_refresh))
        .route("/news/", get(stub_news))
        .route("/news/:id/", get(stub_news_detail))
        .route("/events/", get(stub_events))
        .route("/opportunities/", get(stub_opportunities))
        .route("/bookmarks/", get(stub_bookmarks_list).post(stub_bookmarks_create))
        .route("/bookmarks/:id/", delete(stub_bookmarks_delete))
        .route("/applications/", get(stub_applications))
        .with_state(state)
}

fn spawn_stub() -> Result<(u16, Arc<StubState>)> {
    let state = Arc::new(StubState::default());
    let listener = std::net::TcpListener::bind("127.0.0.1:0").context("failed to bind stub")?;
    let port = listener.local_addr()?.port();
    listener.set_nonblocking(true)?;

    let router_state = state.clone();
    // dedicated runtime so the stub outlives any single test's runtime
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("stub runtime");
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::from_std(listener).expect("stub listener");
            axum::serve(listener, stub_router(router_state))
                .await
                .expect("stub backend");
        });
    });

    Ok((port, state))
}

// ---- gateway process ----------------------------------------------------

impl TestStack {
    fn spawn() -> Result<Self> {
        let (stub_port, stub) = spawn_stub()?;

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/noticeboard-gateway");
        cmd.env("PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("UPSTREAM_BASE_URL", format!("http://127.0.0.1:{}/", stub_port))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn gateway binary")?;

        Ok(Self {
            base_url,
            stub,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "gateway did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_stack() -> Result<&'static TestStack> {
    let stack = STACK.get_or_init(|| TestStack::spawn().expect("failed to spawn test stack"));
    stack.wait_ready(Duration::from_secs(10)).await?;
    Ok(stack)
}

/// Client that neither follows redirects nor stores cookies; tests manage
/// both explicitly.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build test client")
}

// ---- cookie helpers -----------------------------------------------------

pub fn set_cookie_headers(res: &reqwest::Response) -> Vec<String> {
    res.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .collect()
}

/// Value of a cookie from a list of Set-Cookie headers, if it was set.
pub fn set_cookie_value(headers: &[String], name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    headers.iter().find_map(|header| {
        let rest = header.strip_prefix(&prefix)?;
        Some(rest.split(';').next().unwrap_or_default().to_string())
    })
}

/// Build a Cookie request header from name/value pairs.
pub fn cookie_header(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}
