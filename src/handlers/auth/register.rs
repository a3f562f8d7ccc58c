use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tower_cookies::Cookies;
use tracing::{info, warn};

use super::install_session;
use crate::error::ApiError;
use crate::upstream::{upstream, AuthMode, ProxyRequest, UpstreamResponse};

/// POST /api/auth/signup - register with the backend, then auto-login
///
/// The registration payload is forwarded opaquely; field validation is the
/// backend's job. When registration succeeds, the same credentials are
/// replayed against login so the new user lands with a live session, and
/// the combined result keeps the 201.
pub async fn signup(cookies: Cookies, Json(payload): Json<Value>) -> Result<Response, ApiError> {
    let registration = upstream()
        .send(
            ProxyRequest::post("auth/registration/", payload.clone()),
            &cookies,
            AuthMode::None,
        )
        .await?;

    if !registration.is_success() {
        return Ok(registration.into_response());
    }

    let credentials = match (
        payload.get("email").and_then(Value::as_str),
        payload.get("password").and_then(Value::as_str),
    ) {
        (Some(email), Some(password)) => json!({ "email": email, "password": password }),
        _ => {
            warn!("signup payload had no replayable credentials, skipping auto-login");
            return Ok(registration.into_response());
        }
    };

    let login = upstream()
        .send(
            ProxyRequest::post("auth/login/", credentials),
            &cookies,
            AuthMode::None,
        )
        .await?;

    if !login.is_success() {
        // account exists but the session could not be established;
        // surface the registration result and let the client log in
        warn!("auto-login after signup failed: {}", login.status);
        return Ok(registration.into_response());
    }

    install_session(&cookies, &login.body);
    info!("account registered and session established");

    Ok(UpstreamResponse {
        status: StatusCode::CREATED,
        body: login.body,
    }
    .into_response())
}
