use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_cookies::Cookies;
use tracing::info;

use super::install_session;
use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::session;
use crate::upstream::{upstream, AuthMode, ProxyRequest, RefreshError};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login - exchange credentials for a session
///
/// Credentials go to the backend unauthenticated; a successful response
/// carries the token pair, which is installed as the session cookies. The
/// backend's body is forwarded either way so the client sees the same
/// payload it would get talking to the backend directly.
pub async fn login(
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let body = json!({ "email": payload.email, "password": payload.password });
    let response = upstream()
        .send(ProxyRequest::post("auth/login/", body), &cookies, AuthMode::None)
        .await?;

    if response.is_success() {
        install_session(&cookies, &response.body);
        info!("session established for {}", payload.email);
    }

    Ok(response.into_response())
}

/// POST /api/auth/logout - tear the session down
///
/// Purely local: the cookies are deleted, nothing is sent upstream.
pub async fn logout(cookies: Cookies) -> ApiResponse<Value> {
    session::clear_session(&cookies);
    ApiResponse::success(json!({ "detail": "Signed out" }))
}

/// POST /api/auth/refresh - exchange the refresh cookie for a new access token
///
/// A missing refresh cookie is a 401 with no upstream call. An upstream
/// rejection is forwarded with its status and body.
pub async fn refresh(cookies: Cookies) -> Response {
    match upstream().refresh_session(&cookies).await {
        Ok(access) => ApiResponse::success(json!({ "access": access })).into_response(),
        Err(RefreshError::NoRefreshToken) => {
            ApiError::unauthorized("No refresh token").into_response()
        }
        Err(RefreshError::Rejected { status, body }) => (status, Json(body)).into_response(),
        Err(RefreshError::Malformed) => {
            ApiError::bad_gateway("Refresh response was missing an access token").into_response()
        }
        Err(RefreshError::InvalidUrl(e)) => {
            tracing::error!("invalid refresh url: {}", e);
            ApiError::internal_server_error("Gateway misconfiguration").into_response()
        }
        Err(RefreshError::Network(e)) => {
            tracing::error!("refresh request failed: {}", e);
            ApiError::bad_gateway("Upstream service unreachable").into_response()
        }
    }
}
