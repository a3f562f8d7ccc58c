use axum::extract::{Path, Query};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tower_cookies::Cookies;

use super::{detail_path, proxy_list, ListParams};
use crate::error::ApiError;
use crate::session;
use crate::upstream::{upstream, AuthMode, ProxyRequest};

// Bookmarks belong to the signed-in user. A request with no credential at
// all is rejected locally; everything else is the backend's call.

pub async fn list(cookies: Cookies, Query(params): Query<ListParams>) -> Result<Response, ApiError> {
    session::require_session(&cookies)?;
    proxy_list("bookmarks/", params, &cookies).await
}

pub async fn create(cookies: Cookies, Json(payload): Json<Value>) -> Result<Response, ApiError> {
    session::require_session(&cookies)?;
    let response = upstream()
        .send(
            ProxyRequest::post("bookmarks/", payload),
            &cookies,
            AuthMode::Session,
        )
        .await?;
    Ok(response.into_response())
}

pub async fn remove(cookies: Cookies, Path(id): Path<String>) -> Result<Response, ApiError> {
    session::require_session(&cookies)?;
    let response = upstream()
        .send(
            ProxyRequest::delete(detail_path("bookmarks/", &id)?),
            &cookies,
            AuthMode::Session,
        )
        .await?;
    Ok(response.into_response())
}
