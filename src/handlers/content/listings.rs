use axum::extract::{Path, Query};
use axum::response::Response;
use tower_cookies::Cookies;

use super::{proxy_detail, proxy_list, ListParams};
use crate::error::ApiError;

// Read-only listings. Public content, but a bearer is attached when the
// session has one so the backend can personalize (e.g. bookmark flags).

pub async fn news_list(
    cookies: Cookies,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    proxy_list("news/", params, &cookies).await
}

pub async fn news_detail(cookies: Cookies, Path(id): Path<String>) -> Result<Response, ApiError> {
    proxy_detail("news/", &id, &cookies).await
}

pub async fn events_list(
    cookies: Cookies,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    proxy_list("events/", params, &cookies).await
}

pub async fn events_detail(cookies: Cookies, Path(id): Path<String>) -> Result<Response, ApiError> {
    proxy_detail("events/", &id, &cookies).await
}

pub async fn opportunities_list(
    cookies: Cookies,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    proxy_list("opportunities/", params, &cookies).await
}

pub async fn opportunities_detail(
    cookies: Cookies,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    proxy_detail("opportunities/", &id, &cookies).await
}

pub async fn diaspora_list(
    cookies: Cookies,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    proxy_list("diaspora/", params, &cookies).await
}

pub async fn diaspora_detail(
    cookies: Cookies,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    proxy_detail("diaspora/", &id, &cookies).await
}

pub async fn categories_list(
    cookies: Cookies,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    proxy_list("categories/", params, &cookies).await
}

pub async fn categories_detail(
    cookies: Cookies,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    proxy_detail("categories/", &id, &cookies).await
}
