// handlers/content/mod.rs - passthrough endpoints for backend-owned content
//
// Content entities (news, events, opportunities, diaspora posts,
// categories, bookmarks, applications) are owned and validated by the
// backend; the gateway maps filter parameters onto the upstream query
// string and forwards JSON bodies untouched.

use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tower_cookies::Cookies;

use crate::error::ApiError;
use crate::upstream::{upstream, AuthMode, ProxyRequest};

pub mod applications;
pub mod bookmarks;
pub mod listings;

/// Portal filter parameters accepted by every list endpoint. Unset
/// parameters are dropped, not forwarded as empty strings.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub ordering: Option<String>,
}

impl ListParams {
    pub fn into_query(self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size".to_string(), page_size.to_string()));
        }
        if let Some(search) = self.search {
            query.push(("search".to_string(), search));
        }
        if let Some(category) = self.category {
            query.push(("category".to_string(), category));
        }
        if let Some(region) = self.region {
            query.push(("region".to_string(), region));
        }
        if let Some(ordering) = self.ordering {
            query.push(("ordering".to_string(), ordering));
        }
        query
    }
}

pub(crate) async fn proxy_list(
    path: &str,
    params: ListParams,
    cookies: &Cookies,
) -> Result<Response, ApiError> {
    let request = ProxyRequest::get(path).with_query(params.into_query());
    let response = upstream().send(request, cookies, AuthMode::Session).await?;
    Ok(response.into_response())
}

pub(crate) async fn proxy_detail(
    prefix: &str,
    id: &str,
    cookies: &Cookies,
) -> Result<Response, ApiError> {
    let request = ProxyRequest::get(detail_path(prefix, id)?);
    let response = upstream().send(request, cookies, AuthMode::Session).await?;
    Ok(response.into_response())
}

/// Join an id onto a resource prefix. Ids come from path segments, so a
/// traversal sequence means a malformed request, not a real resource.
pub(crate) fn detail_path(prefix: &str, id: &str) -> Result<String, ApiError> {
    if id.is_empty() || id.contains('/') || id.contains("..") {
        return Err(ApiError::bad_request("Invalid resource id"));
    }
    Ok(format!("{}{}/", prefix, id))
}
