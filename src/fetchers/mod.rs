use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_cookies::Cookies;
use tracing::warn;

use crate::upstream::{upstream, AuthMode, ProxyRequest};

/// One page of backend results in the backend's pagination shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub results: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}

// Fail-soft readers for aggregate views: any upstream failure degrades to
// an empty page so presentation never breaks on backend unavailability.
// Write and auth paths do NOT come through here; those fail loud.

pub async fn bookmarks(cookies: &Cookies) -> Page<Value> {
    read("bookmarks/", Vec::new(), cookies).await
}

pub async fn applications(cookies: &Cookies) -> Page<Value> {
    read("applications/", Vec::new(), cookies).await
}

pub async fn upcoming_events(cookies: &Cookies) -> Page<Value> {
    let query = vec![
        ("ordering".to_string(), "start_date".to_string()),
        ("page_size".to_string(), "5".to_string()),
    ];
    read("events/", query, cookies).await
}

async fn read(path: &str, query: Vec<(String, String)>, cookies: &Cookies) -> Page<Value> {
    let request = ProxyRequest::get(path).with_query(query);
    match upstream().send(request, cookies, AuthMode::Session).await {
        Ok(response) if response.is_success() => parse_page(response.body),
        Ok(response) => {
            warn!("upstream read of {} returned {}", path, response.status);
            Page::default()
        }
        Err(err) => {
            warn!("upstream read of {} failed: {}", path, err);
            Page::default()
        }
    }
}

/// Accept either the paginated envelope or a bare array (some backend
/// endpoints skip pagination for short collections).
fn parse_page(body: Value) -> Page<Value> {
    if let Value::Array(items) = body {
        return Page {
            count: items.len() as u64,
            results: items,
            ..Default::default()
        };
    }
    serde_json::from_value(body).unwrap_or_default()
}
