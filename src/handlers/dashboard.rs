use serde_json::{json, Value};
use tower_cookies::Cookies;

use crate::fetchers;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session;

/// GET /api/dashboard/summary - everything the dashboard needs in one call
///
/// Each section is fetched independently and fails soft: an unreachable
/// backend yields empty sections, never an error page. The session gate is
/// the only hard requirement.
pub async fn summary(cookies: Cookies) -> ApiResult<Value> {
    session::require_session(&cookies)?;

    let (bookmarks, applications, upcoming_events) = tokio::join!(
        fetchers::bookmarks(&cookies),
        fetchers::applications(&cookies),
        fetchers::upcoming_events(&cookies),
    );

    Ok(ApiResponse::success(json!({
        "bookmarks": bookmarks,
        "applications": applications,
        "upcoming_events": upcoming_events,
    })))
}
