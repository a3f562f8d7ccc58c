use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_cookies::Cookies;
use tracing::{info, warn};

use crate::session::SessionTokens;
use crate::upstream::upstream;

/// Route classes the gatekeeper decides over, evaluated per request
/// before any handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Static assets and the auth API itself; never inspected
    Exempt,
    /// Dashboard pages; a session is required
    Protected,
    /// Login and signup; already-authenticated users are bounced away
    Auth,
    /// Everything else; proceeds with or without a session
    Public,
}

const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico"];

pub fn classify(path: &str) -> RouteClass {
    if path.starts_with("/api/auth/")
        || path.starts_with("/_assets/")
        || path.starts_with("/static/")
        || path == "/favicon.ico"
        || IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    {
        return RouteClass::Exempt;
    }
    if path == "/dashboard" || path.starts_with("/dashboard/") {
        return RouteClass::Protected;
    }
    if path == "/login" || path == "/signup" {
        return RouteClass::Auth;
    }
    RouteClass::Public
}

fn login_redirect(path: &str) -> Response {
    Redirect::temporary(&format!("/login?redirect={}", path)).into_response()
}

/// Request-level access control over the session cookies:
///
/// - protected route without a session: redirect to login, carrying the
///   original path as the return target;
/// - auth route with a session: redirect to the dashboard;
/// - any inspected route with a refresh token but no access token: refresh
///   inline so the handler (and the browser) get fresh cookies; when that
///   fails, only protected routes bounce to login.
///
/// Pure per-request decision; the cookies are the only state.
pub async fn gatekeeper(cookies: Cookies, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    match classify(&path) {
        RouteClass::Exempt => next.run(request).await,
        RouteClass::Auth => {
            let tokens = SessionTokens::from_jar(&cookies);
            if tokens.has_session() {
                info!("authenticated visitor on {}, redirecting to dashboard", path);
                return Redirect::temporary("/dashboard").into_response();
            }
            next.run(request).await
        }
        class @ (RouteClass::Protected | RouteClass::Public) => {
            let tokens = SessionTokens::from_jar(&cookies);

            if class == RouteClass::Protected && !tokens.has_session() {
                info!("unauthenticated request to {}, redirecting to login", path);
                return login_redirect(&path);
            }

            // silent refresh: refresh token present but access token gone
            if tokens.refresh().is_some() && tokens.access().is_none() {
                if let Err(err) = upstream().refresh_session(&cookies).await {
                    warn!("silent refresh failed for {}: {}", path, err);
                    if class == RouteClass::Protected {
                        return login_redirect(&path);
                    }
                }
            }

            next.run(request).await
        }
    }
}
