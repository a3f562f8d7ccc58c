use time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::config;
use crate::error::ApiError;
use crate::token;

/// Cookie holding the short-lived bearer token attached to upstream calls
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie holding the long-lived token exchanged for new access tokens
pub const REFRESH_COOKIE: &str = "refresh_token";
/// Legacy cookie from the static-token auth mode; attached as a bearer
/// when present, never refreshed
pub const LEGACY_COOKIE: &str = "auth_token";

/// The session credentials read from an incoming request's cookie jar.
/// Either token may be absent; the cookies are the only session state.
#[derive(Debug, Clone, Default)]
pub struct SessionTokens {
    access: Option<String>,
    refresh: Option<String>,
    legacy: Option<String>,
}

impl SessionTokens {
    pub fn from_jar(cookies: &Cookies) -> Self {
        Self {
            access: cookies.get(ACCESS_COOKIE).map(|c| c.value().to_string()),
            refresh: cookies.get(REFRESH_COOKIE).map(|c| c.value().to_string()),
            legacy: cookies.get(LEGACY_COOKIE).map(|c| c.value().to_string()),
        }
    }

    pub fn access(&self) -> Option<&str> {
        self.access.as_deref()
    }

    pub fn refresh(&self) -> Option<&str> {
        self.refresh.as_deref()
    }

    /// The token to attach as `Authorization: Bearer`. Prefers the access
    /// token, falls back to the legacy static token.
    pub fn bearer(&self) -> Option<&str> {
        self.access.as_deref().or(self.legacy.as_deref())
    }

    /// Whether any credential that could establish a session is present.
    /// The legacy static token counts; an access token alone does not,
    /// since it cannot outlive its expiry without a refresh token.
    pub fn has_session(&self) -> bool {
        self.refresh.is_some() || self.legacy.is_some()
    }

    pub fn replace_access(&mut self, access: String) {
        self.access = Some(access);
    }
}

/// Reject with 401 when no credential is present at all. Used by the
/// session-gated endpoints so missing-credential errors surface directly,
/// with no upstream call.
pub fn require_session(cookies: &Cookies) -> Result<SessionTokens, ApiError> {
    let tokens = SessionTokens::from_jar(cookies);
    if tokens.bearer().is_none() && tokens.refresh().is_none() {
        return Err(ApiError::unauthorized("Authentication required"));
    }
    Ok(tokens)
}

fn session_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(config::config().session.secure_cookies);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie
}

/// Max-age for a token cookie: remaining life from the embedded expiry
/// claim, or the configured fallback when the token has none.
fn cookie_max_age(token_str: &str, fallback_secs: i64) -> i64 {
    match token::seconds_until_expiry(token_str, token::epoch_now()) {
        Some(remaining) if remaining > 0 => remaining,
        _ => fallback_secs,
    }
}

/// Install a freshly issued access token, replacing the current one.
pub fn store_access_token(cookies: &Cookies, access: &str) {
    let max_age = cookie_max_age(access, config::config().session.access_max_age_secs);
    cookies.add(session_cookie(ACCESS_COOKIE, access.to_string(), max_age));
}

/// Install a freshly issued refresh token (the backend may rotate it).
pub fn store_refresh_token(cookies: &Cookies, refresh: &str) {
    let max_age = cookie_max_age(refresh, config::config().session.refresh_max_age_secs);
    cookies.add(session_cookie(REFRESH_COOKIE, refresh.to_string(), max_age));
}

/// Install the full pair issued by login or signup.
pub fn store_session(cookies: &Cookies, access: &str, refresh: Option<&str>) {
    store_access_token(cookies, access);
    if let Some(refresh) = refresh {
        store_refresh_token(cookies, refresh);
    }
}

/// Delete all session cookies. Logout is purely local.
pub fn clear_session(cookies: &Cookies) {
    for name in [ACCESS_COOKIE, REFRESH_COOKIE, LEGACY_COOKIE] {
        let mut cookie = Cookie::new(name, "");
        cookie.set_path("/");
        cookie.set_http_only(true);
        cookie.set_max_age(Duration::seconds(-1));
        cookies.remove(cookie);
    }
}
