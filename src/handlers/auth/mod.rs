// handlers/auth/mod.rs - session endpoints under /api/auth/*
//
// These routes are exempt from the gatekeeper: they are how a session is
// established, renewed, and torn down. All of them speak JSON and forward
// upstream error bodies as-is.

use serde_json::Value;
use tower_cookies::Cookies;

pub mod register;
pub mod session;

pub use register::signup;
pub use session::{login, logout, refresh};

/// Pull the token pair out of an upstream auth payload and install the
/// session cookies. Tolerates both `access`/`refresh` and the older
/// `access_token`/`refresh_token` field names.
pub(crate) fn install_session(cookies: &Cookies, body: &Value) {
    let access = body
        .get("access")
        .or_else(|| body.get("access_token"))
        .and_then(Value::as_str);
    let refresh = body
        .get("refresh")
        .or_else(|| body.get("refresh_token"))
        .and_then(Value::as_str);

    if let Some(access) = access {
        crate::session::store_session(cookies, access, refresh);
    }
}
