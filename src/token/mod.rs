use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Claims carried in the decodable middle segment of a bearer token.
///
/// The tokens are issued and verified by the upstream backend; the gateway
/// never checks the signature, it only peeks at the expiry claim to decide
/// when a refresh is due. Unknown claims are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub exp: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Decode the claims segment of a bearer token.
///
/// A well-formed token has three dot-separated base64url segments with a
/// JSON object in the middle. Anything else yields `None` - malformed input
/// never errors, callers treat `None` as "needs refresh".
pub fn decode_claims(token: &str) -> Option<Claims> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    let _signature = segments.next()?;
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload.as_bytes()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

/// Seconds remaining until the token expires, measured from `now`
/// (epoch seconds). Negative when already expired. `None` when the token
/// is malformed or carries no expiry claim.
pub fn seconds_until_expiry(token: &str, now: i64) -> Option<i64> {
    let claims = decode_claims(token)?;
    claims.exp.map(|exp| exp - now)
}

/// Whether a token is usable as-is: it decodes, and its expiry claim is
/// either absent (non-expiring, the legacy static-token mode) or in the
/// future.
pub fn is_valid(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Some(claims) => match claims.exp {
            Some(exp) => exp > now,
            None => true,
        },
        None => false,
    }
}

/// Whether the access token should be refreshed before use: unknown expiry
/// or less than `leeway_secs` remaining.
pub fn needs_refresh(token: &str, now: i64, leeway_secs: i64) -> bool {
    match seconds_until_expiry(token, now) {
        Some(remaining) => remaining < leeway_secs,
        None => true,
    }
}

pub fn epoch_now() -> i64 {
    chrono::Utc::now().timestamp()
}
