// handlers/mod.rs - route handler tree
//
// Two tiers: auth endpoints (session lifecycle, exempt from the
// gatekeeper) and content proxies (forwarded to the backend over the
// authenticated fetch). The dashboard summary sits on top of the
// fail-soft fetchers.

pub mod auth;
pub mod content;
pub mod dashboard;
