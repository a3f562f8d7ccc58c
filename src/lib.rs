use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_cookies::CookieManagerLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod fetchers;
pub mod handlers;
pub mod middleware;
pub mod session;
pub mod token;
pub mod upstream;

pub fn app() -> Router {
    Router::new()
        // Service info + liveness
        .route("/", get(root))
        .route("/health", get(health))
        // Session lifecycle (gatekeeper-exempt)
        .merge(auth_routes())
        // Content proxies and the dashboard aggregate
        .merge(content_routes())
        .merge(dashboard_routes())
        // Global middleware; the cookie layer must wrap the gatekeeper
        .layer(axum::middleware::from_fn(middleware::gatekeeper))
        .layer(CookieManagerLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_routes() -> Router {
    use handlers::auth;

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/refresh", post(auth::refresh))
}

fn content_routes() -> Router {
    use handlers::content::{applications, bookmarks, listings};

    Router::new()
        .route("/api/news", get(listings::news_list))
        .route("/api/news/:id", get(listings::news_detail))
        .route("/api/events", get(listings::events_list))
        .route("/api/events/:id", get(listings::events_detail))
        .route("/api/opportunities", get(listings::opportunities_list))
        .route("/api/opportunities/:id", get(listings::opportunities_detail))
        .route("/api/diaspora", get(listings::diaspora_list))
        .route("/api/diaspora/:id", get(listings::diaspora_detail))
        .route("/api/categories", get(listings::categories_list))
        .route("/api/categories/:id", get(listings::categories_detail))
        .route("/api/bookmarks", get(bookmarks::list).post(bookmarks::create))
        .route("/api/bookmarks/:id", delete(bookmarks::remove))
        .route(
            "/api/applications",
            get(applications::list).post(applications::create),
        )
        .route("/api/applications/:id", delete(applications::remove))
}

fn dashboard_routes() -> Router {
    Router::new().route("/api/dashboard/summary", get(handlers::dashboard::summary))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Notice Board Gateway",
            "version": version,
            "description": "API gateway for the Ghana Notice Board portal",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/auth/login, /api/auth/signup, /api/auth/logout, /api/auth/refresh",
                "content": "/api/news, /api/events, /api/opportunities, /api/diaspora, /api/categories [/:id]",
                "bookmarks": "/api/bookmarks[/:id] (session)",
                "applications": "/api/applications[/:id] (session)",
                "dashboard": "/api/dashboard/summary (session)",
            }
        }
    }))
}

async fn health() -> impl IntoResponse {
    let now = chrono::Utc::now();

    if upstream::upstream().reachable().await {
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "upstream": "ok"
                }
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "upstream unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now
                }
            })),
        )
    }
}
