use noticeboard_gateway::{app, config};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up UPSTREAM_BASE_URL etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!(
        "Starting Notice Board Gateway in {:?} mode, upstream {}",
        config.environment,
        config.upstream.base_url
    );

    let app = app();

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Notice Board Gateway listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
