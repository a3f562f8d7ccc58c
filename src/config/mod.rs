use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub session: SessionConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the external Notice Board REST backend
    pub base_url: String,
    /// Bounded per-request timeout for every outbound call
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fallback max-age for the access cookie when the token has no expiry claim
    pub access_max_age_secs: i64,
    /// Fallback max-age for the refresh cookie when the token has no expiry claim
    pub refresh_max_age_secs: i64,
    /// Remaining lifetime below which the access token is refreshed before use
    pub refresh_leeway_secs: i64,
    /// Mark session cookies Secure (https-only)
    pub secure_cookies: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub enable_request_logging: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("GATEWAY_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Upstream overrides
        if let Ok(v) = env::var("UPSTREAM_BASE_URL") {
            self.upstream.base_url = v;
        }
        if let Ok(v) = env::var("UPSTREAM_TIMEOUT_SECS") {
            self.upstream.timeout_secs = v.parse().unwrap_or(self.upstream.timeout_secs);
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_ACCESS_MAX_AGE_SECS") {
            self.session.access_max_age_secs = v.parse().unwrap_or(self.session.access_max_age_secs);
        }
        if let Ok(v) = env::var("SESSION_REFRESH_MAX_AGE_SECS") {
            self.session.refresh_max_age_secs = v.parse().unwrap_or(self.session.refresh_max_age_secs);
        }
        if let Ok(v) = env::var("SESSION_REFRESH_LEEWAY_SECS") {
            self.session.refresh_leeway_secs = v.parse().unwrap_or(self.session.refresh_leeway_secs);
        }
        if let Ok(v) = env::var("SESSION_SECURE_COOKIES") {
            self.session.secure_cookies = v.parse().unwrap_or(self.session.secure_cookies);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_CORS") {
            self.api.enable_cors = v.parse().unwrap_or(self.api.enable_cors);
        }
        if let Ok(v) = env::var("API_CORS_ORIGINS") {
            self.api.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            upstream: UpstreamConfig {
                base_url: "http://localhost:8000/api/".to_string(),
                timeout_secs: 10,
            },
            session: SessionConfig {
                access_max_age_secs: 5 * 60,
                refresh_max_age_secs: 24 * 60 * 60,
                refresh_leeway_secs: 60,
                secure_cookies: false,
            },
            api: ApiConfig {
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                enable_request_logging: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            upstream: UpstreamConfig {
                base_url: "https://api-staging.ghananoticeboard.com/api/".to_string(),
                timeout_secs: 10,
            },
            session: SessionConfig {
                access_max_age_secs: 5 * 60,
                refresh_max_age_secs: 24 * 60 * 60,
                refresh_leeway_secs: 60,
                secure_cookies: true,
            },
            api: ApiConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.ghananoticeboard.com".to_string()],
                enable_request_logging: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            upstream: UpstreamConfig {
                base_url: "https://api.ghananoticeboard.com/api/".to_string(),
                timeout_secs: 10,
            },
            session: SessionConfig {
                access_max_age_secs: 5 * 60,
                refresh_max_age_secs: 24 * 60 * 60,
                refresh_leeway_secs: 60,
                secure_cookies: true,
            },
            api: ApiConfig {
                enable_cors: true,
                cors_origins: vec!["https://www.ghananoticeboard.com".to_string()],
                enable_request_logging: false,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
