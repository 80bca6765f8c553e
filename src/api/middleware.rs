//! Server configuration and security middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::IpAddr,
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_RATE_LIMIT: u32 = 100;
const DEFAULT_RATE_LIMIT_WINDOW_SECS: u64 = 60;

/// Server configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Interface to bind (from TASKFLOW_HOST)
    pub host: String,
    /// Port for the HTTP API (from TASKFLOW_PORT)
    pub port: u16,
    /// API key for authentication (from TASKFLOW_API_KEY)
    pub api_key: Option<String>,
    /// Allowed CORS origins (from TASKFLOW_CORS_ORIGINS, comma-separated)
    pub cors_origins: Option<Vec<String>>,
    /// Rate limiter instance
    pub rate_limiter: Option<RateLimiter>,
    /// Override for the durable slot location (from TASKFLOW_DATA_DIR)
    pub data_path: Option<PathBuf>,
    /// Directory for rolling log files (from TASKFLOW_LOG_DIR)
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Load server configuration from environment variables.
    pub fn from_env() -> Self {
        let host = std::env::var("TASKFLOW_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = std::env::var("TASKFLOW_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let api_key = std::env::var("TASKFLOW_API_KEY").ok();

        let cors_origins = std::env::var("TASKFLOW_CORS_ORIGINS")
            .ok()
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect());

        let rate_limit_env = std::env::var("TASKFLOW_RATE_LIMIT").ok();
        let rate_limit = rate_limit_env
            .as_deref()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT);
        let window = std::env::var("TASKFLOW_RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_WINDOW_SECS);

        // Rate limiting is on for remote deployments (API key set) or when
        // requested explicitly.
        let rate_limiter = if api_key.is_some() || rate_limit_env.is_some() {
            Some(RateLimiter::new(rate_limit, Duration::from_secs(window)))
        } else {
            None
        };

        let data_path = std::env::var("TASKFLOW_DATA_DIR")
            .ok()
            .map(|dir| PathBuf::from(dir).join("taskflow.json"));
        let log_dir = std::env::var("TASKFLOW_LOG_DIR").ok().map(PathBuf::from);

        Self {
            host,
            port,
            api_key,
            cors_origins,
            rate_limiter,
            data_path,
            log_dir,
        }
    }

    /// Create a config with no authentication (for local development/testing).
    pub fn disabled() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            api_key: None,
            cors_origins: None,
            rate_limiter: None,
            data_path: None,
            log_dir: None,
        }
    }

    /// Create a config with authentication enabled (for testing).
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::disabled()
        }
    }

    /// Create a config with specific CORS origins.
    pub fn with_cors_origins(origins: Vec<String>) -> Self {
        Self {
            cors_origins: Some(origins),
            ..Self::disabled()
        }
    }

    /// Create a config with rate limiting enabled.
    pub fn with_rate_limit(max_requests: u32) -> Self {
        Self {
            rate_limiter: Some(RateLimiter::new(
                max_requests,
                Duration::from_secs(DEFAULT_RATE_LIMIT_WINDOW_SECS),
            )),
            ..Self::disabled()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Simple in-memory rate limiter using a sliding window.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    /// Maximum requests allowed per window
    max_requests: u32,
    /// Time window duration
    window: Duration,
    /// Request timestamps per IP
    requests: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if a request from the given IP is allowed.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let cutoff = now - self.window;

        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");
        let entry = requests.entry(ip).or_default();

        entry.retain(|&t| t > cutoff);

        if entry.len() < self.max_requests as usize {
            entry.push(now);
            true
        } else {
            false
        }
    }

    /// Drop expired entries to bound memory growth.
    #[allow(dead_code)]
    pub fn cleanup(&self) {
        let cutoff = Instant::now() - self.window;
        let mut requests = self.requests.lock().expect("rate limiter lock poisoned");

        requests.retain(|_, timestamps| {
            timestamps.retain(|&t| t > cutoff);
            !timestamps.is_empty()
        });
    }
}

/// Authentication middleware that checks for a valid bearer token. A config
/// without an API key passes every request through.
pub async fn auth_middleware(
    State(config): State<ServerConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected_key = match &config.api_key {
        Some(key) => key,
        None => return Ok(next.run(request).await),
    };

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    match auth_header {
        Some(header) if header.starts_with("Bearer ") => {
            let token = &header[7..];
            if token == expected_key {
                Ok(next.run(request).await)
            } else {
                tracing::warn!("Invalid API key provided");
                Err(StatusCode::UNAUTHORIZED)
            }
        }
        Some(_) => {
            tracing::warn!("Invalid Authorization header format");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = extract_client_ip(&request);

    if rate_limiter.check(ip) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Rate limit exceeded for IP: {}", ip);
        Err(StatusCode::TOO_MANY_REQUESTS)
    }
}

/// Extract the client IP, preferring proxy headers over the default.
fn extract_client_ip(request: &Request<Body>) -> IpAddr {
    if let Some(forwarded) = request.headers().get("X-Forwarded-For") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(ip_str) = value.split(',').next() {
                if let Ok(ip) = ip_str.trim().parse() {
                    return ip;
                }
            }
        }
    }

    if let Some(real_ip) = request.headers().get("X-Real-IP") {
        if let Ok(value) = real_ip.to_str() {
            if let Ok(ip) = value.trim().parse() {
                return ip;
            }
        }
    }

    "127.0.0.1".parse().expect("localhost address parses")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn rate_limiter_allows_requests_under_limit() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        for _ in 0..5 {
            assert!(limiter.check(ip));
        }
    }

    #[test]
    fn rate_limiter_blocks_requests_over_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let ip: IpAddr = "192.168.1.1".parse().unwrap();

        assert!(limiter.check(ip));
        assert!(limiter.check(ip));
        assert!(limiter.check(ip));

        assert!(!limiter.check(ip));
    }

    #[test]
    fn rate_limiter_tracks_ips_independently() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let ip1: IpAddr = "192.168.1.1".parse().unwrap();
        let ip2: IpAddr = "192.168.1.2".parse().unwrap();

        assert!(limiter.check(ip1));
        assert!(limiter.check(ip1));
        assert!(!limiter.check(ip1));

        assert!(limiter.check(ip2));
        assert!(limiter.check(ip2));
        assert!(!limiter.check(ip2));
    }

    #[test]
    fn config_disabled_has_no_auth() {
        let config = ServerConfig::disabled();
        assert!(config.api_key.is_none());
        assert!(config.cors_origins.is_none());
        assert!(config.rate_limiter.is_none());
    }

    #[test]
    fn config_with_api_key_has_auth() {
        let config = ServerConfig::with_api_key("test-key");
        assert_eq!(config.api_key, Some("test-key".to_string()));
    }
}
