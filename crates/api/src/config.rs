use std::collections::HashSet;

/// Rate limit settings for the check-in and check-out routes.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Requests admitted per key within one window (default: `5`).
    pub max_requests: u32,
    /// Window length in seconds (default: `60`).
    pub window_secs: u64,
    /// Key clients by the first `X-Forwarded-For` entry instead of the peer
    /// address. Only enable behind a proxy that sets the header.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            window_secs: 60,
            trust_forwarded_for: false,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on pooled database connections (default: `20`).
    pub db_max_connections: u32,
    pub rate_limit: RateLimitConfig,
    /// Power plants where check-in is refused with `SITE_BLOCKED`.
    /// Stored lowercased; matched case-insensitively.
    pub blocked_power_plants: HashSet<String>,
    /// Raw `NOTIFY_RECIPIENTS` value, parsed by the events crate.
    pub notify_recipients: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                    |
    /// |---------------------------|----------------------------|
    /// | `HOST`                    | `0.0.0.0`                  |
    /// | `PORT`                    | `3000`                     |
    /// | `CORS_ORIGINS`            | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                       |
    /// | `DB_MAX_CONNECTIONS`      | `20`                       |
    /// | `RATE_LIMIT_MAX_REQUESTS` | `5`                        |
    /// | `RATE_LIMIT_WINDOW_SECS`  | `60`                       |
    /// | `RATE_LIMIT_TRUST_PROXY`  | `false`                    |
    /// | `BLOCKED_POWER_PLANTS`    | (empty)                    |
    /// | `NOTIFY_RECIPIENTS`       | (empty)                    |
    ///
    /// Panics on unparsable values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = split_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let db_max_connections: u32 = std::env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "20".into())
            .parse()
            .expect("DB_MAX_CONNECTIONS must be a valid u32");

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            max_requests: std::env::var("RATE_LIMIT_MAX_REQUESTS")
                .map(|v| v.parse().expect("RATE_LIMIT_MAX_REQUESTS must be a valid u32"))
                .unwrap_or(defaults.max_requests),
            window_secs: std::env::var("RATE_LIMIT_WINDOW_SECS")
                .map(|v| v.parse().expect("RATE_LIMIT_WINDOW_SECS must be a valid u64"))
                .unwrap_or(defaults.window_secs),
            trust_forwarded_for: std::env::var("RATE_LIMIT_TRUST_PROXY")
                .map(|v| parse_bool(&v).expect("RATE_LIMIT_TRUST_PROXY must be true or false"))
                .unwrap_or(defaults.trust_forwarded_for),
        };

        let blocked_power_plants = parse_blocked_power_plants(
            &std::env::var("BLOCKED_POWER_PLANTS").unwrap_or_default(),
        );

        let notify_recipients = std::env::var("NOTIFY_RECIPIENTS").unwrap_or_default();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            db_max_connections,
            rate_limit,
            blocked_power_plants,
            notify_recipients,
        }
    }

    /// Whether check-ins at this power plant are refused.
    pub fn is_site_blocked(&self, power_plant: &str) -> bool {
        self.blocked_power_plants
            .contains(&power_plant.trim().to_lowercase())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse the comma-separated `BLOCKED_POWER_PLANTS` value.
pub fn parse_blocked_power_plants(raw: &str) -> HashSet<String> {
    split_list(raw).into_iter().map(|s| s.to_lowercase()).collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
