use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    // Platform backend
    pub platform_api_url: String,
    pub platform_api_token: Option<String>,
    pub request_timeout_secs: u64,

    // Bearer tokens for this service; unset disables the check
    pub api_token: Option<String>,
    pub admin_api_token: Option<String>,

    // Query adapter
    pub query_stale_secs: u64,
    pub query_retry_attempts: u32,

    // Join flow
    pub join_cooldown_ms: u64,
    pub join_session_ttl_secs: u64,

    // Display
    pub currency_symbol: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            platform_api_url: env::var("PLATFORM_API_URL")
                .map_err(|_| anyhow::anyhow!("PLATFORM_API_URL must be set"))?,
            platform_api_token: env::var("PLATFORM_API_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(10),

            api_token: env::var("API_TOKEN").ok().filter(|s| !s.is_empty()),
            admin_api_token: env::var("ADMIN_API_TOKEN").ok().filter(|s| !s.is_empty()),

            query_stale_secs: env::var("QUERY_STALE_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
            query_retry_attempts: env::var("QUERY_RETRY_ATTEMPTS")
                .unwrap_or_else(|_| "3".into())
                .parse()
                .unwrap_or(3),

            join_cooldown_ms: env::var("JOIN_COOLDOWN_MS")
                .unwrap_or_else(|_| "2000".into())
                .parse()
                .unwrap_or(2000),
            join_session_ttl_secs: env::var("JOIN_SESSION_TTL_SECS")
                .unwrap_or_else(|_| "900".into())
                .parse()
                .unwrap_or(900),

            currency_symbol: env::var("CURRENCY_SYMBOL").unwrap_or_else(|_| "$".into()),
        })
    }

    /// Defaults for everything except the backend location.
    pub fn for_platform(platform_api_url: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            platform_api_url: platform_api_url.into(),
            platform_api_token: None,
            request_timeout_secs: 10,
            api_token: None,
            admin_api_token: None,
            query_stale_secs: 30,
            query_retry_attempts: 3,
            join_cooldown_ms: 2000,
            join_session_ttl_secs: 900,
            currency_symbol: "$".into(),
        }
    }

    pub fn join_cooldown(&self) -> Duration {
        Duration::from_millis(self.join_cooldown_ms)
    }

    pub fn join_session_ttl(&self) -> Duration {
        Duration::from_secs(self.join_session_ttl_secs)
    }

    pub fn query_stale_after(&self) -> Duration {
        Duration::from_secs(self.query_stale_secs)
    }
}
