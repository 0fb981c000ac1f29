use std::env;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiConfig {
    pub bind: String,
    pub database_url: String,
    pub db_max_connections: u32,
    // `*` allows any origin.
    pub allowed_origins: Vec<String>,
    pub api_key: Option<String>,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub narrative_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3001".to_string(),
            database_url: "sqlite::memory:".to_string(),
            db_max_connections: 5,
            allowed_origins: vec!["*".to_string()],
            api_key: None,
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 120,
            narrative_timeout: Duration::from_millis(8_000),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let allowed_origins = text("CRESTA_ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(|origin| origin.trim().trim_end_matches('/').to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.allowed_origins);

        Self {
            bind: text("CRESTA_BIND").unwrap_or(defaults.bind),
            database_url: text("CRESTA_DATABASE_URL").unwrap_or(defaults.database_url),
            db_max_connections: text("CRESTA_DB_MAX_CONNECTIONS")
                .and_then(|value| value.parse::<u32>().ok())
                .map(|value| value.clamp(1, 64))
                .unwrap_or(defaults.db_max_connections),
            allowed_origins,
            api_key: text("CRESTA_API_KEY"),
            rate_limit_window: text("CRESTA_RATE_LIMIT_WINDOW_SECONDS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: text("CRESTA_RATE_LIMIT_MAX")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.rate_limit_max),
            narrative_timeout: text("CRESTA_NARRATIVE_TIMEOUT_MS")
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.narrative_timeout),
        }
    }

    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|origin| origin == "*")
    }
}
