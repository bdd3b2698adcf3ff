/// Runtime configuration for the HTTP service, populated from environment
/// variables with the production deployment's values as defaults.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `FORGE_ALLOWED_ORIGINS` | localhost dev + production frontend | comma-separated CORS allow-list |
/// | `FORGE_RATE_LIMIT_PER_MINUTE` | `10` | global requests per rolling minute |
/// | `FORGE_RATE_LIMIT_PER_DAY` | `1000` | global requests per rolling day |
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Origins allowed to call the API with credentials.
    pub allowed_origins: Vec<String>,

    /// Global request ceiling per rolling minute, shared by all clients.
    pub rate_limit_per_minute: usize,

    /// Global request ceiling per rolling day, shared by all clients.
    pub rate_limit_per_day: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("FORGE_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:3000".to_string(),
                    "https://forge-api-rose.vercel.app".to_string(),
                ]
            });

        Self {
            allowed_origins,
            rate_limit_per_minute: env_usize("FORGE_RATE_LIMIT_PER_MINUTE", 10),
            rate_limit_per_day: env_usize("FORGE_RATE_LIMIT_PER_DAY", 1000),
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
