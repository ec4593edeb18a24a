use std::env;

/// Startup configuration, read once from the environment and passed into
/// the server. No ambient globals.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub db_url: String,
    /// Origins allowed by the CORS layer. Empty means "allow any origin".
    pub allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let db_url = env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
        let allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();

        Config {
            bind_addr,
            db_url,
            allowed_origins,
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
