use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub meili_url: String,
    pub meili_key: String,
    pub google_api_key: String,
    pub http_timeout_ms: u64,
    pub cache_ttl_secs: i64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "1111"),
            meili_url: try_load("MEILI_URL", "http://localhost:7700"),
            meili_key: read_secret("MEILI_ADMIN_KEY"),
            google_api_key: read_secret("GOOGLE_API_KEY"),
            http_timeout_ms: try_load("HTTP_TIMEOUT_MS", "5000"),
            cache_ttl_secs: try_load("CACHE_TTL_SECONDS", "86400"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .expect("Secrets misconfigured!")
}
