use std::{env, path::PathBuf};

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_MAPS_BASE_URL: &str = "https://api.mapbox.com";
pub const DEFAULT_LOG_DIR: &str = "server/log";

/// Process configuration. Read once at startup from the environment, after `.env` is loaded.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub maps_api_key: String,
    pub maps_base_url: String,
    pub database_url: Option<String>,
    pub log_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|port| match port.trim().parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    tracing::warn!("Ignoring unparsable PORT {port:?}, using {DEFAULT_PORT}");
                    None
                }
            })
            .unwrap_or(DEFAULT_PORT);

        Self {
            port,
            maps_api_key: env::var("MAPS_API_KEY").unwrap_or_default(),
            maps_base_url: non_empty_var("MAPS_BASE_URL").unwrap_or_else(|| DEFAULT_MAPS_BASE_URL.to_string()),
            database_url: non_empty_var("DATABASE_URL"),
            log_dir: non_empty_var("LOG_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Keys copied from `.env.example` or truncated while pasting are rejected up front.
pub fn is_placeholder_key(key: &str) -> bool {
    let key = key.trim();
    key.is_empty() || key.to_ascii_lowercase().contains("your_mapbox") || key.len() < 35
}
