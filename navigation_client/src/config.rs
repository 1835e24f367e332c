use std::{env, time::Duration};

use crate::{api::REQUEST_TIMEOUT, session::SessionSettings};

pub const DEFAULT_API_URL: &str = "http://localhost:4000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the navigation backend, e.g. the LAN URL the server prints on startup.
    pub api_url: String,
    pub request_timeout: Duration,
    pub session: SessionSettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: REQUEST_TIMEOUT,
            session: SessionSettings::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let api_url = env::var("NAVIGATION_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_url,
            ..Self::default()
        }
    }
}
