//! Client configuration (layered: code > env > defaults).

use std::time::Duration;

use crate::error::{ParlorError, Result};

/// Delay before reconnecting a dropped streaming channel. Fixed, no
/// backoff growth and no retry cap.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(3000);

/// Messages fetched per history page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Configuration for a Parlor client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the chat server, no trailing slash.
    pub base_url: String,
    /// WebSocket endpoint for the streaming channel.
    pub ws_url: String,
    /// Messages per history page.
    pub page_size: usize,
    /// Delay between reconnect attempts.
    pub reconnect_delay: Duration,
}

impl ClientConfig {
    /// Build a config for the given base URL; the streaming endpoint is
    /// derived from it (`/ws/chat`, ws scheme).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        let ws_url = derive_ws_url(&base_url)?;
        Ok(Self {
            base_url,
            ws_url,
            page_size: DEFAULT_PAGE_SIZE,
            reconnect_delay: RECONNECT_DELAY,
        })
    }

    /// Load from environment variables, honoring a `.env` file.
    ///
    /// `PARLOR_BASE_URL` (default `http://localhost:8888`),
    /// `PARLOR_WS_URL` (default derived from the base URL),
    /// `PARLOR_PAGE_SIZE` (default 10).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let base_url =
            std::env::var("PARLOR_BASE_URL").unwrap_or_else(|_| "http://localhost:8888".into());
        let mut config = Self::new(base_url)?;
        if let Ok(ws_url) = std::env::var("PARLOR_WS_URL") {
            config.ws_url = ws_url;
        }
        if let Ok(raw) = std::env::var("PARLOR_PAGE_SIZE") {
            config.page_size = raw
                .parse()
                .map_err(|_| ParlorError::Configuration(format!("bad PARLOR_PAGE_SIZE: {raw}")))?;
        }
        Ok(config)
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

fn derive_ws_url(base_url: &str) -> Result<String> {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(ParlorError::Configuration(format!(
            "base URL must be http(s): {base_url}"
        )));
    };
    Ok(format!("{ws_base}/ws/chat"))
}
