use tracing::info;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server root, without a trailing slash.
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `WISHWALL_URL`, falling back to a local server.
    pub fn from_env() -> Self {
        let url = std::env::var("WISHWALL_URL").unwrap_or_else(|_| {
            info!("WISHWALL_URL not set, using default: {DEFAULT_BASE_URL}");
            DEFAULT_BASE_URL.to_string()
        });
        Self::new(url)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// WebSocket address of the realtime gateway.
    pub fn gateway_url(&self, token: Option<&str>) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };

        match token {
            Some(token) => format!("{ws_base}/gateway?token={token}"),
            None => format!("{ws_base}/gateway"),
        }
    }

    /// Public address of a wall, as shared by its owner.
    pub fn wall_link(&self, wall_id: uuid::Uuid) -> String {
        self.url(&format!("/{wall_id}"))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
