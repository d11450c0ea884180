use thiserror::Error;

use wishwall_types::wish::WishError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Bad credentials, expired session, or a token the server refused.
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    NotFound(String),

    /// The server understood the request and said no (validation, duplicate
    /// account).
    #[error("{0}")]
    Rejected(String),

    /// Caught before any request was made.
    #[error(transparent)]
    InvalidWish(#[from] WishError),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Realtime connection failed: {0}")]
    Gateway(String),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Malformed data: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Gateway(e.to_string())
    }
}
