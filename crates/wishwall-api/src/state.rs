use std::sync::Arc;

use tracing::error;

use wishwall_db::Database;
use wishwall_gateway::dispatcher::Dispatcher;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub dispatcher: Dispatcher,
}

impl AppStateInner {
    pub fn new(db: Database, jwt_secret: impl Into<String>) -> AppState {
        Arc::new(Self {
            db,
            jwt_secret: jwt_secret.into(),
            dispatcher: Dispatcher::new(),
        })
    }
}

/// Run blocking database work off the async runtime.
pub async fn with_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(anyhow::anyhow!("blocking task failed"))
        })?
        .map_err(ApiError::from)
}
