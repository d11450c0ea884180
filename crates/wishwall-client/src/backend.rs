use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use wishwall_types::api::{AuthResponse, PostWishRequest, SessionResponse, WallResponse, WishResponse};

use crate::error::ClientError;

/// Everything the pages need from the server. The application root owns one
/// instance and hands it to each page.
///
/// Implementations keep the signed-in session: `sign_up` and `sign_in` store
/// the token, subsequent reads carry it, `sign_out` forgets it.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError>;

    /// The current session, or `None` when signed out.
    async fn session(&self) -> Result<Option<SessionResponse>, ClientError>;

    /// Resume a session persisted from an earlier run.
    fn restore_session(&self, token: String);

    fn sign_out(&self);

    async fn get_wall(&self, wall_id: Uuid) -> Result<WallResponse, ClientError>;

    /// Newest first.
    async fn list_wishes(&self, wall_id: Uuid) -> Result<Vec<WishResponse>, ClientError>;

    async fn post_wish(&self, wall_id: Uuid, wish: &PostWishRequest) -> Result<WishResponse, ClientError>;

    /// Open a realtime feed of inserts on one wall. Inserts made after this
    /// returns are guaranteed to be delivered.
    async fn subscribe(&self, wall_id: Uuid) -> Result<Subscription, ClientError>;
}

/// A live feed of wishes inserted into one wall. Closing (or dropping) it
/// stops the background reader.
pub struct Subscription {
    wall_id: Uuid,
    rx: mpsc::Receiver<WishResponse>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    /// `task`, if given, is the reader feeding `rx`; it is aborted on close.
    pub fn new(wall_id: Uuid, rx: mpsc::Receiver<WishResponse>, task: Option<JoinHandle<()>>) -> Self {
        Self { wall_id, rx, task }
    }

    pub fn wall_id(&self) -> Uuid {
        self.wall_id
    }

    /// Wait for the next insert. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<WishResponse> {
        self.rx.recv().await
    }

    /// An insert that has already arrived, without waiting.
    pub fn try_next(&mut self) -> Option<WishResponse> {
        self.rx.try_recv().ok()
    }

    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.rx.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}
