//! In-process stand-in for the server. One `MockServer` holds the shared
//! rows; each `MockBackend` is one browser with its own session.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use wishwall_client::backend::{Backend, Subscription};
use wishwall_client::error::ClientError;
use wishwall_types::api::{
    AuthResponse, PostWishRequest, SessionResponse, WallResponse, WishResponse,
};
use wishwall_types::wish::{self, random_rotation};

struct Account {
    user_id: Uuid,
    password: String,
    wall_id: Uuid,
}

#[derive(Default)]
struct Rows {
    accounts: HashMap<String, Account>,
    /// wall id -> owner id
    walls: HashMap<Uuid, Uuid>,
    /// Oldest first.
    wishes: Vec<WishResponse>,
    feeds: Vec<(Uuid, Option<Uuid>, mpsc::Sender<WishResponse>)>,
    /// Stored and pushed right after the next feed opens.
    on_subscribe: Option<WishResponse>,
}

#[derive(Default)]
pub struct MockServer {
    rows: Mutex<Rows>,
    pub post_calls: AtomicUsize,
}

impl MockServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn posts(&self) -> usize {
        self.post_calls.load(Ordering::SeqCst)
    }

    pub fn stored_wishes(&self, wall_id: Uuid) -> Vec<WishResponse> {
        let rows = self.rows.lock().unwrap();
        rows.wishes.iter().filter(|w| w.wall_id == wall_id).cloned().collect()
    }

    /// Deliver a row to every open feed on its wall, as the gateway would.
    pub fn push(&self, wish: WishResponse) {
        let mut rows = self.rows.lock().unwrap();
        let owner = rows.walls.get(&wish.wall_id).copied();
        rows.feeds.retain(|(wall_id, viewer, tx)| {
            if *wall_id != wish.wall_id {
                return !tx.is_closed();
            }
            let event = if owner.is_some() && *viewer == owner {
                wish.clone()
            } else {
                wish.clone().redacted()
            };
            tx.try_send(event).is_ok()
        });
    }

    /// Have `wish` committed while the next subscriber is still loading, so
    /// its feed and its first fetch both see it.
    pub fn insert_during_subscribe(&self, wish: WishResponse) {
        self.rows.lock().unwrap().on_subscribe = Some(wish);
    }

    pub fn open_feeds(&self) -> usize {
        let mut rows = self.rows.lock().unwrap();
        rows.feeds.retain(|(_, _, tx)| !tx.is_closed());
        rows.feeds.len()
    }
}

pub struct MockBackend {
    server: Arc<MockServer>,
    session: Mutex<Option<Uuid>>,
}

impl MockBackend {
    pub fn new(server: Arc<MockServer>) -> Arc<Self> {
        Arc::new(Self {
            server,
            session: Mutex::new(None),
        })
    }

    fn viewer(&self) -> Option<Uuid> {
        *self.session.lock().unwrap()
    }

    fn auth(&self, email: &str, account: &Account) -> AuthResponse {
        *self.session.lock().unwrap() = Some(account.user_id);
        AuthResponse {
            user_id: account.user_id,
            email: email.to_string(),
            token: format!("token-{}", account.user_id),
            wall_id: account.wall_id,
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let mut rows = self.server.rows.lock().unwrap();
        if rows.accounts.contains_key(email) {
            return Err(ClientError::Rejected("User already registered".into()));
        }
        let account = Account {
            user_id: Uuid::new_v4(),
            password: password.to_string(),
            wall_id: Uuid::new_v4(),
        };
        rows.walls.insert(account.wall_id, account.user_id);
        let auth = self.auth(email, &account);
        rows.accounts.insert(email.to_string(), account);
        Ok(auth)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let rows = self.server.rows.lock().unwrap();
        match rows.accounts.get(email) {
            Some(account) if account.password == password => Ok(self.auth(email, account)),
            _ => Err(ClientError::Auth("Invalid login credentials".into())),
        }
    }

    async fn session(&self) -> Result<Option<SessionResponse>, ClientError> {
        let Some(user_id) = self.viewer() else {
            return Ok(None);
        };
        let rows = self.server.rows.lock().unwrap();
        Ok(rows
            .accounts
            .iter()
            .find(|(_, a)| a.user_id == user_id)
            .map(|(email, a)| SessionResponse {
                user_id,
                email: email.clone(),
                wall_id: Some(a.wall_id),
            }))
    }

    fn restore_session(&self, token: String) {
        let user = token.strip_prefix("token-").and_then(|id| Uuid::parse_str(id).ok());
        *self.session.lock().unwrap() = user;
    }

    fn sign_out(&self) {
        *self.session.lock().unwrap() = None;
    }

    async fn get_wall(&self, wall_id: Uuid) -> Result<WallResponse, ClientError> {
        let rows = self.server.rows.lock().unwrap();
        let owner_id = *rows
            .walls
            .get(&wall_id)
            .ok_or_else(|| ClientError::NotFound("Wall not found".into()))?;
        Ok(WallResponse {
            id: wall_id,
            owner_id,
            title: "My Wishing Wall".into(),
            created_at: Utc::now(),
            is_owner: self.viewer() == Some(owner_id),
            wish_count: rows.wishes.iter().filter(|w| w.wall_id == wall_id).count() as u64,
        })
    }

    async fn list_wishes(&self, wall_id: Uuid) -> Result<Vec<WishResponse>, ClientError> {
        let rows = self.server.rows.lock().unwrap();
        let owner = rows.walls.get(&wall_id).copied();
        let is_owner = owner.is_some() && owner == self.viewer();
        Ok(rows
            .wishes
            .iter()
            .rev()
            .filter(|w| w.wall_id == wall_id)
            .map(|w| if is_owner { w.clone() } else { w.clone().redacted() })
            .collect())
    }

    async fn post_wish(&self, wall_id: Uuid, req: &PostWishRequest) -> Result<WishResponse, ClientError> {
        self.server.post_calls.fetch_add(1, Ordering::SeqCst);
        let valid = wish::validate(req).map_err(|e| ClientError::Rejected(e.to_string()))?;
        let wish = {
            let mut rows = self.server.rows.lock().unwrap();
            if !rows.walls.contains_key(&wall_id) {
                return Err(ClientError::NotFound("Wall not found".into()));
            }
            let wish = WishResponse {
                id: Uuid::new_v4(),
                wall_id,
                text: Some(valid.text),
                sender: Some(valid.sender),
                color: valid.color,
                rotation: valid.rotation.unwrap_or_else(random_rotation),
                created_at: Utc::now(),
            };
            rows.wishes.push(wish.clone());
            wish
        };
        self.server.push(wish.clone());
        Ok(wish)
    }

    async fn subscribe(&self, wall_id: Uuid) -> Result<Subscription, ClientError> {
        let (tx, rx) = mpsc::channel(64);
        let racing = {
            let mut rows = self.server.rows.lock().unwrap();
            rows.feeds.push((wall_id, self.viewer(), tx));
            let racing = rows.on_subscribe.take();
            if let Some(wish) = &racing {
                rows.wishes.push(wish.clone());
            }
            racing
        };
        if let Some(wish) = racing {
            self.server.push(wish);
        }
        Ok(Subscription::new(wall_id, rx, None))
    }
}

/// A wish as a third party would have stored it.
pub fn wish_for(wall_id: Uuid, text: &str) -> WishResponse {
    WishResponse {
        id: Uuid::new_v4(),
        wall_id,
        text: Some(text.to_string()),
        sender: Some("Friend".into()),
        color: "#e0ffff".into(),
        rotation: 1.5,
        created_at: Utc::now(),
    }
}
