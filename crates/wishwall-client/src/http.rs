use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wishwall_types::api::{
    AuthResponse, ErrorBody, MAX_PAGE_SIZE, PostWishRequest, SessionResponse, SignInRequest, SignUpRequest,
    WallResponse, WishResponse,
};
use wishwall_types::events::{GatewayCommand, GatewayEvent};

use crate::backend::{Backend, Subscription};
use crate::config::ClientConfig;
use crate::error::ClientError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// How long to wait for the gateway to acknowledge a subscription.
const SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Inserts buffered between the socket reader and the page.
const FEED_CAPACITY: usize = 256;

/// [`Backend`] over the server's HTTP API and WebSocket gateway.
pub struct HttpBackend {
    http: reqwest::Client,
    config: ClientConfig,
    token: RwLock<Option<String>>,
    page_size: u32,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            config,
            token: RwLock::new(None),
            page_size: MAX_PAGE_SIZE,
        })
    }

    /// Wishes requested per round trip when loading a wall.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = req.send().await?;
        let resp = check(resp).await?;
        Ok(resp.json::<T>().await?)
    }
}

/// Turn a non-2xx response into the matching [`ClientError`].
async fn check(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("Request failed").to_string(),
    };

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Auth(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Rejected(message)
        }
        _ => ClientError::Server {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl Backend for HttpBackend {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let req = self.http.post(self.config.url("/auth/signup")).json(&SignUpRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        let auth: AuthResponse = self.send(req).await?;
        self.set_token(Some(auth.token.clone()));
        Ok(auth)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthResponse, ClientError> {
        let req = self.http.post(self.config.url("/auth/signin")).json(&SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        });
        let auth: AuthResponse = self.send(req).await?;
        self.set_token(Some(auth.token.clone()));
        Ok(auth)
    }

    async fn session(&self) -> Result<Option<SessionResponse>, ClientError> {
        if self.token().is_none() {
            return Ok(None);
        }
        let req = self.authorized(self.http.get(self.config.url("/auth/session")));
        match self.send::<SessionResponse>(req).await {
            Ok(session) => Ok(Some(session)),
            Err(ClientError::Auth(msg)) => {
                // Expired or revoked; behave as signed out from here on
                debug!("dropping stale session: {}", msg);
                self.set_token(None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn restore_session(&self, token: String) {
        self.set_token(Some(token));
    }

    fn sign_out(&self) {
        self.set_token(None);
    }

    async fn get_wall(&self, wall_id: Uuid) -> Result<WallResponse, ClientError> {
        let req = self.authorized(self.http.get(self.config.url(&format!("/walls/{wall_id}"))));
        self.send(req).await
    }

    async fn list_wishes(&self, wall_id: Uuid) -> Result<Vec<WishResponse>, ClientError> {
        let url = self.config.url(&format!("/walls/{wall_id}/wishes"));
        let mut wishes: Vec<WishResponse> = Vec::new();
        loop {
            let mut req = self.http.get(&url).query(&[("limit", self.page_size)]);
            if let Some(last) = wishes.last() {
                req = req.query(&[("before", last.id)]);
            }
            let page: Vec<WishResponse> = self.send(self.authorized(req)).await?;
            let done = page.len() < self.page_size as usize;
            wishes.extend(page);
            if done {
                break;
            }
        }
        debug!("loaded {} wishes for wall {}", wishes.len(), wall_id);
        Ok(wishes)
    }

    async fn post_wish(&self, wall_id: Uuid, wish: &PostWishRequest) -> Result<WishResponse, ClientError> {
        let req = self
            .http
            .post(self.config.url(&format!("/walls/{wall_id}/wishes")))
            .json(wish);
        self.send(req).await
    }

    async fn subscribe(&self, wall_id: Uuid) -> Result<Subscription, ClientError> {
        let url = self.config.gateway_url(self.token().as_deref());
        let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str()).await?;

        let cmd = serde_json::to_string(&GatewayCommand::Subscribe { wall_ids: vec![wall_id] })?;
        socket.send(Message::text(cmd)).await?;

        // Wait for the ack so inserts made after we return can't be missed
        let acked = tokio::time::timeout(SUBSCRIBE_TIMEOUT, async {
            while let Some(msg) = socket.next().await {
                let Message::Text(text) = msg? else { continue };
                match serde_json::from_str::<GatewayEvent>(text.as_str()) {
                    Ok(GatewayEvent::Subscribed { wall_ids }) if wall_ids.contains(&wall_id) => {
                        return Ok::<bool, ClientError>(true);
                    }
                    Ok(GatewayEvent::Subscribed { .. }) => return Ok(false),
                    Ok(_) => {}
                    Err(e) => warn!("ignoring malformed gateway frame: {}", e),
                }
            }
            Ok(false)
        })
        .await
        .map_err(|_| ClientError::Gateway("timed out waiting for subscription".into()))??;

        if !acked {
            return Err(ClientError::Gateway(format!("subscription to wall {wall_id} was refused")));
        }
        info!("subscribed to wall {}", wall_id);

        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let task = tokio::spawn(async move {
            while let Some(msg) = socket.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        warn!("gateway connection for wall {} failed: {}", wall_id, e);
                        break;
                    }
                };

                match serde_json::from_str::<GatewayEvent>(text.as_str()) {
                    Ok(GatewayEvent::WishCreate { wish }) if wish.wall_id == wall_id => {
                        if tx.send(wish).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => warn!("ignoring malformed gateway frame: {}", e),
                }
            }
            debug!("gateway reader for wall {} finished", wall_id);
        });

        Ok(Subscription::new(wall_id, rx, Some(task)))
    }
}
