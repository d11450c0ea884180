use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use wishwall_types::api::SessionResponse;

use crate::backend::Backend;
use crate::config::ClientConfig;
use crate::pages::{LandingPage, SignInPage, SignUpPage, WallPage};
use crate::placement::Layout;
use crate::router::Route;
use crate::storage::{KvStore, clear_session, load_session};

pub enum Page {
    Landing(LandingPage),
    SignUp(SignUpPage),
    SignIn(SignInPage),
    Wall(Box<WallPage>),
    NotFound,
}

impl Page {
    pub fn route(&self) -> Route {
        match self {
            Page::Landing(_) => Route::Landing,
            Page::SignUp(_) => Route::SignUp,
            Page::SignIn(_) => Route::SignIn,
            Page::Wall(page) => Route::Wall(page.wall_id()),
            Page::NotFound => Route::NotFound,
        }
    }
}

/// Application root. Owns the backend handle and the local store and hands
/// both to every page it builds.
pub struct App {
    backend: Arc<dyn Backend>,
    store: Arc<dyn KvStore>,
    config: ClientConfig,
    layout: Layout,
    session: Option<SessionResponse>,
}

impl App {
    /// Resumes a session saved in `store`, if there is one.
    pub fn new(backend: Arc<dyn Backend>, store: Arc<dyn KvStore>) -> Self {
        if let Some(token) = load_session(store.as_ref()) {
            debug!("restoring saved session");
            backend.restore_session(token);
        }
        Self {
            backend,
            store,
            config: ClientConfig::default(),
            layout: Layout::default(),
            session: None,
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn session(&self) -> Option<&SessionResponse> {
        self.session.as_ref()
    }

    pub fn viewer(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.user_id)
    }

    /// Ask the backend who is signed in. A failed check counts as signed out.
    pub async fn refresh_session(&mut self) -> Option<&SessionResponse> {
        self.session = match self.backend.session().await {
            Ok(session) => session,
            Err(e) => {
                warn!("session check failed: {}", e);
                None
            }
        };
        if self.session.is_none() {
            clear_session(self.store.as_ref());
        }
        self.session.as_ref()
    }

    /// Build the page for `path`. Wall pages are loaded before they are
    /// returned.
    pub async fn open(&mut self, path: &str) -> Page {
        self.open_route(Route::parse(path)).await
    }

    pub async fn open_route(&mut self, route: Route) -> Page {
        match route {
            Route::Landing => Page::Landing(LandingPage::new()),
            Route::SignUp => Page::SignUp(SignUpPage::new(self.backend.clone(), self.store.clone())),
            Route::SignIn => Page::SignIn(SignInPage::new(self.backend.clone(), self.store.clone())),
            Route::Wall(wall_id) => {
                self.refresh_session().await;
                let mut page = WallPage::new(
                    self.backend.clone(),
                    self.store.clone(),
                    self.config.clone(),
                    self.layout,
                    wall_id,
                    self.viewer(),
                );
                page.load().await;
                Page::Wall(Box::new(page))
            }
            Route::NotFound => Page::NotFound,
        }
    }

    pub fn sign_out(&mut self) -> Route {
        self.backend.sign_out();
        clear_session(self.store.as_ref());
        self.session = None;
        Route::Landing
    }
}
