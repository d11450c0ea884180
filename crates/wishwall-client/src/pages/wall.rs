//! The wall page: one board, its notes, and what the current viewer may do
//! with them.
//!
//! Everyone sees the coloured notes. Only the owner can open one and read
//! it; visitors get a button to post their own wish instead. New wishes
//! arrive over a realtime subscription opened before the first fetch, so an
//! insert racing the initial load shows up exactly once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use wishwall_types::api::{WallResponse, WishResponse};
use wishwall_types::wish::DEFAULT_SENDER;

use crate::backend::{Backend, Subscription};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::pages::create_wish::WishDraft;
use crate::placement::{Layout, Position, place_all};
use crate::router::Route;
use crate::storage::{KvStore, WishFlags};

pub const EMPTY_PROMPT: &str = "Be the first to add a wish!";
pub const OWNER_EMPTY_HINT: &str = "Share your link to start collecting wishes!";

/// Sample notes shown to an owner whose wall has no wishes yet.
const DEMO_NOTES: [(u128, &str, f64); 5] = [
    (1, "#fecaca", -3.0),
    (2, "#fef08a", 2.0),
    (3, "#a7f3d0", -5.0),
    (4, "#fecaca", 4.0),
    (5, "#a7f3d0", -2.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Copy the wall's public link.
    Share,
    /// Save every wish as a JSON file.
    Download,
    PostWish,
    CreateOwnWall,
}

/// A sticky note as laid out on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNote {
    pub id: Uuid,
    pub color: String,
    pub rotation: f64,
    pub position: Position,
    /// Only ever set for the owner.
    pub unread: bool,
    pub liked: bool,
    pub openable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoardContent {
    Notes(Vec<PlacedNote>),
    /// Owner with an empty wall: placeholder notes that can't be opened.
    Demo { notes: Vec<PlacedNote>, hint: &'static str },
    Empty { prompt: &'static str },
}

/// An opened note.
#[derive(Debug, Clone, PartialEq)]
pub struct WishDetail {
    pub id: Uuid,
    pub text: String,
    pub sender: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub liked: bool,
}

/// A file the owner asked to save.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub contents: String,
}

#[derive(Serialize)]
struct WallExport<'a> {
    wall: &'a WallResponse,
    exported_at: DateTime<Utc>,
    wishes: &'a [WishResponse],
}

pub struct WallPage {
    backend: Arc<dyn Backend>,
    store: Arc<dyn KvStore>,
    config: ClientConfig,
    layout: Layout,
    wall_id: Uuid,
    viewer: Option<Uuid>,

    wall: Option<WallResponse>,
    /// Newest first.
    wishes: Vec<WishResponse>,
    subscription: Option<Subscription>,
    selected: Option<Uuid>,
    draft: Option<WishDraft>,

    loading: bool,
    not_found: bool,
    error: Option<String>,
}

impl WallPage {
    pub fn new(
        backend: Arc<dyn Backend>,
        store: Arc<dyn KvStore>,
        config: ClientConfig,
        layout: Layout,
        wall_id: Uuid,
        viewer: Option<Uuid>,
    ) -> Self {
        Self {
            backend,
            store,
            config,
            layout,
            wall_id,
            viewer,
            wall: None,
            wishes: Vec::new(),
            subscription: None,
            selected: None,
            draft: None,
            loading: true,
            not_found: false,
            error: None,
        }
    }

    /// Subscribe, fetch the wall and its wishes, then fold in anything the
    /// subscription delivered meanwhile.
    pub async fn load(&mut self) {
        self.loading = true;
        self.error = None;

        match self.backend.subscribe(self.wall_id).await {
            Ok(sub) => self.subscription = Some(sub),
            Err(e) => warn!("realtime updates unavailable for wall {}: {}", self.wall_id, e),
        }

        match self.backend.get_wall(self.wall_id).await {
            Ok(wall) => self.wall = Some(wall),
            Err(ClientError::NotFound(_)) => {
                info!("wall {} not found", self.wall_id);
                self.not_found = true;
                self.loading = false;
                self.close();
                return;
            }
            Err(e) => {
                warn!("Error fetching wall: {}", e);
                self.error = Some(e.to_string());
                self.loading = false;
                return;
            }
        }

        match self.backend.list_wishes(self.wall_id).await {
            Ok(wishes) => {
                let redact = !self.is_owner();
                self.wishes = wishes
                    .into_iter()
                    .filter(|w| w.wall_id == self.wall_id)
                    .map(|w| if redact { w.redacted() } else { w })
                    .collect();
            }
            Err(e) => {
                warn!("Error fetching wishes: {}", e);
                self.error = Some(e.to_string());
            }
        }

        self.loading = false;
        let caught_up = self.pump_updates();
        debug!(
            "wall {} loaded with {} wishes ({} from the live feed)",
            self.wall_id,
            self.wishes.len(),
            caught_up
        );
    }

    pub fn wall_id(&self) -> Uuid {
        self.wall_id
    }

    pub fn wall(&self) -> Option<&WallResponse> {
        self.wall.as_ref()
    }

    pub fn wishes(&self) -> &[WishResponse] {
        &self.wishes
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn not_found(&self) -> bool {
        self.not_found
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn is_owner(&self) -> bool {
        match (&self.wall, self.viewer) {
            (Some(wall), Some(viewer)) => wall.owner_id == viewer,
            _ => false,
        }
    }

    /// Owner header: title and the short id under it.
    pub fn header(&self) -> Option<(&str, String)> {
        if !self.is_owner() {
            return None;
        }
        let wall = self.wall.as_ref()?;
        Some((wall.title.as_str(), wall.short_id()))
    }

    pub fn controls(&self) -> Vec<Control> {
        if self.wall.is_none() {
            return Vec::new();
        }
        if self.is_owner() {
            vec![Control::Share, Control::Download]
        } else {
            vec![Control::PostWish, Control::CreateOwnWall]
        }
    }

    fn flags(&self) -> WishFlags<'_> {
        WishFlags::new(self.store.as_ref())
    }

    pub fn board(&self) -> BoardContent {
        let owner = self.is_owner();

        if self.wishes.is_empty() {
            if !owner {
                return BoardContent::Empty { prompt: EMPTY_PROMPT };
            }
            let ids: Vec<Uuid> = DEMO_NOTES.iter().map(|&(n, _, _)| Uuid::from_u128(n)).collect();
            let notes = DEMO_NOTES
                .iter()
                .zip(ids.iter().zip(place_all(&ids, self.layout)))
                .map(|(&(_, color, rotation), (&id, position))| PlacedNote {
                    id,
                    color: color.to_string(),
                    rotation,
                    position,
                    unread: false,
                    liked: false,
                    openable: false,
                })
                .collect();
            return BoardContent::Demo {
                notes,
                hint: OWNER_EMPTY_HINT,
            };
        }

        // Placed oldest first so newer notes never push older ones around
        let mut positions = place_all(self.wishes.iter().rev().map(|w| &w.id), self.layout);
        positions.reverse();

        let flags = self.flags();
        let notes = self
            .wishes
            .iter()
            .zip(positions)
            .map(|(w, position)| PlacedNote {
                id: w.id,
                color: w.color.clone(),
                rotation: w.rotation,
                position,
                unread: owner && !flags.is_read(w.id),
                liked: owner && flags.is_liked(w.id),
                openable: owner && !w.is_redacted(),
            })
            .collect();
        BoardContent::Notes(notes)
    }

    /// Owner only: wishes not opened yet.
    pub fn unread_count(&self) -> usize {
        if !self.is_owner() {
            return 0;
        }
        self.flags().unread_count(self.wishes.iter().map(|w| w.id))
    }

    /// Open a note. Visitors get nothing back; the owner gets the content and
    /// the note is marked read.
    pub fn open_wish(&mut self, id: Uuid) -> Option<WishDetail> {
        if !self.is_owner() {
            return None;
        }
        let wish = self.wishes.iter().find(|w| w.id == id)?;
        let text = wish.text.clone()?;
        let detail = WishDetail {
            id,
            text,
            sender: wish.sender.clone().unwrap_or_else(|| DEFAULT_SENDER.to_string()),
            color: wish.color.clone(),
            created_at: wish.created_at,
            liked: self.flags().is_liked(id),
        };

        self.flags().mark_read(id);
        self.selected = Some(id);
        Some(detail)
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selected
    }

    pub fn close_wish(&mut self) {
        self.selected = None;
    }

    /// Owner only. Returns the new liked state.
    pub fn toggle_like(&mut self, id: Uuid) -> Option<bool> {
        if !self.is_owner() || !self.wishes.iter().any(|w| w.id == id) {
            return None;
        }
        Some(self.flags().toggle_like(id))
    }

    /// Add a pushed row to the top of the board. Rows for other walls and
    /// rows already present are ignored. Returns whether the board changed.
    pub fn apply_insert(&mut self, wish: WishResponse) -> bool {
        if wish.wall_id != self.wall_id || self.wishes.iter().any(|w| w.id == wish.id) {
            return false;
        }
        let wish = if self.is_owner() { wish } else { wish.redacted() };
        self.wishes.insert(0, wish);
        true
    }

    /// Apply every insert that has already arrived. Returns how many were new.
    pub fn pump_updates(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(sub) = self.subscription.as_mut() {
            while let Some(wish) = sub.try_next() {
                pending.push(wish);
            }
        }
        let mut added = 0;
        for wish in pending {
            if self.apply_insert(wish) {
                added += 1;
            }
        }
        added
    }

    /// Wait for the next pushed insert and apply it. `None` once the feed has
    /// closed.
    pub async fn recv_update(&mut self) -> Option<bool> {
        let wish = self.subscription.as_mut()?.next().await;
        match wish {
            Some(wish) => Some(self.apply_insert(wish)),
            None => {
                debug!("live feed for wall {} ended", self.wall_id);
                self.subscription = None;
                None
            }
        }
    }

    /// Owner only: the public address to hand out.
    pub fn share_link(&self) -> Option<String> {
        self.is_owner().then(|| self.config.wall_link(self.wall_id))
    }

    /// Owner only: every wish on the wall as pretty JSON.
    pub fn export(&self) -> Result<Option<Download>, ClientError> {
        if !self.is_owner() {
            return Ok(None);
        }
        let Some(wall) = self.wall.as_ref() else {
            return Ok(None);
        };
        let export = WallExport {
            wall,
            exported_at: Utc::now(),
            wishes: &self.wishes,
        };
        Ok(Some(Download {
            filename: format!("wishing-wall-{}.json", wall.short_id()),
            contents: serde_json::to_string_pretty(&export)?,
        }))
    }

    /// Visitor only: start a new wish.
    pub fn open_composer(&mut self) -> Option<&mut WishDraft> {
        if self.wall.is_none() || self.is_owner() {
            return None;
        }
        Some(self.draft.get_or_insert_with(WishDraft::new))
    }

    pub fn composer(&mut self) -> Option<&mut WishDraft> {
        self.draft.as_mut()
    }

    pub fn close_composer(&mut self) {
        self.draft = None;
    }

    /// Post the open draft. On success the form closes and the wish is on the
    /// board without waiting for the live feed.
    pub async fn submit_wish(&mut self) -> Result<(), ClientError> {
        let Some(draft) = self.draft.as_mut() else {
            return Ok(());
        };
        let wish = draft.submit(self.backend.as_ref(), self.wall_id).await?;
        self.draft = None;
        self.apply_insert(wish);
        Ok(())
    }

    /// Where the visitor's "create your own wall" button leads.
    pub fn create_own_wall(&self) -> Route {
        Route::SignUp
    }

    /// Stop listening for inserts.
    pub fn close(&mut self) {
        if let Some(mut sub) = self.subscription.take() {
            sub.close();
        }
    }
}
