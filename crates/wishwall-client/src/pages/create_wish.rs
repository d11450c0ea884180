//! The "Post a Wish" form.

use tracing::{debug, warn};
use uuid::Uuid;

use wishwall_types::api::{PostWishRequest, WishResponse};
use wishwall_types::wish::{self, DEFAULT_COLOR, MAX_SENDER_LEN, MAX_TEXT_LEN, PALETTE};

use crate::backend::Backend;
use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct WishDraft {
    pub text: String,
    pub sender: String,
    color: &'static str,
    submitting: bool,
    error: Option<String>,
}

impl Default for WishDraft {
    fn default() -> Self {
        Self {
            text: String::new(),
            sender: String::new(),
            color: DEFAULT_COLOR,
            submitting: false,
            error: None,
        }
    }
}

impl WishDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Input fields cap their length the way the form does.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().take(MAX_TEXT_LEN).collect();
    }

    pub fn set_sender(&mut self, sender: &str) {
        self.sender = sender.chars().take(MAX_SENDER_LEN).collect();
    }

    pub fn color(&self) -> &'static str {
        self.color
    }

    pub fn palette(&self) -> &'static [&'static str] {
        &PALETTE
    }

    /// Ignored unless `color` is one of the palette entries.
    pub fn select_color(&mut self, color: &str) -> bool {
        match PALETTE.iter().find(|c| c.eq_ignore_ascii_case(color)) {
            Some(c) => {
                self.color = c;
                true
            }
            None => false,
        }
    }

    /// Characters used, for the "n/200" counter.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn remaining_chars(&self) -> usize {
        MAX_TEXT_LEN.saturating_sub(self.char_count())
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.text.trim().is_empty()
    }

    pub fn submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The request this draft would send, validated and with a fresh tilt.
    pub fn to_request(&self) -> Result<PostWishRequest, ClientError> {
        let req = PostWishRequest {
            text: self.text.clone(),
            sender: Some(wish::normalize_sender(Some(&self.sender))),
            color: Some(self.color.to_string()),
            rotation: Some(wish::random_rotation()),
        };
        wish::validate(&req)?;
        Ok(req)
    }

    /// Post the draft to `wall_id`. Blank text never reaches the backend. On
    /// success the draft is cleared and the caller closes the form.
    pub async fn submit(&mut self, backend: &dyn Backend, wall_id: Uuid) -> Result<WishResponse, ClientError> {
        self.error = None;
        let req = match self.to_request() {
            Ok(req) => req,
            Err(e) => {
                debug!("draft rejected locally: {}", e);
                self.error = Some(e.to_string());
                return Err(e);
            }
        };

        self.submitting = true;
        let result = backend.post_wish(wall_id, &req).await;
        self.submitting = false;

        match result {
            Ok(wish) => {
                self.text.clear();
                self.sender.clear();
                Ok(wish)
            }
            Err(e) => {
                warn!("Error submitting wish: {}", e);
                self.error = Some("Failed to send wish. Please try again.".into());
                Err(e)
            }
        }
    }
}
