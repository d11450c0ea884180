use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Wall, Wish};

// -- JWT Claims --

/// Shared by the REST middleware and the gateway upgrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: usize,
}

// -- Auth --

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Returned by both sign-up and sign-in; the client navigates to `wall_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
    pub wall_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,
    pub wall_id: Option<Uuid>,
}

/// Lower-cases and trims an address, or `None` if it doesn't look like one.
pub fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return None;
    }
    let (host, tld) = domain.rsplit_once('.')?;
    if host.is_empty() || tld.is_empty() {
        return None;
    }
    Some(email)
}

// -- Walls --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub is_owner: bool,
    pub wish_count: u64,
}

impl WallResponse {
    pub fn from_wall(wall: Wall, is_owner: bool, wish_count: u64) -> Self {
        Self {
            id: wall.id,
            owner_id: wall.owner_id,
            title: wall.title,
            created_at: wall.created_at,
            is_owner,
            wish_count,
        }
    }

    /// First eight characters of the id: the owner's header and export
    /// filename use it.
    pub fn short_id(&self) -> String {
        self.id.to_string().chars().take(8).collect()
    }
}

// -- Wishes --

/// Wishes per page when the request doesn't say.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Largest page the server hands out.
pub const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostWishRequest {
    pub text: String,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub rotation: Option<f64>,
}

/// A wish as it travels over the wire. Visitors receive it with `text` and
/// `sender` stripped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishResponse {
    pub id: Uuid,
    pub wall_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub color: String,
    pub rotation: f64,
    pub created_at: DateTime<Utc>,
}

impl WishResponse {
    pub fn redacted(mut self) -> Self {
        self.text = None;
        self.sender = None;
        self
    }

    pub fn is_redacted(&self) -> bool {
        self.text.is_none()
    }
}

impl From<Wish> for WishResponse {
    fn from(w: Wish) -> Self {
        Self {
            id: w.id,
            wall_id: w.wall_id,
            text: Some(w.text),
            sender: Some(w.sender),
            color: w.color,
            rotation: w.rotation,
            created_at: w.created_at,
        }
    }
}

// -- Misc --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email(" Ann@Example.COM "), Some("ann@example.com".into()));
        assert_eq!(normalize_email("ann@example"), None);
        assert_eq!(normalize_email("@example.com"), None);
        assert_eq!(normalize_email("ann@@example.com"), None);
        assert_eq!(normalize_email("an n@example.com"), None);
        assert_eq!(normalize_email("ann@.com"), None);
    }

    #[test]
    fn redacted_wish_omits_content_on_the_wire() {
        let wish = WishResponse {
            id: Uuid::new_v4(),
            wall_id: Uuid::new_v4(),
            text: Some("secret".into()),
            sender: Some("Mike".into()),
            color: "#e0ffff".into(),
            rotation: 1.5,
            created_at: Utc::now(),
        }
        .redacted();

        let json = serde_json::to_value(&wish).unwrap();
        assert!(json.get("text").is_none());
        assert!(json.get("sender").is_none());
        assert_eq!(json["color"], "#e0ffff");

        let back: WishResponse = serde_json::from_value(json).unwrap();
        assert!(back.is_redacted());
    }

    #[test]
    fn short_id_is_the_first_id_group() {
        let wall = Wall {
            id: Uuid::parse_str("3f2a9c1e-7b4d-4e8a-9c0f-1a2b3c4d5e6f").unwrap(),
            owner_id: Uuid::new_v4(),
            title: "My Wishing Wall".into(),
            created_at: Utc::now(),
        };
        assert_eq!(WallResponse::from_wall(wall, true, 0).short_id(), "3f2a9c1e");
    }
}
