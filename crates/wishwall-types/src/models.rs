use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's shareable board. Exactly one per owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wall {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Wall {
    pub fn is_owned_by(&self, user_id: Option<Uuid>) -> bool {
        user_id == Some(self.owner_id)
    }
}

/// A stored sticky note. Wishes are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wish {
    pub id: Uuid,
    pub wall_id: Uuid,
    pub text: String,
    pub sender: String,
    pub color: String,
    pub rotation: f64,
    pub created_at: DateTime<Utc>,
}
