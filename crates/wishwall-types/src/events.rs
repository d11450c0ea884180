use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::WishResponse;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Sent once after the upgrade. `user_id` is set when the connection
    /// presented a valid token.
    Ready { user_id: Option<Uuid> },

    /// Acknowledges a `Subscribe`; inserts for these walls are delivered from
    /// here on.
    Subscribed { wall_ids: Vec<Uuid> },

    /// A wish was posted to a wall this connection subscribed to.
    WishCreate { wish: WishResponse },
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Start receiving inserts for these walls.
    Subscribe { wall_ids: Vec<Uuid> },

    /// Stop receiving inserts for these walls.
    Unsubscribe { wall_ids: Vec<Uuid> },
}
