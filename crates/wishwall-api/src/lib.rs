//! HTTP surface of the wishing wall: auth, walls, wishes and the realtime
//! gateway upgrade.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod walls;
pub mod wishes;

pub use routes::router;
pub use state::{AppState, AppStateInner};
