//! Realtime fan-out of wish inserts to WebSocket subscribers.

pub mod connection;
pub mod dispatcher;
