//! Types shared by the wishing wall server and its clients.

pub mod api;
pub mod events;
pub mod models;
pub mod wish;
