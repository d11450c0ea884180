//! Application logic of the wishing wall front end: routing, the sign-up and
//! sign-in flows, the wall page with owner gating and realtime updates, and
//! the local read/liked flags.
//!
//! Everything talks to the server through [`backend::Backend`], which the
//! application root owns and hands to each page, so tests can swap in an
//! in-process implementation.

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod pages;
pub mod placement;
pub mod router;
pub mod storage;

pub use app::{App, Page};
pub use backend::{Backend, Subscription};
pub use error::ClientError;
