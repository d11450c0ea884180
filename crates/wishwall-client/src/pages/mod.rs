pub mod auth;
pub mod create_wish;
pub mod landing;
pub mod wall;

pub use auth::{SignInPage, SignUpPage};
pub use create_wish::WishDraft;
pub use landing::{Countdown, LandingPage};
pub use wall::{BoardContent, Control, PlacedNote, WallPage, WishDetail};
