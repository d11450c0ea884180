//! Rules every wish must satisfy before it is stored.
//!
//! Both the client (before issuing a request) and the server (before
//! inserting) run the same checks, so a blank note never reaches the database.

use rand::Rng;
use thiserror::Error;

use crate::api::PostWishRequest;

pub const MAX_TEXT_LEN: usize = 200;
pub const MAX_SENDER_LEN: usize = 30;
pub const DEFAULT_SENDER: &str = "Anonymous";

/// Notes are tilted by at most this many degrees either way.
pub const MAX_ROTATION: f64 = 5.0;

pub const PALETTE: [&str; 5] = [
    "#fff0f5", // lavender blush
    "#e0ffff", // light cyan
    "#f0fff0", // honeydew
    "#fffacd", // lemon chiffon
    "#e6e6fa", // lavender
];

pub const DEFAULT_COLOR: &str = PALETTE[0];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WishError {
    #[error("Wish text cannot be empty")]
    EmptyText,

    #[error("Wish text is limited to {} characters", MAX_TEXT_LEN)]
    TextTooLong,

    #[error("Sender name is limited to {} characters", MAX_SENDER_LEN)]
    SenderTooLong,

    #[error("Color {0} is not in the palette")]
    UnknownColor(String),

    #[error("Rotation {0} is outside the allowed tilt range")]
    RotationOutOfRange(f64),
}

/// A wish that passed validation. `rotation` is `None` when the poster left
/// it to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidWish {
    pub text: String,
    pub sender: String,
    pub color: String,
    pub rotation: Option<f64>,
}

pub fn validate(req: &PostWishRequest) -> Result<ValidWish, WishError> {
    let text = req.text.trim();
    if text.is_empty() {
        return Err(WishError::EmptyText);
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(WishError::TextTooLong);
    }

    let sender = normalize_sender(req.sender.as_deref());
    if sender.chars().count() > MAX_SENDER_LEN {
        return Err(WishError::SenderTooLong);
    }

    let color = match req.color.as_deref() {
        None => DEFAULT_COLOR.to_string(),
        Some(c) => {
            let c = c.trim().to_ascii_lowercase();
            if !PALETTE.contains(&c.as_str()) {
                return Err(WishError::UnknownColor(c));
            }
            c
        }
    };

    if let Some(r) = req.rotation {
        if !r.is_finite() || r.abs() > MAX_ROTATION {
            return Err(WishError::RotationOutOfRange(r));
        }
    }

    Ok(ValidWish {
        text: text.to_string(),
        sender,
        color,
        rotation: req.rotation,
    })
}

/// Blank or whitespace-only senders post as "Anonymous".
pub fn normalize_sender(sender: Option<&str>) -> String {
    match sender.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => DEFAULT_SENDER.to_string(),
    }
}

/// Uniform tilt in `[-MAX_ROTATION, MAX_ROTATION)`.
pub fn random_rotation() -> f64 {
    rand::rng().random_range(-MAX_ROTATION..MAX_ROTATION)
}
