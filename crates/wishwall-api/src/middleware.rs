use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, Header, authorization::Bearer};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;
use uuid::Uuid;

pub use wishwall_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Reject requests without a valid bearer token; stash the claims for the
/// handler.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())?.ok_or(ApiError::Unauthorized)?;
    let claims = decode_token(&state.jwt_secret, &token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Whoever is looking at a public resource. Anonymous visitors are
/// `Viewer(None)`; a present but invalid token is rejected rather than
/// silently downgraded.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<Claims>);

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|c| c.sub)
    }
}

impl FromRequestParts<AppState> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers)? {
            Some(token) => Ok(Viewer(Some(decode_token(&state.jwt_secret, &token)?))),
            None => Ok(Viewer(None)),
        }
    }
}

/// `Ok(None)` when there is no Authorization header at all.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, ApiError> {
    if !headers.contains_key(header::AUTHORIZATION) {
        return Ok(None);
    }
    let auth = Authorization::<Bearer>::decode(&mut headers.get_all(header::AUTHORIZATION).iter())
        .map_err(|_| ApiError::Unauthorized)?;
    Ok(Some(auth.token().to_string()))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!("rejected token: {}", e);
        ApiError::Unauthorized
    })
}
