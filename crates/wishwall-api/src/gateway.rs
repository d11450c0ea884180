use axum::{
    extract::{Query, State, WebSocketUpgrade},
    response::IntoResponse,
};
use serde::Deserialize;

use wishwall_gateway::connection;

use crate::error::ApiError;
use crate::middleware::decode_token;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GatewayQuery {
    pub token: Option<String>,
}

/// GET /gateway: browsers can't set headers on a WebSocket handshake, so the
/// optional token rides in the query string. It is validated before the
/// upgrade; a bad token never gets a socket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    Query(query): Query<GatewayQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, ApiError> {
    let viewer = match query.token.as_deref() {
        Some(token) => Some(decode_token(&state.jwt_secret, token)?.sub),
        None => None,
    };

    let dispatcher = state.dispatcher.clone();
    Ok(ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher, viewer)))
}
