use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use wishwall_types::api::HealthResponse;

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, gateway, walls, wishes};

pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/signin", post(auth::sign_in))
        .route("/walls/{wall_id}", get(walls::get_wall))
        .route(
            "/walls/{wall_id}/wishes",
            get(wishes::list_wishes).post(wishes::post_wish),
        )
        .route("/gateway", get(gateway::ws_upgrade))
        .route("/health", get(health));

    let protected_routes = Router::new()
        .route("/auth/session", get(auth::session))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        connections: state.dispatcher.connections(),
    })
}
