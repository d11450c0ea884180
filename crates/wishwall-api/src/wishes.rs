use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{SubsecRound, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use wishwall_db::models::WishRow;
use wishwall_types::api::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PostWishRequest, WishResponse};
use wishwall_types::models::Wish;
use wishwall_types::wish::{random_rotation, validate};

use crate::error::ApiError;
use crate::middleware::Viewer;
use crate::state::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct WishQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Cursor: id of the last (oldest) wish from the previous page.
    pub before: Option<Uuid>,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// GET /walls/{wall_id}/wishes: newest first. Only the owner gets text and
/// sender; everyone else sees blank coloured notes.
pub async fn list_wishes(
    State(state): State<AppState>,
    Path(wall_id): Path<Uuid>,
    Query(query): Query<WishQuery>,
    viewer: Viewer,
) -> Result<impl IntoResponse, ApiError> {
    let wid = wall_id.to_string();
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    let before = query.before.map(|id| id.to_string());

    let found = with_db(&state, move |db| {
        let Some(wall) = db.get_wall(&wid)? else {
            return Ok(None);
        };
        let rows = db.get_wishes(&wid, limit, before.as_deref())?;
        Ok(Some((wall.into_wall()?, rows)))
    })
    .await?;

    let (wall, rows) = found.ok_or(ApiError::NotFound("Wall"))?;
    let is_owner = wall.is_owned_by(viewer.user_id());

    let wishes: Vec<WishResponse> = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            row.into_wish()
                .map_err(|e| warn!("skipping corrupt wish '{}': {:#}", id, e))
                .ok()
        })
        .map(WishResponse::from)
        .map(|w| if is_owner { w } else { w.redacted() })
        .collect();

    Ok(Json(wishes))
}

/// POST /walls/{wall_id}/wishes: anyone may post; the insert is pushed to
/// gateway subscribers of the wall.
pub async fn post_wish(
    State(state): State<AppState>,
    Path(wall_id): Path<Uuid>,
    Json(req): Json<PostWishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let valid = validate(&req)?;

    let wish = Wish {
        id: Uuid::new_v4(),
        wall_id,
        text: valid.text,
        sender: valid.sender,
        color: valid.color,
        rotation: valid.rotation.unwrap_or_else(random_rotation),
        // Stored at millisecond precision; the response and broadcast match it
        created_at: Utc::now().trunc_subsecs(3),
    };

    let row = WishRow::from_wish(&wish);
    let wid = wall_id.to_string();
    let owner_id = with_db(&state, move |db| {
        let Some(wall) = db.get_wall(&wid)? else {
            return Ok(None);
        };
        db.insert_wish(&row)?;
        Ok(Some(wall.into_wall()?.owner_id))
    })
    .await?
    .ok_or(ApiError::NotFound("Wall"))?;

    info!("wish {} posted to wall {}", wish.id, wall_id);

    let response = WishResponse::from(wish);
    state.dispatcher.broadcast(owner_id, response.clone());

    Ok((StatusCode::CREATED, Json(response)))
}
