use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use wishwall_types::api::WallResponse;

use crate::error::ApiError;
use crate::middleware::Viewer;
use crate::state::{AppState, with_db};

/// GET /walls/{wall_id}: public; `is_owner` tells the page which controls to
/// render.
pub async fn get_wall(
    State(state): State<AppState>,
    Path(wall_id): Path<Uuid>,
    viewer: Viewer,
) -> Result<impl IntoResponse, ApiError> {
    let wid = wall_id.to_string();
    let found = with_db(&state, move |db| {
        let Some(row) = db.get_wall(&wid)? else {
            return Ok(None);
        };
        let count = db.count_wishes(&wid)?;
        Ok(Some((row.into_wall()?, count)))
    })
    .await?;

    let (wall, wish_count) = found.ok_or(ApiError::NotFound("Wall"))?;
    let is_owner = wall.is_owned_by(viewer.user_id());

    Ok(Json(WallResponse::from_wall(wall, is_owner, wish_count)))
}
