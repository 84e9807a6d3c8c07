use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{dto::PublicUser, services::AdminUser},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/toggle-status", post(toggle_status))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(State(state): State<AppState>, _admin: AdminUser) -> Json<Vec<PublicUser>> {
    let users = state
        .store
        .get_users()
        .await
        .into_iter()
        .map(PublicUser::from)
        .collect();
    Json(users)
}

/// Flips active/inactive. Inactive customers cannot log in.
#[instrument(skip(state, admin))]
pub async fn toggle_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = state
        .store
        .toggle_user_status(&id)
        .await
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    info!(admin_id = %admin.id, user_id = %id, status = ?user.status, "user status changed");
    Ok(Json(user.into()))
}
