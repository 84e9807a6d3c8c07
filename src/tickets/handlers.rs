use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::CreateTicketRequest;
use crate::{
    auth::services::{AdminUser, AuthUser},
    state::AppState,
    store::model::Ticket,
};

pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/tickets", get(my_tickets).post(create_ticket))
        .route("/tickets/:id/toggle", post(toggle_own_ticket))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/tickets", get(list_tickets))
        .route("/admin/tickets/:id/toggle", post(toggle_ticket))
}

/// Flips open/closed. `owner` restricts the flip to that user's tickets.
async fn toggle(
    state: &AppState,
    id: &str,
    owner: Option<&str>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    let ticket = state
        .store
        .toggle_ticket_status(id, owner)
        .await
        .ok_or((StatusCode::NOT_FOUND, "Ticket not found".to_string()))?;
    info!(ticket_id = %id, status = ?ticket.status, "ticket status changed");
    Ok(Json(ticket))
}

#[instrument(skip(state))]
pub async fn create_ticket(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), (StatusCode, String)> {
    let subject = body.subject.trim();
    if subject.is_empty() {
        warn!(user_id = %user_id, "empty ticket subject");
        return Err((StatusCode::BAD_REQUEST, "Subject is required".into()));
    }
    let ticket = state
        .store
        .create_ticket(&user_id, subject, body.priority)
        .await;
    info!(user_id = %user_id, ticket_id = %ticket.id, "ticket opened");
    Ok((StatusCode::CREATED, Json(ticket)))
}

#[instrument(skip(state))]
pub async fn my_tickets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<Vec<Ticket>> {
    let tickets = state
        .store
        .get_tickets()
        .await
        .into_iter()
        .filter(|t| t.user_id == user_id)
        .collect();
    Json(tickets)
}

#[instrument(skip(state))]
pub async fn toggle_own_ticket(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    toggle(&state, &id, Some(user_id.as_str())).await
}

#[instrument(skip(state, _admin))]
pub async fn list_tickets(State(state): State<AppState>, _admin: AdminUser) -> Json<Vec<Ticket>> {
    Json(state.store.get_tickets().await)
}

#[instrument(skip(state, _admin))]
pub async fn toggle_ticket(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, (StatusCode, String)> {
    toggle(&state, &id, None).await
}
