use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::dto::{Overview, PurchaseRequest, RevenueResponse};
use crate::{
    auth::{
        dto::PublicUser,
        services::{AdminUser, AuthUser},
    },
    state::AppState,
    store::model::{Order, TicketStatus},
};

pub fn purchase_routes() -> Router<AppState> {
    Router::new().route("/orders", post(purchase))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/orders", get(list_orders))
        .route("/admin/revenue", get(revenue))
        .route("/admin/overview", get(overview))
}

/// Buys an active product for the caller. Ownership is checked here; the
/// store itself records an order on every call.
#[instrument(skip(state))]
pub async fn purchase(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<PurchaseRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let product = match state.store.get_product(&body.product_id).await {
        Some(p) if p.active => p,
        _ => return Err((StatusCode::NOT_FOUND, "Product not found".into())),
    };

    let user = state
        .store
        .get_user(&user_id)
        .await
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    if user.owns(&product.id) {
        warn!(user_id = %user_id, product_id = %product.id, "repeat purchase refused");
        return Err((StatusCode::CONFLICT, "You already own this product".into()));
    }

    match state.store.create_order(&user_id, &product).await {
        Some(user) => {
            info!(user_id = %user_id, product_id = %product.id, amount = product.price, "purchase complete");
            Ok(Json(user.into()))
        }
        None => {
            error!(user_id = %user_id, product_id = %product.id, "purchase failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Purchase failed. Please contact support.".into(),
            ))
        }
    }
}

#[instrument(skip(state, _admin))]
pub async fn list_orders(State(state): State<AppState>, _admin: AdminUser) -> Json<Vec<Order>> {
    Json(state.store.get_orders().await)
}

#[instrument(skip(state, _admin))]
pub async fn revenue(State(state): State<AppState>, _admin: AdminUser) -> Json<RevenueResponse> {
    Json(RevenueResponse {
        revenue: state.store.get_revenue().await,
    })
}

#[instrument(skip(state, _admin))]
pub async fn overview(State(state): State<AppState>, _admin: AdminUser) -> Json<Overview> {
    let store = &state.store;
    let (users, products, orders, tickets, revenue) = tokio::join!(
        store.get_users(),
        store.get_products(),
        store.get_orders(),
        store.get_tickets(),
        store.get_revenue(),
    );
    Json(Overview {
        users: users.len(),
        active_products: products.iter().filter(|p| p.active).count(),
        orders: orders.len(),
        open_tickets: tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Open)
            .count(),
        revenue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn admin(state: &AppState) -> AdminUser {
        AdminUser(state.store.get_user("admin_1").await.unwrap())
    }

    fn buy(product_id: &str) -> Json<PurchaseRequest> {
        Json(PurchaseRequest {
            product_id: product_id.into(),
        })
    }

    #[tokio::test]
    async fn purchase_grants_product_and_records_revenue() {
        let state = AppState::fake();
        let Json(user) = purchase(State(state.clone()), AuthUser("u2".into()), buy("2"))
            .await
            .unwrap();
        assert_eq!(user.purchased_products, vec!["2".to_string()]);

        let Json(orders) = list_orders(State(state.clone()), admin(&state).await).await;
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].amount, 2499);

        let Json(rev) = revenue(State(state.clone()), admin(&state).await).await;
        assert_eq!(rev.revenue, 4999 + 2499);
    }

    #[tokio::test]
    async fn purchase_refuses_owned_and_retired_products() {
        let state = AppState::fake();
        let err = purchase(State(state.clone()), AuthUser("u1".into()), buy("1"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::CONFLICT);

        state.store.delete_product("3").await;
        let err = purchase(State(state.clone()), AuthUser("u2".into()), buy("3"))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        assert_eq!(state.store.get_orders().await.len(), 1);
    }

    #[tokio::test]
    async fn overview_counts() {
        let state = AppState::fake();
        state.store.delete_product("4").await;
        let Json(o) = overview(State(state.clone()), admin(&state).await).await;
        assert_eq!(o.users, 3);
        assert_eq!(o.active_products, 3);
        assert_eq!(o.orders, 1);
        assert_eq!(o.open_tickets, 1);
        assert_eq!(o.revenue, 4999);
    }
}
