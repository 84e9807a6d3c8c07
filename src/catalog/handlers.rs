use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::download::{attachment, decode_payload};
use super::dto::{CatalogProduct, CatalogQuery, CreateProductRequest};
use crate::{
    auth::services::{AdminUser, AuthUser},
    state::AppState,
    store::{
        model::{FilePayload, Product, ProductPatch},
        new_id,
    },
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/:id", get(get_product))
        .route("/products/:id/demo", get(download_demo))
        .route("/products/:id/download", get(download_product))
        .route("/me/products", get(my_products))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/products", get(admin_list_products).post(create_product))
        .route(
            "/admin/products/:id",
            axum::routing::patch(update_product).delete(delete_product),
        )
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB, products carry Base64 files
}

fn not_found() -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, "Product not found".into())
}

async fn active_product(state: &AppState, id: &str) -> Result<Product, (StatusCode, String)> {
    match state.store.get_product(id).await {
        Some(p) if p.active => Ok(p),
        _ => Err(not_found()),
    }
}

fn serve_file(product_id: &str, file: Option<&FilePayload>) -> Result<Response, (StatusCode, String)> {
    let file = file.ok_or((StatusCode::NOT_FOUND, "No file attached".to_string()))?;
    let bytes = decode_payload(&file.data).map_err(|e| {
        error!(error = %e, product_id = %product_id, "stored payload is not valid base64");
        (StatusCode::INTERNAL_SERVER_ERROR, "Corrupt file payload".to_string())
    })?;
    Ok(attachment(file, bytes))
}

// --- handlers ---

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(q): Query<CatalogQuery>,
) -> Json<Vec<CatalogProduct>> {
    let products = state
        .store
        .get_products()
        .await
        .into_iter()
        .filter(|p| p.active)
        .filter(|p| q.category.map_or(true, |c| p.category == c))
        .map(CatalogProduct::from)
        .collect();
    Json(products)
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogProduct>, (StatusCode, String)> {
    active_product(&state, &id)
        .await
        .map(|p| Json(CatalogProduct::from(p)))
}

#[instrument(skip(state))]
pub async fn download_demo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let product = active_product(&state, &id).await?;
    serve_file(&product.id, product.demo_file.as_ref())
}

/// Full payload; owners and admins only.
#[instrument(skip(state))]
pub async fn download_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, String)> {
    let user = state
        .store
        .get_user(&user_id)
        .await
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    if !user.owns(&id) && !user.role.is_admin() {
        warn!(user_id = %user_id, product_id = %id, "download without purchase");
        return Err((StatusCode::FORBIDDEN, "Purchase required".into()));
    }

    // owners keep access after a product is retired
    let product = state.store.get_product(&id).await.ok_or_else(not_found)?;
    info!(user_id = %user_id, product_id = %id, "product download");
    serve_file(&product.id, product.file.as_ref())
}

#[instrument(skip(state))]
pub async fn my_products(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Product>>, (StatusCode, String)> {
    let user = state
        .store
        .get_user(&user_id)
        .await
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    let owned = state
        .store
        .get_products()
        .await
        .into_iter()
        .filter(|p| user.owns(&p.id))
        .collect();
    Ok(Json(owned))
}

#[instrument(skip(state, _admin))]
pub async fn admin_list_products(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Json<Vec<Product>> {
    Json(state.store.get_products().await)
}

#[instrument(skip(state, admin, body))]
pub async fn create_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<Product>), (StatusCode, String)> {
    body.validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let id = new_id("");
    let product = Product {
        image_url: body
            .image_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| format!("https://picsum.photos/seed/{id}/400/300")),
        id,
        name: body.name.trim().to_string(),
        description: body.description,
        price: body.price,
        category: body.category,
        features: body
            .features
            .unwrap_or_else(|| vec!["Feature 1".into(), "Feature 2".into()]),
        active: true,
        version: Some(body.version.unwrap_or_else(|| "1.0".into())),
        license_type: body.license_type,
        file: body.file,
        demo_file: body.demo_file,
    };

    let product = state.store.add_product(product).await;
    info!(admin_id = %admin.id, product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, admin, patch))]
pub async fn update_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<StatusCode, (StatusCode, String)> {
    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err((StatusCode::BAD_REQUEST, "name cannot be empty".into()));
    }
    if patch.price == Some(0) {
        return Err((StatusCode::BAD_REQUEST, "price must be positive".into()));
    }
    state.store.update_product(&id, patch).await;
    info!(admin_id = %admin.id, product_id = %id, "product updated");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, admin))]
pub async fn delete_product(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> StatusCode {
    state.store.delete_product(&id).await;
    info!(admin_id = %admin.id, product_id = %id, "product retired");
    StatusCode::NO_CONTENT
}
