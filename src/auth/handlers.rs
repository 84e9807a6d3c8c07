use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, PublicUser,
            RefreshRequest, ResetPasswordRequest, SignupRequest, UpdateProfileRequest,
        },
        services::{check_new_password, is_valid_email, AuthUser, JwtKeys, MIN_PASSWORD_LEN},
    },
    state::AppState,
    store::{
        model::{User, UserRole, UserStatus},
        new_id,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/admin/login", post(admin_login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/password/forgot", post(forgot_password))
        .route("/auth/password/reset", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me))
        .route("/me/password", post(change_password))
}

fn bad_request(msg: &str) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, msg.to_string())
}

fn invalid_credentials() -> (StatusCode, String) {
    (StatusCode::UNAUTHORIZED, "Invalid credentials".into())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    payload.email = payload.email.trim().to_lowercase();
    let name = payload.name.trim().to_string();

    if name.is_empty() {
        return Err(bad_request("Name is required"));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(bad_request("Invalid email"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(bad_request("Password must be at least 6 characters"));
    }

    if state.store.get_user_by_email(&payload.email).await.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err((StatusCode::CONFLICT, "Email already registered".into()));
    }

    let user = User {
        id: new_id(""),
        name,
        email: payload.email,
        password: Some(payload.password),
        role: UserRole::Customer,
        status: UserStatus::Active,
        joined_at: OffsetDateTime::now_utc(),
        purchased_products: vec![],
    };
    let user = state.store.add_user(user).await.map_err(|e| {
        error!(error = %e, "add_user failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    JwtKeys::from_ref(&state).issue(user).map(Json)
}

/// Customer portal. Admin accounts must use `/auth/admin/login`.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let email = payload.email.trim();
    let Some(user) = state.store.verify_credentials(email, &payload.password).await else {
        warn!(email = %email, "login rejected");
        return Err(invalid_credentials());
    };

    if user.role.is_admin() {
        warn!(user_id = %user.id, "admin attempted customer login");
        return Err((StatusCode::FORBIDDEN, "Admins must use the admin portal".into()));
    }
    if user.status == UserStatus::Inactive {
        warn!(user_id = %user.id, "inactive account login");
        return Err((StatusCode::FORBIDDEN, "Account is inactive".into()));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    JwtKeys::from_ref(&state).issue(user).map(Json)
}

#[instrument(skip(state, payload))]
pub async fn admin_login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let email = payload.email.trim();
    match state.store.verify_credentials(email, &payload.password).await {
        Some(user) if user.role.is_admin() => {
            info!(user_id = %user.id, role = ?user.role, "admin logged in");
            JwtKeys::from_ref(&state).issue(user).map(Json)
        }
        _ => {
            warn!(email = %email, "admin login rejected");
            Err(invalid_credentials())
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, format!("{}", e)))?;

    let user = state
        .store
        .get_user(&claims.sub)
        .await
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;
    if user.status == UserStatus::Inactive {
        warn!(user_id = %user.id, "refresh for inactive account");
        return Err((StatusCode::FORBIDDEN, "Account is inactive".into()));
    }
    keys.issue(user).map(Json)
}

/// Sends a one-time code through the mock mail channel (the log).
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let email = payload.email.trim().to_lowercase();
    if state.store.get_user_by_email(&email).await.is_none() {
        warn!(email = %email, "reset requested for unknown email");
        return Err((
            StatusCode::NOT_FOUND,
            "Email address not found in our records".into(),
        ));
    }

    let code = state.reset_codes.issue(&email).await;
    info!(email = %email, code = %code, "mock mail: password reset code");
    Ok(StatusCode::ACCEPTED)
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    let email = payload.email.trim().to_lowercase();
    check_new_password(&payload.new_password, &payload.confirm_password)
        .map_err(bad_request)?;

    if !state.reset_codes.redeem(&email, &payload.code).await {
        warn!(email = %email, "invalid reset code");
        return Err(bad_request("Invalid code"));
    }

    let updated = state
        .store
        .update_password(&email, &payload.new_password)
        .await
        .map_err(|e| {
            error!(error = %e, "update_password failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    if !updated {
        return Err((StatusCode::NOT_FOUND, "User not found".into()));
    }

    info!(email = %email, "password reset");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let user = state.store.get_user(&user_id).await.ok_or_else(|| {
        error!(user_id = %user_id, "user not found");
        (StatusCode::UNAUTHORIZED, "User not found".to_string())
    })?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(bad_request("Name is required"));
    }
    let user = state
        .store
        .update_user_profile(&user_id, name)
        .await
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    info!(user_id = %user_id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    check_new_password(&payload.new_password, &payload.confirm_password)
        .map_err(bad_request)?;

    let user = state
        .store
        .get_user(&user_id)
        .await
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    if state
        .store
        .verify_credentials(&user.email, &payload.current_password)
        .await
        .is_none()
    {
        warn!(user_id = %user_id, "current password mismatch");
        return Err((
            StatusCode::UNAUTHORIZED,
            "Current password is incorrect".into(),
        ));
    }

    state
        .store
        .update_password(&user.email, &payload.new_password)
        .await
        .map_err(|e| {
            error!(error = %e, "update_password failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;
    info!(user_id = %user_id, "password changed");
    Ok(StatusCode::NO_CONTENT)
}
