use axum::{extract::State, response::IntoResponse, Json, http::StatusCode};
use crate::state::AppState;
use crate::error::AppError;
use crate::api::dtos::requests::{LoginRequest, RefreshRequest, RegisterRequest};
use crate::api::dtos::responses::ApiResponse;
use crate::api::extractors::auth::AuthUser;
use crate::domain::models::auth::{AuthResponse, TokenPair, UserProfile};
use crate::domain::models::user::{User, ROLE_STAFF};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

fn profile(user: &User) -> UserProfile {
    UserProfile {
        id: user.id.clone(),
        username: user.username.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
    }
}

fn auth_response(tokens: TokenPair, user: &User) -> AuthResponse {
    AuthResponse { tokens, user: profile(user) }
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if state.user_repo.find_by_username(&payload.username).await?.is_some() {
        return Err(AppError::Conflict(format!("Username '{}' is already taken", payload.username)));
    }
    if state.user_repo.find_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict("Email is already registered".into()));
    }

    let password_hash = state.auth_service.hash_password(&payload.password)?;
    let user = state.user_repo
        .create(&User::new(payload.username, payload.email, password_hash, ROLE_STAFF))
        .await?;

    let tokens = state.auth_service.login(&user).await?;
    info!(user_id = %user.id, "User registered: {}", user.username);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(auth_response(tokens, &user), "Registration successful")),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = if payload.username.contains('@') {
        state.user_repo.find_by_email(&payload.username).await?
    } else {
        state.user_repo.find_by_username(&payload.username).await?
    };

    let Some(user) = user else {
        warn!("Login attempt for unknown user {}", payload.username);
        return Err(AppError::Unauthorized);
    };

    state.auth_service.verify_password(&payload.password, &user.password_hash)
        .inspect_err(|_| warn!(user_id = %user.id, "Login failed: wrong password"))?;

    let tokens = state.auth_service.login(&user).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::success(auth_response(tokens, &user), "Login successful")))
}

pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (tokens, user) = state.auth_service.refresh(&payload.refresh_token).await?;
    info!(user_id = %user.id, "Token refreshed");

    Ok(Json(ApiResponse::success(auth_response(tokens, &user), "Token refreshed")))
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.logout(&payload.refresh_token).await?;
    info!("User logged out");

    Ok(Json(ApiResponse::ok("Logged out")))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let user = state.user_repo.find_by_id(&claims.sub).await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(ApiResponse::success(profile(&user), "Current user")))
}
