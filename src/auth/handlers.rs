use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        repo::is_unique_violation,
        repo_types::User,
        services::{hash_password, is_valid_email, is_valid_username, verify_password, JwtKeys},
        AuthUser,
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_tokens(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if !is_valid_username(&payload.username) {
        warn!(username = %payload.username, "invalid username");
        return Err(AppError::BadRequest(
            "Username must be 3-32 letters, digits, '.', '_' or '-'".into(),
        ));
    }

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(AppError::BadRequest("Password too short".into()));
    }

    if User::is_taken(&state.db, &payload.username, &payload.email).await? {
        warn!(email = %payload.email, username = %payload.username, "already registered");
        return Err(AppError::Conflict("Username or email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;

    let user = match User::create(&state.db, &payload.username, &payload.email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "registration raced on unique key");
            return Err(AppError::Conflict("Username or email already registered".into()));
        }
        Err(e) => return Err(e.context("create user").into()),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(AppError::BadRequest("Invalid email".into()));
    }

    let Some(user) = User::find_by_email(&state.db, &payload.email).await? else {
        warn!(email = %payload.email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, user_id).await?.ok_or_else(|| {
        warn!(%user_id, "token for unknown user");
        AppError::Unauthorized("User not found".into())
    })?;

    Ok(Json(user.into()))
}
