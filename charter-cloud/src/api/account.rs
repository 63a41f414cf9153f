//! Registration, login and the caller's profile

use axum::routing::get;
use axum::{Extension, Json, Router, extract::State};
use shared::error::{AppError, ErrorCode};
use shared::models::{
    AuthResponse, ExperienceLevel, LoginRequest, RegisterRequest, UserProfile, UserRole,
};

use super::{ApiResult, ValidJson, internal};
use crate::auth::UserIdentity;
use crate::auth::user_auth::create_token;
use crate::db;
use crate::error::conflict_on_unique;
use crate::state::AppState;
use crate::util::{hash_password, normalize_email, verify_password};

pub fn router() -> Router<AppState> {
    Router::new().route("/api/me", get(me))
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    if req.role == UserRole::Admin {
        return Err(AppError::permission_denied("Admin accounts cannot self-register"));
    }

    let email = normalize_email(&req.email);
    let hashed = hash_password(&req.password).map_err(internal)?;
    let experience = req.experience_level.unwrap_or(ExperienceLevel::Beginner);

    let user = db::users::create(
        &state.pool,
        &db::users::CreateUser {
            id: shared::util::snowflake_id(),
            email: &email,
            hashed_password: &hashed,
            name: req.name.trim(),
            role: req.role.as_db(),
            experience_level: experience.as_db(),
            now: shared::util::now_millis(),
        },
    )
    .await
    .map_err(|e| AppError::from(conflict_on_unique(e, ErrorCode::EmailAlreadyRegistered)))?;

    let token = create_token(user.id, &user.email, req.role, &state.jwt_secret).map_err(internal)?;
    tracing::info!(user_id = user.id, role = %user.role, "User registered");

    Ok(Json(AuthResponse { token, user }))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = normalize_email(&req.email);
    let record = db::users::find_by_email(&state.pool, &email)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::InvalidCredentials))?;

    if !verify_password(&req.password, &record.hashed_password) {
        tracing::info!(user_id = record.id, "Login rejected: wrong password");
        return Err(AppError::new(ErrorCode::InvalidCredentials));
    }

    let role = UserRole::from_db(&record.role).ok_or_else(|| internal("unknown role in users row"))?;
    let token = create_token(record.id, &record.email, role, &state.jwt_secret).map_err(internal)?;

    Ok(Json(AuthResponse {
        token,
        user: record.profile(),
    }))
}

/// GET /api/me
pub async fn me(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<UserProfile> {
    let profile = db::users::find_profile(&state.pool, identity.user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(profile))
}
