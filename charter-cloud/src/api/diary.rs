//! Fishing diary

use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{DiaryEntry, DiaryEntryInput, DiaryStats, diary_stats};
use validator::Validate;

use super::{ApiResult, AppPath, ValidJson, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::state::AppState;
use crate::storage::{UploadUrl, is_entry_photo_key, photo_extension, photo_key};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/diary", get(list_entries).post(create_entry))
        .route("/api/diary/stats", get(stats))
        .route(
            "/api/diary/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/diary/{id}/photos", post(photo_upload_url))
        .route("/api/diary/{id}/photos/confirm", post(confirm_photo))
}

async fn check_trip(state: &AppState, input: &DiaryEntryInput) -> Result<(), AppError> {
    if let Some(trip_id) = input.trip_id {
        db::trips::find_by_id(&state.pool, trip_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| AppError::new(ErrorCode::TripNotFound))?;
    }
    Ok(())
}

/// POST /api/diary
pub async fn create_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ValidJson(input): ValidJson<DiaryEntryInput>,
) -> ApiResult<DiaryEntry> {
    check_trip(&state, &input).await?;
    let entry = db::diary::create(
        &state.pool,
        shared::util::snowflake_id(),
        identity.user_id,
        &input,
        shared::util::now_millis(),
    )
    .await
    .map_err(internal)?;
    tracing::info!(entry_id = entry.id, catches = entry.catches.len(), "Diary entry created");
    Ok(Json(entry))
}

/// GET /api/diary
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<DiaryEntry>> {
    let entries = db::diary::list_by_user(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(entries))
}

pub(crate) async fn owned_entry(
    state: &AppState,
    identity: &UserIdentity,
    id: i64,
) -> Result<DiaryEntry, AppError> {
    db::diary::find_owned(&state.pool, id, identity.user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::DiaryEntryNotFound))
}

/// GET /api/diary/{id}
pub async fn get_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<DiaryEntry> {
    Ok(Json(owned_entry(&state, &identity, id).await?))
}

/// PUT /api/diary/{id}
pub async fn update_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
    ValidJson(input): ValidJson<DiaryEntryInput>,
) -> ApiResult<DiaryEntry> {
    check_trip(&state, &input).await?;
    let entry = db::diary::update(
        &state.pool,
        id,
        identity.user_id,
        &input,
        shared::util::now_millis(),
    )
    .await
    .map_err(internal)?
    .ok_or_else(|| AppError::new(ErrorCode::DiaryEntryNotFound))?;
    Ok(Json(entry))
}

/// DELETE /api/diary/{id}
pub async fn delete_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<serde_json::Value> {
    if !db::diary::delete(&state.pool, id, identity.user_id)
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::DiaryEntryNotFound));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// GET /api/diary/stats
pub async fn stats(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<DiaryStats> {
    let entries = db::diary::list_by_user(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(diary_stats(&entries)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PhotoUploadRequest {
    #[validate(length(min = 1, max = 100))]
    pub content_type: String,
}

/// POST /api/diary/{id}/photos: presigned PUT; the key is recorded on confirm
pub async fn photo_upload_url(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
    ValidJson(req): ValidJson<PhotoUploadRequest>,
) -> ApiResult<UploadUrl> {
    let entry = owned_entry(&state, &identity, id).await?;
    let ext = photo_extension(&req.content_type).ok_or_else(|| {
        AppError::with_message(ErrorCode::InvalidFormat, "Unsupported photo type")
            .with_detail("content_type", req.content_type.clone())
    })?;

    let key = photo_key(identity.user_id, entry.id, shared::util::snowflake_id(), ext);
    let upload = state.photos.presigned_put(&key, &req.content_type).await?;
    tracing::info!(entry_id = entry.id, key = %key, "Photo upload URL issued");
    Ok(Json(upload))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PhotoConfirmRequest {
    #[validate(length(min = 1, max = 200))]
    pub key: String,
}

/// POST /api/diary/{id}/photos/confirm: record an uploaded photo on the entry
pub async fn confirm_photo(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
    ValidJson(req): ValidJson<PhotoConfirmRequest>,
) -> ApiResult<DiaryEntry> {
    if !is_entry_photo_key(identity.user_id, id, &req.key) {
        return Err(AppError::new(ErrorCode::PhotoNotUploaded).with_detail("key", req.key));
    }
    let entry = owned_entry(&state, &identity, id).await?;
    if entry.photo_keys.contains(&req.key) {
        return Ok(Json(entry));
    }
    if !state.photos.object_exists(&req.key).await? {
        return Err(AppError::new(ErrorCode::PhotoNotUploaded).with_detail("key", req.key));
    }

    let now = shared::util::now_millis();
    if !db::diary::add_photo_key(&state.pool, entry.id, identity.user_id, &req.key, now)
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::DiaryEntryNotFound));
    }
    tracing::info!(entry_id = entry.id, key = %req.key, "Photo recorded");
    Ok(Json(owned_entry(&state, &identity, id).await?))
}
