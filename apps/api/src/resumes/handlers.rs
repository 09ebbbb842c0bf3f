use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;
use vitae_core::Resume;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::resume::ResumeRecord;
use crate::resumes::store;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResumePayload {
    pub title: Option<String>,
    pub data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ResumeEnvelope {
    pub resume: ResumeRecord,
}

#[derive(Debug, Serialize)]
pub struct ResumeListResponse {
    pub resumes: Vec<ResumeRecord>,
}

/// Title and data are both required; data must parse as a resume document.
/// The returned data carries an `updatedAt` stamped at `now_ms` or later.
fn validate_payload(payload: ResumePayload, now_ms: i64) -> Result<(String, Value), AppError> {
    let title = payload
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    let data = payload.data.filter(|d| !d.is_null());
    let (Some(title), Some(mut data)) = (title, data) else {
        return Err(AppError::Validation("Missing title or data".into()));
    };
    let Some(fields) = data.as_object_mut() else {
        return Err(AppError::Validation("Resume data must be an object".into()));
    };
    let mut resume = serde_json::from_value::<Resume>(Value::Object(fields.clone()))
        .map_err(|e| AppError::Validation(format!("Resume data is malformed: {e}")))?;
    resume.touch(now_ms);
    fields.insert("updatedAt".into(), json!(resume.updated_at));
    Ok((title, data))
}

/// Ids that are not UUIDs cannot name a stored record.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("Resume {raw} not found")))
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ResumeListResponse>, AppError> {
    let resumes = store::list_for_owner(&state.db, user.id).await?;
    Ok(Json(ResumeListResponse { resumes }))
}

/// POST /api/v1/resumes
pub async fn handle_create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ResumePayload>,
) -> Result<(StatusCode, Json<ResumeEnvelope>), AppError> {
    let (title, data) = validate_payload(payload, Utc::now().timestamp_millis())?;
    let resume = store::create(&state.db, user.id, &title, &data).await?;
    info!("User {} created resume {}", user.id, resume.id);
    Ok((StatusCode::CREATED, Json(ResumeEnvelope { resume })))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ResumeEnvelope>, AppError> {
    let id = parse_id(&id)?;
    let resume = store::find(&state.db, user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(ResumeEnvelope { resume }))
}

/// PUT /api/v1/resumes/:id
pub async fn handle_update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ResumePayload>,
) -> Result<Json<ResumeEnvelope>, AppError> {
    let id = parse_id(&id)?;
    let (title, data) = validate_payload(payload, Utc::now().timestamp_millis())?;
    let resume = store::update(&state.db, user.id, id, &title, &data)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    Ok(Json(ResumeEnvelope { resume }))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    // Deleting something that is not there still succeeds.
    if let Ok(id) = Uuid::parse_str(&id) {
        let removed = store::delete(&state.db, user.id, id).await?;
        info!("User {} deleted resume {id} ({removed} row)", user.id);
    }
    Ok(Json(json!({ "ok": true })))
}
