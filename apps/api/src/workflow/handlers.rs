//! Axum route handlers for the AutoApply session API.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::intake::{ResumeFile, ACCEPTED_RESUME_EXTENSIONS};
use crate::state::AppState;
use crate::workflow::session::{WorkflowSession, WorkflowSnapshot};

/// Multipart field carrying the résumé.
const RESUME_FIELD: &str = "resume";

#[derive(Debug, Deserialize)]
pub struct JobUpdateRequest {
    pub job_description: Option<String>,
    pub job_url: Option<String>,
}

/// Oversized bodies get a message naming the configured limit.
fn upload_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::UploadTooLarge(format!("resume upload exceeds the {limit}-byte limit"))
    } else {
        AppError::Upload(err)
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<WorkflowSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

/// POST /api/v1/autoapply/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<WorkflowSnapshot>) {
    let session = state.open_session().await;
    info!(session_id = %session.id(), "Session opened");
    (StatusCode::CREATED, Json(session.snapshot().await))
}

/// GET /api/v1/autoapply/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    Ok(Json(session.snapshot().await))
}

/// PUT /api/v1/autoapply/sessions/:id/job
///
/// Absent fields are left as they are; an empty string clears a field.
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<JobUpdateRequest>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let snapshot = session.update_job(req.job_description, req.job_url).await?;
    Ok(Json(snapshot))
}

/// PUT /api/v1/autoapply/sessions/:id/resume
///
/// Expects a multipart file under `resume`. Unusual extensions are logged, not rejected.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let limit = state.config.max_resume_bytes;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(e, limit))?
    {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let name = field
            .file_name()
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("resume upload has no file name".to_string()))?;
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| upload_error(e, limit))?;
        upload = Some(ResumeFile::new(name, content_type, bytes));
        break;
    }

    let file = upload.ok_or_else(|| {
        AppError::Validation(format!("multipart field '{RESUME_FIELD}' is required"))
    })?;

    if !file.has_accepted_extension() {
        warn!(
            session_id = %id,
            "Resume '{}' is not one of {:?}; accepting anyway",
            file.name,
            ACCEPTED_RESUME_EXTENSIONS
        );
    }

    let snapshot = session.set_resume_file(file).await?;
    Ok(Json(snapshot))
}

/// DELETE /api/v1/autoapply/sessions/:id/resume
pub async fn handle_clear_resume(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WorkflowSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    Ok(Json(session.clear_resume_file().await?))
}

/// POST /api/v1/autoapply/sessions/:id/analyze
///
/// Responds 202 with the Processing snapshot; poll GET for the outcome.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<WorkflowSnapshot>), AppError> {
    let session = find_session(&state, id).await?;
    let started = session.analyze().await?;
    Ok((StatusCode::ACCEPTED, Json(started.snapshot)))
}

/// DELETE /api/v1/autoapply/sessions/:id
pub async fn handle_close_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .sessions
        .remove(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))?;
    info!(session_id = %id, "Session closed");
    Ok(StatusCode::NO_CONTENT)
}
