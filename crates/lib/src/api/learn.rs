//! Learner routes: the kid selector and per-kid progress.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{ApiError, AppState, KidAuth};
use crate::progress::{ProgressPatch, ProgressStatus};

/// Body of a progress write. `status` is parsed after decoding, so an unknown
/// value is reported as `Invalid status: <value>`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProgressBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    time_spent_seconds: Option<i64>,
    #[serde(default, alias = "answers_json")]
    answers_blob: Option<String>,
}

impl TryFrom<ProgressBody> for ProgressPatch {
    type Error = crate::Error;

    fn try_from(body: ProgressBody) -> crate::Result<Self> {
        let status = body
            .status
            .as_deref()
            .map(str::parse::<ProgressStatus>)
            .transpose()?;
        Ok(ProgressPatch {
            status,
            score: body.score,
            time_spent_seconds: body.time_spent_seconds,
            answers_blob: body.answers_blob,
        })
    }
}

fn lesson_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Invalid lesson id"))
}

/// GET /api/learn/kids
pub(crate) async fn list_kids(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let kids = state.kids.list().await?;
    Ok(Json(json!({ "data": kids })))
}

/// GET /api/learn/progress
pub(crate) async fn list_progress(
    KidAuth(session): KidAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let rows = state.progress.list(session.kid_id).await?;
    Ok(Json(json!({ "data": rows })))
}

/// GET /api/learn/progress/{lesson_id}
pub(crate) async fn get_progress(
    KidAuth(session): KidAuth,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let lesson_id = lesson_id(path)?;
    let row = state.progress.get(session.kid_id, lesson_id).await?;
    Ok(Json(json!({ "data": row })))
}

/// POST /api/learn/progress/{lesson_id}
pub(crate) async fn save_progress(
    KidAuth(session): KidAuth,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ProgressBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let lesson_id = lesson_id(path)?;
    let Json(body) = body?;
    let patch = ProgressPatch::try_from(body)?;

    state
        .progress
        .upsert(session.kid_id, lesson_id, &patch)
        .await?;
    Ok(Json(json!({ "ok": true })))
}
