//! Administrator routes: family passwords and kid profiles.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{AdminAuth, ApiError, AppState};
use crate::kid::{KidUpdate, NewKid};

#[derive(Debug, Deserialize)]
pub(crate) struct CreatePasswordBody {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateKidBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    age: Option<i64>,
    #[serde(default)]
    avatar: Option<String>,
}

fn id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|_| ApiError::bad_request("Invalid id"))
}

/// GET /api/admin/passwords
pub(crate) async fn list_passwords(
    _: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let credentials = state.credentials.list().await?;
    Ok(Json(json!({ "data": credentials })))
}

/// POST /api/admin/passwords
pub(crate) async fn create_password(
    _: AdminAuth,
    State(state): State<AppState>,
    body: Result<Json<CreatePasswordBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body?;
    let (Some(label), Some(password)) = (
        body.label.filter(|l| !l.is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("label and password required"));
    };

    let credential = state.credentials.create(&label, &password).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": credential }))))
}

/// DELETE /api/admin/passwords/{id}
///
/// Kid sessions unlocked with the deleted password end with it.
pub(crate) async fn delete_password(
    _: AdminAuth,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = id(path)?;
    state.credentials.delete(id).await?;
    Ok(Json(json!({ "ok": true })))
}

/// GET /api/admin/kids
pub(crate) async fn list_kids(
    _: AdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let kids = state.kids.list().await?;
    Ok(Json(json!({ "data": kids })))
}

/// POST /api/admin/kids
pub(crate) async fn create_kid(
    _: AdminAuth,
    State(state): State<AppState>,
    body: Result<Json<CreateKidBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body?;
    let (Some(name), Some(age)) = (body.name.filter(|n| !n.is_empty()), body.age) else {
        return Err(ApiError::bad_request("name and age required"));
    };

    let kid = state
        .kids
        .create(NewKid {
            name,
            age,
            avatar: body.avatar,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": kid }))))
}

/// GET /api/admin/kids/{id}
pub(crate) async fn get_kid(
    _: AdminAuth,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let kid = state.kids.require(id(path)?).await?;
    Ok(Json(json!({ "data": kid })))
}

/// PUT /api/admin/kids/{id}
pub(crate) async fn update_kid(
    _: AdminAuth,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<KidUpdate>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let id = id(path)?;
    let Json(update) = body?;
    let kid = state.kids.update(id, update).await?;
    Ok(Json(json!({ "data": kid })))
}

/// DELETE /api/admin/kids/{id}
///
/// Removes the profile with its sessions and progress.
pub(crate) async fn delete_kid(
    _: AdminAuth,
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    state.kids.delete(id(path)?).await?;
    Ok(Json(json!({ "ok": true })))
}
