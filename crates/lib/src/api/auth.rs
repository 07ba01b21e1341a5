//! Login, logout and session checks for administrators and kids.

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_cookies::Cookies;

use super::{ADMIN_COOKIE, ApiError, AppState, KID_COOKIE, cleared_cookie, session_cookie};
use crate::session::{ADMIN_SESSION_TTL, KID_SESSION_TTL};

#[derive(Debug, Deserialize)]
pub(crate) struct AdminLoginBody {
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyBody {
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    kid_id: Option<i64>,
}

fn ok() -> Json<Value> {
    Json(json!({ "ok": true }))
}

fn cookie_token(cookies: &Cookies, name: &str) -> Option<String> {
    cookies.get(name).map(|cookie| cookie.value().to_string())
}

/// POST /api/auth/admin/login
pub(crate) async fn admin_login(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Result<Json<AdminLoginBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or(ApiError::InvalidPassword)?;

    let admin = state.admin.clone();
    tokio::task::spawn_blocking(move || admin.verify(password))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    let token = state.sessions.create_admin_session().await?;
    cookies.add(session_cookie(ADMIN_COOKIE, token, ADMIN_SESSION_TTL));
    Ok(ok())
}

/// POST /api/auth/admin/logout
pub(crate) async fn admin_logout(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<Value>, ApiError> {
    if let Some(token) = cookie_token(&cookies, ADMIN_COOKIE) {
        state.sessions.revoke_admin(&token).await?;
    }
    cookies.add(cleared_cookie(ADMIN_COOKIE));
    Ok(ok())
}

/// GET /api/auth/admin/check
pub(crate) async fn admin_check(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<Value>, ApiError> {
    let authenticated = match cookie_token(&cookies, ADMIN_COOKIE) {
        Some(token) => state.sessions.validate_admin(&token).await?.is_some(),
        None => false,
    };
    Ok(Json(json!({ "authenticated": authenticated })))
}

/// POST /api/auth/verify
///
/// Unlocks the learner app for one kid with any family password.
pub(crate) async fn kid_verify(
    State(state): State<AppState>,
    cookies: Cookies,
    body: Result<Json<VerifyBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = body?;
    let (Some(password), Some(kid_id)) = (body.password.filter(|p| !p.is_empty()), body.kid_id)
    else {
        return Err(ApiError::bad_request("password and kid_id required"));
    };

    let credential_id = state
        .credentials
        .verify_any(&password)
        .await?
        .ok_or(ApiError::InvalidPassword)?;

    // Unknown kids are only reported to callers holding a valid password.
    state.kids.require(kid_id).await?;

    let token = state
        .sessions
        .create_kid_session(kid_id, credential_id)
        .await?;
    state.credentials.record_use(credential_id).await?;
    cookies.add(session_cookie(KID_COOKIE, token, KID_SESSION_TTL));
    Ok(ok())
}

/// GET /api/auth/check
pub(crate) async fn kid_check(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<Value>, ApiError> {
    let Some(token) = cookie_token(&cookies, KID_COOKIE) else {
        return Ok(Json(json!({ "authenticated": false })));
    };
    let Some(session) = state.sessions.validate_kid(&token).await? else {
        return Ok(Json(json!({ "authenticated": false })));
    };

    match state.kids.get(session.kid_id).await? {
        Some(kid) => Ok(Json(json!({
            "authenticated": true,
            "kid": {
                "id": kid.id,
                "name": kid.name,
                "avatar": kid.avatar,
                "age": kid.age,
            },
        }))),
        None => Ok(Json(json!({ "authenticated": false }))),
    }
}

/// POST /api/auth/logout
pub(crate) async fn kid_logout(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<Json<Value>, ApiError> {
    if let Some(token) = cookie_token(&cookies, KID_COOKIE) {
        state.sessions.revoke_kid(&token).await?;
    }
    cookies.add(cleared_cookie(KID_COOKIE));
    Ok(ok())
}
