//! Request extractors for authenticated routes.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_cookies::Cookies;

use super::{ADMIN_COOKIE, ApiError, AppState, KID_COOKIE};
use crate::session::{AdminSession, KidSession};

async fn cookie_value(
    parts: &mut Parts,
    state: &AppState,
    name: &str,
) -> Result<Option<String>, ApiError> {
    let cookies = Cookies::from_request_parts(parts, state)
        .await
        .map_err(|(_, message)| ApiError::Internal(message.to_string()))?;
    Ok(cookies.get(name).map(|cookie| cookie.value().to_string()))
}

/// A request carrying a valid administrator session cookie.
#[derive(Debug)]
pub struct AdminAuth(pub AdminSession);

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = cookie_value(parts, state, ADMIN_COOKIE).await?;
        let session = state.sessions.require_admin(token.as_deref()).await?;
        Ok(AdminAuth(session))
    }
}

/// A request carrying a valid kid session cookie.
#[derive(Debug)]
pub struct KidAuth(pub KidSession);

impl FromRequestParts<AppState> for KidAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let token = cookie_value(parts, state, KID_COOKIE).await?;
        let session = state.sessions.require_kid(token.as_deref()).await?;
        Ok(KidAuth(session))
    }
}
