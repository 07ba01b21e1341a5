//! HTTP error responses
//!
//! Every failure is rendered as `{"error": message}` with a status code chosen
//! from the library error's classification.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::{Error, credential::CredentialError, session::SessionError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// Missing, unknown, expired or revoked session. Always the same body.
    #[error("Unauthorized")]
    Unauthorized,

    /// Login attempt that matched no password
    #[error("Invalid password")]
    InvalidPassword,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::InvalidPassword => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match &err {
            Error::Session(SessionError::Unauthorized) => ApiError::Unauthorized,
            Error::Credential(CredentialError::InvalidPassword) => ApiError::InvalidPassword,
            e if e.is_not_found() => ApiError::NotFound(e.to_string()),
            e if e.is_validation_error() => ApiError::BadRequest(e.to_string()),
            e => {
                tracing::error!(module = e.module(), error = %e, "Request failed");
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "Rejected request body");
        ApiError::bad_request("Invalid JSON")
    }
}
