//! Uniform JSON response envelope and the HTTP error taxonomy

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

/// Message sent with every 500; causes are logged, never returned.
pub const INTERNAL_MESSAGE: &str = "Internal server error!";
pub const NOT_FOUND_MESSAGE: &str = "Resource not found!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Fail,
}

/// `{ status, message?, data? }`
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self { status: Status::Success, message: None, data: Some(data) }
    }

    /// Success with a message and no payload
    pub fn done(message: impl Into<String>) -> Self {
        Self { status: Status::Success, message: Some(message.into()), data: None }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self { status: Status::Fail, message: Some(message.into()), data: None }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Handler failure, one variant per response class
#[derive(Debug)]
pub enum ApiError {
    /// 404 with the given client message
    NotFound(String),
    /// 400, schema constraint violated or body malformed
    Validation(String),
    /// 400, required query input missing or malformed
    BadRequest(String),
    /// 409, uniqueness violated
    Conflict(String),
    /// 401
    Unauthorized(String),
    /// 500, detail is logged only
    Internal(String),
}

impl ApiError {
    pub fn not_found() -> Self {
        ApiError::NotFound(NOT_FOUND_MESSAGE.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text shown to the client
    pub fn message(&self) -> String {
        match self {
            ApiError::NotFound(message) | ApiError::BadRequest(message) => message.clone(),
            ApiError::Validation(detail) => format!("Bad request! {}", detail),
            ApiError::Conflict(detail) => format!("Conflict! {}", detail),
            ApiError::Unauthorized(detail) => format!("Unauthorized! {}", detail),
            ApiError::Internal(_) => INTERNAL_MESSAGE.to_string(),
        }
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        match err {
            crate::Error::NotFound(_) => ApiError::not_found(),
            crate::Error::Validation(detail) => ApiError::Validation(detail),
            crate::Error::BadRequest(detail) => ApiError::BadRequest(detail),
            crate::Error::Conflict(detail) => ApiError::Conflict(detail),
            crate::Error::Unauthorized(detail) => ApiError::Unauthorized(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::Internal(detail) => tracing::error!(%detail, "request failed"),
            other => tracing::debug!(status = status.as_u16(), error = ?other, "request rejected"),
        }
        (status, Json(Envelope::fail(self.message()))).into_response()
    }
}
