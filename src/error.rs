//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the single error type handlers return.
//! Domain errors from the auth, validation and store layers convert into it
//! with `?`, and its `actix_web::error::ResponseError` implementation performs
//! the one and only kind-to-status mapping of the API.
//!
//! Every error body is JSON with a human-readable `detail` and a stable
//! `error_code`. Store faults are logged in full here and reach the client only
//! as an opaque "Internal server error".

use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::models::ValidationError;
use crate::service::TaskError;
use crate::store::StoreError;

/// Represents all errors a request can end in.
#[derive(Debug, Error)]
pub enum AppError {
    /// The credential was missing, malformed, mis-signed or expired (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(AuthError),
    /// A field failed validation (HTTP 400).
    #[error("Validation Error: {0}")]
    Validation(#[from] ValidationError),
    /// The request could not be understood, e.g. a body that is not valid JSON (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// The resource does not exist for this caller (HTTP 404).
    ///
    /// Used both for missing tasks and for tasks owned by someone else.
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Anything the client cannot fix (HTTP 500). The message is logged, never sent.
    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn task_not_found() -> Self {
        AppError::NotFound("Task not found".into())
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "TASK_NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let code = self.error_code();
        match self {
            AppError::Unauthorized(reason) => HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, "Bearer"))
                .json(json!({ "detail": reason.to_string(), "error_code": code })),
            AppError::Validation(err) => HttpResponse::BadRequest().json(json!({
                "detail": err.to_string(),
                "error_code": code,
                "field_errors": { err.field(): [err.to_string()] }
            })),
            AppError::BadRequest(msg) => {
                HttpResponse::BadRequest().json(json!({ "detail": msg, "error_code": code }))
            }
            AppError::NotFound(msg) => {
                HttpResponse::NotFound().json(json!({ "detail": msg, "error_code": code }))
            }
            AppError::Internal(msg) => {
                log::error!("Internal error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "detail": "Internal server error",
                    "error_code": code
                }))
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        AppError::Unauthorized(error)
    }
}

/// Converts store outcomes into responses.
///
/// `NotFound` covers both a missing row and a row owned by another user;
/// every other store failure becomes an opaque 500.
impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::NotFound => AppError::task_not_found(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<TaskError> for AppError {
    fn from(error: TaskError) -> AppError {
        match error {
            TaskError::Validation(err) => AppError::Validation(err),
            TaskError::Store(err) => err.into(),
        }
    }
}
