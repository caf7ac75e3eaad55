use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::upstream::ApiError;
use crate::versioning::compare::SelectionError;
use crate::versioning::diff::MissingText;
use crate::versioning::marketplace::TransitionError;
use crate::workspace::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Selection error: {0}")]
    Selection(#[from] SelectionError),

    #[error("Operation already in progress: {0}")]
    InProgress(String),

    #[error("Cooling down for {0:?}")]
    Cooldown(Duration),

    #[error("Illegal transition: {0}")]
    Transition(#[from] TransitionError),

    /// An upstream call failed. `action` is the fallback message shown when the
    /// upstream did not explain itself, e.g. "Failed to delete version".
    #[error("{action}: {source}")]
    Upstream {
        action: &'static str,
        #[source]
        source: ApiError,
    },

    #[error("Selection store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn upstream(action: &'static str) -> impl FnOnce(ApiError) -> AppError {
        move |source| AppError::Upstream { action, source }
    }
}

impl From<MissingText> for AppError {
    fn from(e: MissingText) -> Self {
        AppError::Validation(e.to_string())
    }
}

fn upstream_response(action: &str, source: &ApiError) -> (StatusCode, &'static str, String) {
    match source {
        ApiError::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Your session has expired, please sign in again".to_string(),
        ),
        ApiError::Forbidden => (
            StatusCode::FORBIDDEN,
            "FORBIDDEN",
            "Permission denied".to_string(),
        ),
        ApiError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Not found, it may already have been deleted".to_string(),
        ),
        ApiError::Throttled { .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            "TOO_MANY_REQUESTS",
            "Too many requests, please wait before retrying".to_string(),
        ),
        ApiError::Server { .. } => {
            tracing::error!("{action}: {source}");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_SERVER_ERROR",
                "Server error, check the server logs".to_string(),
            )
        }
        ApiError::Status { status, .. } => (
            StatusCode::from_u16(*status)
                .ok()
                .filter(StatusCode::is_client_error)
                .unwrap_or(StatusCode::BAD_GATEWAY),
            "UPSTREAM_ERROR",
            source.server_message().unwrap_or(action).to_string(),
        ),
        ApiError::Transport(_) | ApiError::Decode(_) | ApiError::InvalidUrl(_) => {
            tracing::error!("{action}: {source}");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_UNAVAILABLE",
                action.to_string(),
            )
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Selection(e @ SelectionError::Full) => {
                (StatusCode::CONFLICT, "SELECTION_FULL", e.to_string())
            }
            AppError::Selection(e @ SelectionError::Incomplete) => (
                StatusCode::BAD_REQUEST,
                "SELECTION_INCOMPLETE",
                e.to_string(),
            ),
            AppError::InProgress(msg) => (
                StatusCode::CONFLICT,
                "IN_PROGRESS",
                format!("{msg} is already in progress"),
            ),
            AppError::Cooldown(wait) => (
                StatusCode::TOO_MANY_REQUESTS,
                "COOLDOWN",
                format!(
                    "Please wait {:.1}s before retrying",
                    wait.as_secs_f64()
                ),
            ),
            AppError::Transition(e) => (
                StatusCode::CONFLICT,
                "ILLEGAL_TRANSITION",
                e.to_string(),
            ),
            AppError::Upstream { action, source } => upstream_response(action, source),
            AppError::Store(e) => {
                tracing::error!("Selection store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Could not persist the workspace selection".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
