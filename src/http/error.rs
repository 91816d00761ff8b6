//! Centralized error responder.
//!
//! # Responsibilities
//! - Define the service-wide error type (`AppError`)
//! - Turn any propagated failure into exactly one HTTP response
//! - Decide how much detail reaches the client
//!
//! # Design Decisions
//! - `AppError` renders a terse body on its own and tags the response with an
//!   `ErrorReport`; the `respond_to_errors` layer re-renders tagged responses
//!   with the configured verbosity
//! - Untagged failures from outer tower layers are rendered from their status
//! - Responses marked `FinalResponse` (gate rejections) pass through as-is
//! - Status comes from the failure, falling back to 500
//! - Non-verbose mode never echoes 5xx messages, only the canonical reason

use std::any::Any;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::observability::metrics;

/// Failures that flow to the centralized responder.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// A failure that carries its own status code.
    #[error("{message}")]
    WithStatus { status: StatusCode, message: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        AppError::WithStatus {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::WithStatus { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// What the responder knows about a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub status: StatusCode,
    pub message: String,
    pub detail: String,
}

impl From<&AppError> for ErrorReport {
    fn from(err: &AppError) -> Self {
        Self {
            status: err.status(),
            message: err.to_string(),
            detail: format!("{err:?}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = ErrorReport::from(&self);
        let mut response = ErrorResponder::default().render(&report);
        response.extensions_mut().insert(report);
        response
    }
}

/// Renders error reports. Built once at startup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorResponder {
    verbose_errors: bool,
}

impl ErrorResponder {
    pub fn new(verbose_errors: bool) -> Self {
        Self { verbose_errors }
    }

    pub fn render(&self, report: &ErrorReport) -> Response {
        let message = if !self.verbose_errors && report.status.is_server_error() {
            report
                .status
                .canonical_reason()
                .unwrap_or("Internal Server Error")
                .to_string()
        } else {
            report.message.clone()
        };

        let mut body = json!({
            "status": report.status.as_u16(),
            "message": message,
        });
        if self.verbose_errors {
            body["detail"] = json!(report.detail);
        }

        (report.status, Json(body)).into_response()
    }
}

/// Marks an error response whose body is already final.
///
/// The responder leaves such responses untouched.
#[derive(Debug, Clone, Copy)]
pub struct FinalResponse;

/// Middleware rendering every failed response.
///
/// Tagged responses are re-rendered from their `ErrorReport`. Untagged 4xx/5xx
/// responses (body limit, timeout, static files) are rendered from their status.
pub async fn respond_to_errors(
    State(responder): State<ErrorResponder>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let report = match response.extensions().get::<ErrorReport>() {
        Some(report) => report.clone(),
        None if is_unrendered_failure(&response) => {
            let status = response.status();
            let reason = status.canonical_reason().unwrap_or("Request Failed");
            ErrorReport::from(&AppError::with_status(status, reason))
        }
        None => return response,
    };

    if report.status.is_server_error() {
        tracing::error!(method = %method, path = %path, status = %report.status, detail = %report.detail, "Request failed");
    } else {
        tracing::debug!(method = %method, path = %path, status = %report.status, "Request failed");
    }
    metrics::record_error_response(report.status.as_u16());

    let mut rendered = responder.render(&report);
    rendered.extensions_mut().insert(report);
    rendered
}

fn is_unrendered_failure(response: &Response) -> bool {
    let status = response.status();
    (status.is_client_error() || status.is_server_error())
        && response.extensions().get::<FinalResponse>().is_none()
}

/// Converts a handler panic into an internal error.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    AppError::internal(format!("handler panicked: {detail}")).into_response()
}
