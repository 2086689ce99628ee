// crates/taskhive-server/src/response.rs
// ============================================================================
// Module: Response Envelope
// Description: Uniform JSON envelope and error mapping for REST handlers.
// Purpose: Translate engine results into HTTP status codes and bodies.
// Dependencies: axum, serde, taskhive-core
// ============================================================================

//! ## Overview
//! Every handler responds with the same envelope: `success`, an optional
//! `message`, and an optional `data` payload. Engine errors map onto one
//! status code per variant so clients can branch on status alone.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::WWW_AUTHENTICATE;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use taskhive_core::EngineError;

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Uniform JSON response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request succeeded.
    pub success: bool,
    /// Human-readable outcome message, set on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Response payload, set on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Wraps a payload in a `200 OK` envelope.
pub fn ok<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::OK, data)
}

/// Wraps a payload in a `201 Created` envelope.
pub fn created<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::CREATED, data)
}

/// Builds a success envelope with the given status.
fn envelope<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = ApiResponse {
        success: true,
        message: None,
        data: Some(data),
    };
    (status, Json(body)).into_response()
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// A handler failure carrying the status code it renders as.
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status the failure renders as.
    status: StatusCode,
    /// Message placed in the envelope.
    message: String,
}

impl ApiError {
    /// Missing or invalid bearer credentials.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "authentication required".to_string(),
        }
    }

    /// Failed login attempt; one message for every cause.
    #[must_use]
    pub fn invalid_credentials() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "invalid credentials".to_string(),
        }
    }

    /// Login refused because the tenant is suspended.
    #[must_use]
    pub fn tenant_suspended() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: "tenant account is suspended".to_string(),
        }
    }

    /// Request payload failed a server-side check.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Returns the status code the failure renders as.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        if let EngineError::Internal(detail) = &err {
            log_internal(detail);
            return Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "internal server error".to_string(),
            };
        }
        let status = match err {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
            EngineError::Conflict(_) => StatusCode::CONFLICT,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

/// Writes an internal failure detail to stderr; the response body never
/// carries storage error text.
fn log_internal(detail: &str) {
    use std::io::Write;

    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "taskhive-server: internal error: {detail}");
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            message: Some(self.message),
            data: None,
        };
        let mut response = (self.status, Json(body)).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
