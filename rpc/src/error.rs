//! RPC error types and their HTTP mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use presence_verification::VerificationError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("server error: {0}")]
    Server(String),
}

/// Stable, machine-readable error codes returned in every error body and in
/// the `x-error-code` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthenticationRequired,
    VenueNotFound,
    VenueNotOpen,
    MalformedCode,
    StorageUnavailable,
    ValidationFailed,
    InvalidRequest,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            Self::VenueNotFound => "VENUE_NOT_FOUND",
            Self::VenueNotOpen => "VENUE_NOT_OPEN",
            Self::MalformedCode => "MALFORMED_CODE",
            Self::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::VenueNotFound => StatusCode::NOT_FOUND,
            Self::VenueNotOpen => StatusCode::CONFLICT,
            Self::MalformedCode | Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::ValidationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    /// Whether the same request may succeed if retried later.
    pub retryable: bool,
}

impl RpcError {
    pub fn code(&self) -> ErrorCode {
        match self {
            RpcError::Verification(e) => match e {
                VerificationError::AuthenticationRequired => ErrorCode::AuthenticationRequired,
                VerificationError::VenueNotFound(_) => ErrorCode::VenueNotFound,
                VerificationError::VenueNotOpen { .. } => ErrorCode::VenueNotOpen,
                VerificationError::MalformedCode(_) => ErrorCode::MalformedCode,
                VerificationError::StorageUnavailable(_) => ErrorCode::StorageUnavailable,
                VerificationError::ValidationFailed(_) => ErrorCode::ValidationFailed,
            },
            RpcError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            RpcError::Config(_) | RpcError::Metrics(_) | RpcError::Server(_) => {
                ErrorCode::InternalError
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Verification(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let code = self.code();
        // Storage and internal details stay in the logs.
        let message = match code {
            ErrorCode::StorageUnavailable => "storage is temporarily unavailable".to_string(),
            ErrorCode::InternalError => "internal error".to_string(),
            _ => self.to_string(),
        };
        ErrorBody {
            error: ErrorDetails {
                code,
                message,
                retryable: self.is_retryable(),
            },
        }
    }
}

/// Bodies that fail to parse get the same error shape as everything else.
impl From<JsonRejection> for RpcError {
    fn from(rejection: JsonRejection) -> Self {
        RpcError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let code = self.code();
        if matches!(code, ErrorCode::StorageUnavailable | ErrorCode::InternalError) {
            tracing::warn!(error = %self, %code, "request failed");
        } else {
            tracing::debug!(error = %self, %code, "request rejected");
        }
        let mut response = (code.http_status(), Json(self.body())).into_response();
        response.headers_mut().insert(
            HeaderName::from_static("x-error-code"),
            HeaderValue::from_static(code.as_str()),
        );
        response
    }
}
