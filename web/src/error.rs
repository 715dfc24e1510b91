//! Error type for web handlers.
//!
//! [`AppError`] bridges domain errors and HTTP responses. Every failure is
//! rendered as a `{code, message}` JSON body.

use accommodation_core::{AccommodationError, IdentityError, StoreError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Message returned when the caller could not be verified.
pub const UNAUTHENTICATED_MESSAGE: &str = "Authentication credentials were not provided.";

/// Application error type for web handlers.
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>, Path(id): Path<DormId>) -> Result<Json<Dorm>, AppError> {
///     Ok(Json(state.service.get_dorm(id).await?))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
    /// Internal error (logged, never exposed to the client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            source: None,
        }
    }

    /// Attach the underlying error.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 Bad Request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// 401 Unauthorized.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", UNAUTHENTICATED_MESSAGE)
    }

    /// 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR", message)
    }

    /// 503 Service Unavailable.
    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }

    /// HTTP status of this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Client-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        } else {
            tracing::debug!(status = %self.status, code = self.code, message = %self.message, "Request rejected");
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<AccommodationError> for AppError {
    fn from(err: AccommodationError) -> Self {
        let message = err.to_string();
        match err {
            AccommodationError::NotFound { .. } | AccommodationError::BedNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
            },
            AccommodationError::BedUnavailable { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "BED_UNAVAILABLE", message)
            },
            AccommodationError::Duplicate(_) => {
                Self::new(StatusCode::BAD_REQUEST, "DUPLICATE", message)
            },
            AccommodationError::Validation(_) => {
                Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
            },
            AccommodationError::NoSoftAllocations { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "NO_SOFT_ALLOCATIONS", message)
            },
            AccommodationError::Store(store) => store.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) | StoreError::UniqueViolation(_) => {
                Self::new(StatusCode::BAD_REQUEST, "PERSISTENCE_ERROR", err.to_string())
            },
            StoreError::Conflict(_) => Self::new(
                StatusCode::CONFLICT,
                "CONFLICT",
                "The request conflicted with a concurrent update, please retry",
            ),
            StoreError::Database(_) => {
                Self::internal("An internal error occurred").with_source(err.into())
            },
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotConfigured => Self::internal(err.to_string()),
            IdentityError::Unreachable(_) => {
                Self::unavailable("Identity service is unavailable").with_source(err.into())
            },
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}
