//! Error handling - RFC 7807 compliant responses.

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use cachet_core::domain::format_reset_time;
use cachet_shared::ErrorResponse;
use std::fmt;

/// Application-level error type that converts to RFC 7807 responses.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// A quota was exhausted; the client may retry after this many seconds.
    QuotaExceeded { reset_in_seconds: u64 },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::QuotaExceeded { reset_in_seconds } => {
                write!(f, "Quota exceeded, resets in {}s", reset_in_seconds)
            }
        }
    }
}

/// 429 body and headers shared by handlers and the rate limit middleware.
pub fn quota_exceeded_response(reset_in_seconds: u64, limit: Option<u32>) -> HttpResponse {
    let error = ErrorResponse::too_many_requests(
        reset_in_seconds,
        format!(
            "Rate limit exceeded. Try again in {}.",
            format_reset_time(reset_in_seconds as i64)
        ),
    );

    let mut builder = HttpResponse::TooManyRequests();
    builder
        .insert_header(("Retry-After", reset_in_seconds.to_string()))
        .insert_header(("X-RateLimit-Remaining", "0"));
    if let Some(limit) = limit {
        builder.insert_header(("X-RateLimit-Limit", limit.to_string()));
    }
    builder.json(error)
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::BadRequest(detail) => {
                HttpResponse::build(self.status_code()).json(ErrorResponse::bad_request(detail))
            }
            AppError::QuotaExceeded { reset_in_seconds } => {
                quota_exceeded_response(*reset_in_seconds, None)
            }
        }
    }
}

/// Result type alias for handlers.
pub type AppResult<T> = Result<T, AppError>;
