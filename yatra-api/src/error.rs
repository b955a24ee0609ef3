use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use yatra_booking::BookingError;
use yatra_core::{CoreError, ValidationErrors};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(ValidationErrors),
    /// A request that is well-formed but breaks a booking or catalog rule
    RuleViolation(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Please correct the errors below.", "fields": errors }),
            ),
            AppError::RuleViolation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": msg })),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {:#}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal Server Error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::NotFound | BookingError::TravelOptionNotFound => AppError::NotFoundError(err.to_string()),
            BookingError::InvalidSeatCount(_) | BookingError::TooManySeats { .. } => {
                AppError::ValidationError(ValidationErrors::single("num_seats", err.to_string()))
            }
            BookingError::ReferenceExhausted => AppError::ConflictError(err.to_string()),
            BookingError::PriceOverflow => AppError::InternalServerError(err.to_string()),
            BookingError::InsufficientSeats { .. }
            | BookingError::Inactive
            | BookingError::Departed
            | BookingError::AlreadyCancelled
            | BookingError::InvalidStatus(_)
            | BookingError::CancellationWindowClosed { .. } => {
                tracing::warn!("Booking rejected: {}", err);
                AppError::RuleViolation(err.to_string())
            }
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(errors) => AppError::ValidationError(errors),
            CoreError::NotFound(what) => AppError::NotFoundError(format!("{} not found", what)),
            CoreError::Conflict(msg) => AppError::ConflictError(msg),
            CoreError::Booking(err) => err.into(),
            CoreError::Catalog(err) => AppError::RuleViolation(err.to_string()),
            CoreError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        AppError::ValidationError(errors)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Anyhow(err)
    }
}
