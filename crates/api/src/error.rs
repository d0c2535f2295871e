//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use booking::BookingError;
use hotel::HotelError;

/// API-level error type that maps to HTTP responses.
///
/// Every body is `{"error": "<reason>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// No requester identity on the request.
    Unauthorized(String),
    /// Hotel side error.
    Hotel(HotelError),
    /// Booking side error.
    Booking(BookingError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Hotel(err) => hotel_error_to_response(err),
            ApiError::Booking(err) => booking_error_to_response(err),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn hotel_error_to_response(err: HotelError) -> (StatusCode, String) {
    let status = match &err {
        HotelError::RoomNotFound(_) => StatusCode::NOT_FOUND,
        HotelError::RoomNotOperational(_) | HotelError::DuplicateRoomNumber { .. } => {
            StatusCode::CONFLICT
        }
        HotelError::InvalidDateRange(_) => StatusCode::BAD_REQUEST,
        HotelError::CorruptRecord(_) | HotelError::Database(_) | HotelError::Migration(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

fn booking_error_to_response(err: BookingError) -> (StatusCode, String) {
    let status = match &err {
        BookingError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        BookingError::BookingNotFound(_) => StatusCode::NOT_FOUND,
        BookingError::AccessDenied(_) => StatusCode::FORBIDDEN,
        BookingError::NoRoomAvailable
        | BookingError::RoomUnavailable
        | BookingError::RemoteRejected(_)
        | BookingError::AlreadyCancelled
        | BookingError::InvalidTransition { .. }
        | BookingError::StatusChanged { .. }
        | BookingError::DuplicateRequest(_) => StatusCode::CONFLICT,
        BookingError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        BookingError::CorruptRecord(_) | BookingError::Database(_) | BookingError::Migration(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

impl From<HotelError> for ApiError {
    fn from(err: HotelError) -> Self {
        ApiError::Hotel(err)
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        ApiError::Booking(err)
    }
}

#[cfg(test)]
mod tests {
    use common::{BookingId, RoomId};

    use super::*;

    fn status_of(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_booking_error_statuses() {
        assert_eq!(
            status_of(BookingError::InvalidRequest("bad".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BookingError::BookingNotFound(BookingId::new(1))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(BookingError::AccessDenied(BookingId::new(1))),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status_of(BookingError::RoomUnavailable), StatusCode::CONFLICT);
        assert_eq!(status_of(BookingError::AlreadyCancelled), StatusCode::CONFLICT);
        assert_eq!(
            status_of(BookingError::StatusChanged {
                id: BookingId::new(1),
                expected: booking::BookingStatus::Pending,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(BookingError::ServiceUnavailable),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(BookingError::Database(sqlx::Error::PoolTimedOut)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_hotel_error_statuses() {
        assert_eq!(
            status_of(HotelError::RoomNotFound(RoomId::new(9))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(HotelError::RoomNotOperational(RoomId::new(9))),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ApiError::Unauthorized("who".to_string())),
            StatusCode::UNAUTHORIZED
        );
    }
}
