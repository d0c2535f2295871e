//! Booking error types.

use common::{BookingId, RequestId};
use thiserror::Error;

use crate::status::BookingStatus;

/// Errors surfaced by the booking orchestrator.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The request was malformed; nothing was persisted.
    #[error("{0}")]
    InvalidRequest(String),

    /// Auto-select found no free room in the requested hotel.
    #[error("No available rooms found for the selected dates")]
    NoRoomAvailable,

    /// The hotel refused the room for these dates.
    #[error("Room is not available for the selected dates")]
    RoomUnavailable,

    /// The hotel service could not be reached or answered from its fallback.
    #[error("Hotel service is temporarily unavailable")]
    ServiceUnavailable,

    /// The hotel service answered with a structured rejection.
    #[error("{0}")]
    RemoteRejected(String),

    #[error("Booking not found with ID: {0}")]
    BookingNotFound(BookingId),

    #[error("Access denied to booking: {0}")]
    AccessDenied(BookingId),

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    /// A status change not permitted by the booking lifecycle.
    #[error("Invalid booking transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// The stored booking left `expected` before this update was written.
    #[error("Booking {id} is no longer {expected}")]
    StatusChanged {
        id: BookingId,
        expected: BookingStatus,
    },

    /// Another booking already holds this idempotency key.
    #[error("Duplicate request ID: {0}")]
    DuplicateRequest(RequestId),

    /// A stored row could not be turned back into a booking.
    #[error("Corrupt booking record: {0}")]
    CorruptRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Convenience type alias for booking results.
pub type Result<T> = std::result::Result<T, BookingError>;
