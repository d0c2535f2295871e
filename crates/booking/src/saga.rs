//! Typed outcomes of the booking saga.
//!
//! The saga has one remote step (confirm) and one compensation (release).
//! Its terminal states:
//!
//! ```text
//! confirm outcome        booking     release   caller sees
//! ---------------------  ----------  --------  ------------------------
//! Reserved               CONFIRMED   no        the booking
//! Refused                CANCELLED   no        RoomUnavailable
//! Failed(Rejected)       CANCELLED   yes       RemoteRejected(reason)
//! Failed(Unavailable)    CANCELLED   yes       ServiceUnavailable
//! ```
//!
//! A refusal needs no release because the hotel tombstoned the attempt
//! itself. After a failure the remote effect is unknown, so the release is
//! always tried.

use common::{ConfirmAvailabilityResponse, ReservationId};

use crate::client::{FALLBACK_UNAVAILABLE_MESSAGE, HotelClientError};
use crate::error::BookingError;

pub const ROOM_UNAVAILABLE_REASON: &str = "Room is not available for the selected dates";
pub const SERVICE_UNAVAILABLE_REASON: &str = "Hotel service is temporarily unavailable";

/// What came back from the confirm step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The hotel holds a reservation for the booking.
    Reserved(Option<ReservationId>),
    /// The hotel refused the room for these dates.
    Refused(String),
    /// No usable answer; the hotel may or may not have reserved.
    Failed(HotelClientError),
}

impl ConfirmOutcome {
    /// Classifies the confirm call's result.
    ///
    /// The fallback client's "unavailable" answer means the hotel was never
    /// asked, so it is a failure rather than a refusal.
    pub fn from_result(result: Result<ConfirmAvailabilityResponse, HotelClientError>) -> Self {
        match result {
            Ok(response) if response.available => ConfirmOutcome::Reserved(response.reservation_id),
            Ok(response) if response.message == FALLBACK_UNAVAILABLE_MESSAGE => {
                ConfirmOutcome::Failed(HotelClientError::Unavailable(response.message))
            }
            Ok(response) => ConfirmOutcome::Refused(response.message),
            Err(e) => ConfirmOutcome::Failed(e),
        }
    }

    /// Returns true if the saga must run the release compensation.
    pub fn needs_compensation(&self) -> bool {
        matches!(self, ConfirmOutcome::Failed(_))
    }
}

/// Why the saga cancelled a booking, as recorded on the booking row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaFailure {
    RoomUnavailable,
    ServiceUnavailable,
    Rejected(String),
}

impl SagaFailure {
    /// The reason string stored in `failure_reason`.
    pub fn reason(&self) -> &str {
        match self {
            SagaFailure::RoomUnavailable => ROOM_UNAVAILABLE_REASON,
            SagaFailure::ServiceUnavailable => SERVICE_UNAVAILABLE_REASON,
            SagaFailure::Rejected(reason) => reason,
        }
    }

    /// Rebuilds the failure from a stored reason string.
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            ROOM_UNAVAILABLE_REASON => SagaFailure::RoomUnavailable,
            SERVICE_UNAVAILABLE_REASON => SagaFailure::ServiceUnavailable,
            other => SagaFailure::Rejected(other.to_string()),
        }
    }
}

impl From<HotelClientError> for SagaFailure {
    fn from(err: HotelClientError) -> Self {
        match err {
            HotelClientError::Unavailable(_) => SagaFailure::ServiceUnavailable,
            HotelClientError::Rejected(reason) => SagaFailure::Rejected(reason),
        }
    }
}

impl From<SagaFailure> for BookingError {
    fn from(failure: SagaFailure) -> Self {
        match failure {
            SagaFailure::RoomUnavailable => BookingError::RoomUnavailable,
            SagaFailure::ServiceUnavailable => BookingError::ServiceUnavailable,
            SagaFailure::Rejected(reason) => BookingError::RemoteRejected(reason),
        }
    }
}
