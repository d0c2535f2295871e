//! The booking of record.

use chrono::{DateTime, Utc};
use common::{BookingId, DateRange, RequestId, RoomId};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::status::BookingStatus;

/// A booking owned by the booking service.
///
/// `room_id` is a correlation id into the hotel service, not an owned
/// reference. `failure_reason` is recorded when the saga cancels the
/// booking so that a replay of the same request ID reports the same
/// failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub username: String,
    pub room_id: RoomId,
    #[serde(flatten)]
    pub dates: DateRange,
    pub status: BookingStatus,
    pub request_id: RequestId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.username == username
    }

    /// Marks the booking confirmed after the hotel accepted it.
    pub fn confirm(&mut self) -> Result<()> {
        self.transition(BookingStatus::Confirmed)?;
        self.failure_reason = None;
        Ok(())
    }

    /// Cancels the booking.
    ///
    /// `reason` is set when the saga itself failed and left empty for a
    /// user cancellation.
    pub fn cancel(&mut self, reason: Option<String>) -> Result<()> {
        if self.status == BookingStatus::Cancelled {
            return Err(BookingError::AlreadyCancelled);
        }
        self.transition(BookingStatus::Cancelled)?;
        self.failure_reason = reason;
        Ok(())
    }

    fn transition(&mut self, next: BookingStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(BookingError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// A booking to be inserted in PENDING state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub username: String,
    pub room_id: RoomId,
    pub dates: DateRange,
    pub request_id: RequestId,
}
