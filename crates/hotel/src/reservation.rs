//! Room reservations and their state machine.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::{BookingId, DateRange, RequestId, ReservationId, RoomId};
use serde::{Deserialize, Serialize};

use crate::error::HotelError;

/// The state of a room reservation.
///
/// State transitions:
/// ```text
/// PENDING ──► CONFIRMED ──► RELEASED
///    │                         ▲
///    └─────────────────────────┘
/// ```
///
/// A confirm attempt may also create a row directly in CONFIRMED or
/// RELEASED. RELEASED is terminal and rows are never deleted, so a released
/// row keeps answering replays of its request ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Released,
}

impl ReservationStatus {
    /// Returns true if the reservation still holds its dates.
    pub fn is_active(&self) -> bool {
        !matches!(self, ReservationStatus::Released)
    }

    /// Returns true if the reservation can be released.
    pub fn can_release(&self) -> bool {
        self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Released => "RELEASED",
        }
    }
}

impl std::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = HotelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReservationStatus::Pending),
            "CONFIRMED" => Ok(ReservationStatus::Confirmed),
            "RELEASED" => Ok(ReservationStatus::Released),
            other => Err(HotelError::CorruptRecord(format!(
                "unknown reservation status '{other}'"
            ))),
        }
    }
}

/// One room-side hold against a date range, keyed to a booking attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomReservation {
    pub id: ReservationId,
    pub room_id: RoomId,
    pub booking_id: BookingId,
    pub request_id: RequestId,
    pub dates: DateRange,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RoomReservation {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Returns true if this reservation holds any day of `dates`.
    pub fn blocks(&self, dates: &DateRange) -> bool {
        self.is_active() && self.dates.overlaps(dates)
    }
}

/// A validated confirm attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationRequest {
    pub request_id: RequestId,
    pub booking_id: BookingId,
    pub dates: DateRange,
}
