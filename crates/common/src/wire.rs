//! Request and response bodies exchanged between the booking and hotel services.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{BookingId, RequestId, ReservationId, ResourceGroupId, RoomId};

/// Body of `POST /api/rooms/{roomId}/confirm-availability`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAvailabilityRequest {
    pub request_id: RequestId,
    pub booking_id: BookingId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Answer to a confirm call.
///
/// `available == false` with no reservation id means the room was refused
/// for these dates; the hotel side has already tombstoned the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmAvailabilityResponse {
    pub available: bool,
    pub message: String,
    pub reservation_id: Option<ReservationId>,
}

impl ConfirmAvailabilityResponse {
    pub fn available(message: impl Into<String>, reservation_id: ReservationId) -> Self {
        Self {
            available: true,
            message: message.into(),
            reservation_id: Some(reservation_id),
        }
    }

    pub fn unavailable(message: impl Into<String>, reservation_id: Option<ReservationId>) -> Self {
        Self {
            available: false,
            message: message.into(),
            reservation_id,
        }
    }
}

/// Body of `POST /api/rooms/{roomId}/release`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseReservationRequest {
    pub request_id: RequestId,
    pub booking_id: BookingId,
}

/// Query string of `GET /api/rooms/recommend`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendQuery {
    pub hotel_id: ResourceGroupId,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// A room as seen by callers of the hotel service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: RoomId,
    pub hotel_id: ResourceGroupId,
    pub number: String,
    pub available: bool,
    pub times_booked: i64,
}
