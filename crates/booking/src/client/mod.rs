//! Clients for the hotel service.
//!
//! The orchestrator talks to the hotel through [`HotelClient`]. Live calls
//! go over HTTP; [`CircuitBreakerHotelClient`] routes to the fail-safe
//! [`FallbackHotelClient`] while the hotel is unreachable.

pub mod circuit;
pub mod fallback;
pub mod http;
pub mod in_process;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{
    ConfirmAvailabilityRequest, ConfirmAvailabilityResponse, ReleaseReservationRequest,
    ResourceGroupId, RoomId, RoomView,
};
use thiserror::Error;

pub use circuit::{CircuitBreakerConfig, CircuitBreakerHotelClient};
pub use fallback::{FALLBACK_UNAVAILABLE_MESSAGE, FallbackHotelClient};
pub use http::{HttpClientConfig, HttpHotelClient};
pub use in_process::InProcessHotelClient;

pub const ROOM_NOT_FOUND_MESSAGE: &str = "Room not found or not available";
pub const ROOM_ALREADY_BOOKED_MESSAGE: &str = "Room is already booked for the specified dates";
pub const SERVICE_UNAVAILABLE_MESSAGE: &str = "Hotel service is temporarily unavailable";
pub const COMMUNICATION_ERROR_MESSAGE: &str = "Error communicating with hotel service";

/// Failure of a call to the hotel service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HotelClientError {
    /// The hotel answered with a structured rejection.
    #[error("{0}")]
    Rejected(String),

    /// No usable answer: connect failure, timeout, 5xx or an undecodable body.
    /// The remote effect of the call is unknown.
    #[error("{0}")]
    Unavailable(String),
}

impl HotelClientError {
    /// Maps a non-success HTTP status to a client error.
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => HotelClientError::Rejected(ROOM_NOT_FOUND_MESSAGE.to_string()),
            409 => HotelClientError::Rejected(ROOM_ALREADY_BOOKED_MESSAGE.to_string()),
            503 => HotelClientError::Unavailable(SERVICE_UNAVAILABLE_MESSAGE.to_string()),
            500..=599 => HotelClientError::Unavailable(COMMUNICATION_ERROR_MESSAGE.to_string()),
            _ => HotelClientError::Rejected(COMMUNICATION_ERROR_MESSAGE.to_string()),
        }
    }

    /// Returns true if the hotel may or may not have applied the call.
    pub fn is_transport(&self) -> bool {
        matches!(self, HotelClientError::Unavailable(_))
    }
}

/// The operations the booking side needs from the hotel service.
#[async_trait]
pub trait HotelClient: Send + Sync {
    /// Asks the hotel to reserve `room_id`. Idempotent per request ID.
    async fn confirm_availability(
        &self,
        room_id: RoomId,
        request: ConfirmAvailabilityRequest,
    ) -> Result<ConfirmAvailabilityResponse, HotelClientError>;

    /// Releases whatever the hotel holds for the request's booking.
    async fn release_reservation(
        &self,
        room_id: RoomId,
        request: ReleaseReservationRequest,
    ) -> Result<(), HotelClientError>;

    /// Free rooms of a hotel, least-booked first.
    async fn recommend_rooms(
        &self,
        hotel_id: ResourceGroupId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RoomView>, HotelClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            HotelClientError::from_status(404),
            HotelClientError::Rejected(ROOM_NOT_FOUND_MESSAGE.to_string())
        );
        assert_eq!(
            HotelClientError::from_status(409),
            HotelClientError::Rejected(ROOM_ALREADY_BOOKED_MESSAGE.to_string())
        );
        assert_eq!(
            HotelClientError::from_status(503),
            HotelClientError::Unavailable(SERVICE_UNAVAILABLE_MESSAGE.to_string())
        );
        assert!(HotelClientError::from_status(500).is_transport());
        assert!(!HotelClientError::from_status(400).is_transport());
    }
}
