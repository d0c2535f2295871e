use async_trait::async_trait;
use chrono::NaiveDate;
use common::{
    ConfirmAvailabilityRequest, ConfirmAvailabilityResponse, ReleaseReservationRequest,
    ResourceGroupId, RoomId, RoomView,
};

use super::{HotelClient, HotelClientError};

pub const FALLBACK_UNAVAILABLE_MESSAGE: &str =
    "Hotel service is temporarily unavailable. Please try again later.";

/// Fail-safe answers used while the hotel service is unreachable.
///
/// Every answer steers the saga towards cancellation: confirm reports the
/// room unavailable, release does nothing, recommend finds no rooms.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackHotelClient;

impl FallbackHotelClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HotelClient for FallbackHotelClient {
    async fn confirm_availability(
        &self,
        room_id: RoomId,
        request: ConfirmAvailabilityRequest,
    ) -> Result<ConfirmAvailabilityResponse, HotelClientError> {
        tracing::error!(
            %room_id,
            booking_id = %request.booking_id,
            "hotel service unavailable, refusing confirm"
        );
        Ok(ConfirmAvailabilityResponse::unavailable(
            FALLBACK_UNAVAILABLE_MESSAGE,
            None,
        ))
    }

    async fn release_reservation(
        &self,
        room_id: RoomId,
        request: ReleaseReservationRequest,
    ) -> Result<(), HotelClientError> {
        tracing::error!(
            %room_id,
            booking_id = %request.booking_id,
            "hotel service unavailable, skipping release"
        );
        Ok(())
    }

    async fn recommend_rooms(
        &self,
        hotel_id: ResourceGroupId,
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<Vec<RoomView>, HotelClientError> {
        tracing::error!(%hotel_id, "hotel service unavailable, no recommendations");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use common::{BookingId, RequestId};

    use super::*;

    #[tokio::test]
    async fn test_fallback_answers() {
        let client = FallbackHotelClient::new();
        let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();

        let response = client
            .confirm_availability(
                RoomId::new(1),
                ConfirmAvailabilityRequest {
                    request_id: RequestId::new(),
                    booking_id: BookingId::new(1),
                    start_date: start,
                    end_date: end,
                },
            )
            .await
            .unwrap();
        assert!(!response.available);
        assert_eq!(response.message, FALLBACK_UNAVAILABLE_MESSAGE);
        assert!(response.reservation_id.is_none());

        client
            .release_reservation(
                RoomId::new(1),
                ReleaseReservationRequest {
                    request_id: RequestId::new(),
                    booking_id: BookingId::new(1),
                },
            )
            .await
            .unwrap();

        let rooms = client
            .recommend_rooms(ResourceGroupId::new(1), start, end)
            .await
            .unwrap();
        assert!(rooms.is_empty());
    }
}
