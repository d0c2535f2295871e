use chrono::NaiveDate;
use common::{DateRange, ResourceGroupId, RoomView};

use crate::error::Result;
use crate::store::HotelStore;

/// Read-only room queries used to pick a room before booking.
///
/// Answers are advisory: a room recommended here can still be refused by
/// the subsequent confirm if another booking wins the race.
pub struct AvailabilityAdvisor<S: HotelStore> {
    store: S,
}

impl<S: HotelStore> AvailabilityAdvisor<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Free rooms of one hotel for the dates, least-booked first.
    #[tracing::instrument(skip(self))]
    pub async fn recommend_rooms(
        &self,
        hotel_id: ResourceGroupId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RoomView>> {
        let dates = DateRange::new(start_date, end_date)?;
        let rooms = self.store.free_rooms(Some(hotel_id), dates).await?;
        tracing::debug!(count = rooms.len(), "recommended rooms");
        Ok(rooms.iter().map(|room| room.to_view()).collect())
    }

    /// Free rooms across all hotels for the dates, least-booked first.
    #[tracing::instrument(skip(self))]
    pub async fn available_rooms(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RoomView>> {
        let dates = DateRange::new(start_date, end_date)?;
        let rooms = self.store.free_rooms(None, dates).await?;
        Ok(rooms.iter().map(|room| room.to_view()).collect())
    }
}

#[cfg(test)]
mod tests {
    use common::{BookingId, RequestId};

    use super::*;
    use crate::memory::InMemoryHotelStore;
    use crate::reservation::ReservationRequest;
    use crate::room::NewRoom;
    use crate::HotelError;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    #[tokio::test]
    async fn test_recommend_orders_least_booked_first() {
        let store = InMemoryHotelStore::new();
        let hotel = ResourceGroupId::new(1);
        for (number, times_booked) in [("101", 5), ("102", 2), ("103", 5)] {
            store
                .insert_room(NewRoom::new(hotel, number).with_times_booked(times_booked))
                .await
                .unwrap();
        }

        let advisor = AvailabilityAdvisor::new(store);
        let rooms = advisor.recommend_rooms(hotel, day(10), day(12)).await.unwrap();

        let ids: Vec<i64> = rooms.iter().map(|r| r.id.as_i64()).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn test_recommend_skips_booked_rooms() {
        let store = InMemoryHotelStore::new();
        let hotel = ResourceGroupId::new(1);
        let taken = store.insert_room(NewRoom::new(hotel, "101")).await.unwrap();
        let free = store.insert_room(NewRoom::new(hotel, "102")).await.unwrap();
        store
            .confirm(
                taken.id,
                ReservationRequest {
                    request_id: RequestId::new(),
                    booking_id: BookingId::new(1),
                    dates: DateRange::new(day(5), day(7)).unwrap(),
                },
            )
            .await
            .unwrap();

        let advisor = AvailabilityAdvisor::new(store);
        let rooms = advisor.recommend_rooms(hotel, day(6), day(8)).await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, free.id);

        let all = advisor.available_rooms(day(8), day(9)).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_hotel_is_empty() {
        let advisor = AvailabilityAdvisor::new(InMemoryHotelStore::new());
        let rooms = advisor
            .recommend_rooms(ResourceGroupId::new(42), day(1), day(3))
            .await
            .unwrap();
        assert!(rooms.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_dates() {
        let advisor = AvailabilityAdvisor::new(InMemoryHotelStore::new());
        let err = advisor
            .recommend_rooms(ResourceGroupId::new(1), day(3), day(3))
            .await
            .unwrap_err();
        assert!(matches!(err, HotelError::InvalidDateRange(_)));
    }
}
