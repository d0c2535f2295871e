use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{BookingId, RequestId};
use tokio::sync::RwLock;

use crate::booking::{Booking, NewBooking};
use crate::error::{BookingError, Result};
use crate::status::BookingStatus;
use crate::store::BookingStore;

#[derive(Debug, Default)]
struct BookingState {
    bookings: BTreeMap<BookingId, Booking>,
    next_id: i64,
}

/// In-memory booking store for tests and single-process deployments.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    state: Arc<RwLock<BookingState>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of bookings stored.
    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }

    /// Returns every booking still in PENDING.
    pub async fn pending(&self) -> Vec<Booking> {
        self.state
            .read()
            .await
            .bookings
            .values()
            .filter(|b| b.status == BookingStatus::Pending)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: NewBooking) -> Result<Booking> {
        let mut state = self.state.write().await;

        if state
            .bookings
            .values()
            .any(|b| b.request_id == booking.request_id)
        {
            return Err(BookingError::DuplicateRequest(booking.request_id));
        }

        state.next_id += 1;
        let now = Utc::now();
        let created = Booking {
            id: BookingId::new(state.next_id),
            username: booking.username,
            room_id: booking.room_id,
            dates: booking.dates,
            status: BookingStatus::Pending,
            request_id: booking.request_id,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn find_by_request_id(&self, request_id: RequestId) -> Result<Option<Booking>> {
        Ok(self
            .state
            .read()
            .await
            .bookings
            .values()
            .find(|b| b.request_id == request_id)
            .cloned())
    }

    async fn update(&self, booking: &Booking, expected: BookingStatus) -> Result<()> {
        let mut state = self.state.write().await;
        let stored = state
            .bookings
            .get_mut(&booking.id)
            .ok_or(BookingError::BookingNotFound(booking.id))?;
        if stored.status != expected {
            return Err(BookingError::StatusChanged {
                id: booking.id,
                expected,
            });
        }
        stored.status = booking.status;
        stored.failure_reason = booking.failure_reason.clone();
        stored.updated_at = booking.updated_at;
        Ok(())
    }

    async fn list_for_user(&self, username: &str) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.is_owned_by(username))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(bookings)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use common::{DateRange, RoomId};

    use super::*;

    fn new_booking(username: &str) -> NewBooking {
        NewBooking {
            username: username.to_string(),
            room_id: RoomId::new(1),
            dates: DateRange::new(
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            )
            .unwrap(),
            request_id: RequestId::new(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_pending() {
        let store = InMemoryBookingStore::new();
        let a = store.insert(new_booking("alice")).await.unwrap();
        let b = store.insert(new_booking("alice")).await.unwrap();
        assert_eq!(a.id, BookingId::new(1));
        assert_eq!(b.id, BookingId::new(2));
        assert_eq!(a.status, BookingStatus::Pending);
        assert_eq!(store.pending().await.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_request_id() {
        let store = InMemoryBookingStore::new();
        let booking = new_booking("alice");
        store.insert(booking.clone()).await.unwrap();

        let err = store.insert(booking).await.unwrap_err();
        assert!(matches!(err, BookingError::DuplicateRequest(_)));
        assert_eq!(store.booking_count().await, 1);
    }

    #[tokio::test]
    async fn test_update_and_lookup() {
        let store = InMemoryBookingStore::new();
        let mut booking = store.insert(new_booking("alice")).await.unwrap();
        booking.cancel(Some("refused".to_string())).unwrap();
        store
            .update(&booking, BookingStatus::Pending)
            .await
            .unwrap();

        let stored = store
            .find_by_request_id(booking.request_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(stored.failure_reason.as_deref(), Some("refused"));
    }

    #[tokio::test]
    async fn test_stale_update_is_refused() {
        let store = InMemoryBookingStore::new();
        let pending = store.insert(new_booking("alice")).await.unwrap();

        let mut cancelled = pending.clone();
        cancelled.cancel(None).unwrap();
        store
            .update(&cancelled, BookingStatus::Pending)
            .await
            .unwrap();

        let mut confirmed = pending;
        confirmed.confirm().unwrap();
        let err = store
            .update(&confirmed, BookingStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::StatusChanged {
                expected: BookingStatus::Pending,
                ..
            }
        ));

        let stored = store.get(cancelled.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_list_for_user_newest_first() {
        let store = InMemoryBookingStore::new();
        let first = store.insert(new_booking("alice")).await.unwrap();
        store.insert(new_booking("bob")).await.unwrap();
        let second = store.insert(new_booking("alice")).await.unwrap();

        let ids: Vec<_> = store
            .list_for_user("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
