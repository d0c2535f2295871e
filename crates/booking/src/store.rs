use async_trait::async_trait;
use common::{BookingId, RequestId};

use crate::booking::{Booking, NewBooking};
use crate::error::Result;
use crate::status::BookingStatus;

/// Persistence for bookings.
///
/// Request IDs are unique: inserting a second booking under a known key
/// fails with [`crate::BookingError::DuplicateRequest`].
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a PENDING booking and assigns its id.
    async fn insert(&self, booking: NewBooking) -> Result<Booking>;

    async fn get(&self, id: BookingId) -> Result<Option<Booking>>;

    async fn find_by_request_id(&self, request_id: RequestId) -> Result<Option<Booking>>;

    /// Persists the status, failure reason and update time of `booking`,
    /// provided the stored status is still `expected`.
    ///
    /// Fails with [`crate::BookingError::StatusChanged`] when another writer
    /// moved the booking first; nothing is written in that case.
    async fn update(&self, booking: &Booking, expected: BookingStatus) -> Result<()>;

    /// Bookings of one user, newest first.
    async fn list_for_user(&self, username: &str) -> Result<Vec<Booking>>;
}
