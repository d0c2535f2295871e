use async_trait::async_trait;
use common::{BookingId, DateRange, RequestId, ResourceGroupId, RoomId};

use crate::reservation::{ReservationRequest, RoomReservation};
use crate::room::{NewRoom, Room};
use crate::Result;

/// Result of applying a confirm attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The request ID was already recorded; nothing was written.
    Replayed(RoomReservation),
    /// The dates were taken; a RELEASED tombstone was written.
    Rejected(RoomReservation),
    /// A CONFIRMED reservation was written and the room's counter bumped.
    Confirmed {
        reservation: RoomReservation,
        room: Room,
    },
}

impl ConfirmOutcome {
    /// The row now recorded under the attempt's request ID.
    pub fn reservation(&self) -> &RoomReservation {
        match self {
            ConfirmOutcome::Replayed(r) | ConfirmOutcome::Rejected(r) => r,
            ConfirmOutcome::Confirmed { reservation, .. } => reservation,
        }
    }
}

/// Result of applying a release request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    NotFound,
    AlreadyReleased(RoomReservation),
    Released(RoomReservation),
}

/// Persistence for rooms and room reservations.
///
/// Implementations must make [`HotelStore::confirm`] atomic with respect to
/// every other confirm on the same room: the overlap check and the insert
/// happen under one exclusive per-room lock. Request IDs are unique across
/// all reservations.
#[async_trait]
pub trait HotelStore: Send + Sync {
    /// Registers a room. Room numbers are unique within a hotel.
    async fn insert_room(&self, room: NewRoom) -> Result<Room>;

    async fn get_room(&self, room_id: RoomId) -> Result<Option<Room>>;

    /// Flips the operational flag of a room.
    async fn set_room_available(&self, room_id: RoomId, available: bool) -> Result<Room>;

    async fn find_by_request_id(&self, request_id: RequestId) -> Result<Option<RoomReservation>>;

    async fn find_by_booking_id(&self, booking_id: BookingId) -> Result<Option<RoomReservation>>;

    /// All reservations of a room in any status, oldest first.
    async fn reservations_for_room(&self, room_id: RoomId) -> Result<Vec<RoomReservation>>;

    /// Applies a confirm attempt: replay, tombstone, or confirm.
    async fn confirm(&self, room_id: RoomId, request: ReservationRequest)
    -> Result<ConfirmOutcome>;

    /// Releases the reservation made for `booking_id`, if any.
    async fn release(&self, booking_id: BookingId) -> Result<ReleaseOutcome>;

    /// In-service rooms with no active reservation overlapping `dates`,
    /// optionally restricted to one hotel, least-booked first.
    async fn free_rooms(
        &self,
        hotel_id: Option<ResourceGroupId>,
        dates: DateRange,
    ) -> Result<Vec<Room>>;
}
