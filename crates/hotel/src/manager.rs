//! Reservation manager: the hotel half of the booking saga.

use common::{
    ConfirmAvailabilityRequest, ConfirmAvailabilityResponse, DateRange,
    ReleaseReservationRequest, RoomId,
};

use crate::error::{HotelError, Result};
use crate::reservation::{ReservationRequest, RoomReservation};
use crate::room::{NewRoom, Room};
use crate::store::{ConfirmOutcome, HotelStore, ReleaseOutcome};

pub const RESERVED_MESSAGE: &str = "Room reserved successfully";
pub const UNAVAILABLE_MESSAGE: &str = "Room is not available for the selected dates";

/// The answer a confirm call gives for the row recorded under its key.
///
/// The response depends only on the recorded row, so replaying a request ID
/// reproduces the original answer exactly.
pub fn response_for(reservation: &RoomReservation) -> ConfirmAvailabilityResponse {
    if reservation.is_active() {
        ConfirmAvailabilityResponse::available(RESERVED_MESSAGE, reservation.id)
    } else {
        ConfirmAvailabilityResponse::unavailable(UNAVAILABLE_MESSAGE, None)
    }
}

/// Owns rooms and reservations and runs the idempotent confirm/release
/// protocol.
///
/// A confirm call takes one of three branches:
/// 1. the request ID is known: replay the recorded answer, no writes
/// 2. the dates overlap an active reservation: write a RELEASED tombstone
///    and answer "not available"
/// 3. otherwise: write a CONFIRMED reservation, bump `times_booked`
pub struct ReservationManager<S: HotelStore> {
    store: S,
}

impl<S: HotelStore> ReservationManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reserves `room_id` for the requested dates, idempotently per
    /// request ID.
    #[tracing::instrument(
        skip(self, request),
        fields(booking_id = %request.booking_id, request_id = %request.request_id)
    )]
    pub async fn confirm_availability(
        &self,
        room_id: RoomId,
        request: ConfirmAvailabilityRequest,
    ) -> Result<ConfirmAvailabilityResponse> {
        metrics::counter!("reservation_confirm_total").increment(1);

        let dates = DateRange::new(request.start_date, request.end_date)?;
        let attempt = ReservationRequest {
            request_id: request.request_id,
            booking_id: request.booking_id,
            dates,
        };

        let outcome = self.store.confirm(room_id, attempt).await.inspect_err(|e| {
            tracing::warn!(error = %e, "confirm rejected");
        })?;

        match &outcome {
            ConfirmOutcome::Replayed(reservation) => {
                metrics::counter!("reservation_replayed").increment(1);
                tracing::info!(
                    reservation_id = %reservation.id,
                    status = %reservation.status,
                    "duplicate request, replaying recorded outcome"
                );
            }
            ConfirmOutcome::Rejected(tombstone) => {
                metrics::counter!("reservation_tombstoned").increment(1);
                tracing::warn!(
                    reservation_id = %tombstone.id,
                    %dates,
                    "room already booked for requested dates"
                );
            }
            ConfirmOutcome::Confirmed { reservation, room } => {
                metrics::counter!("reservation_confirmed").increment(1);
                tracing::info!(
                    reservation_id = %reservation.id,
                    times_booked = room.times_booked,
                    "reservation confirmed"
                );
            }
        }

        Ok(response_for(outcome.reservation()))
    }

    /// Releases whatever was reserved for the request's booking.
    ///
    /// Releasing something never reserved, or already released, is a no-op.
    /// `times_booked` is left untouched.
    #[tracing::instrument(
        skip(self, request),
        fields(booking_id = %request.booking_id, request_id = %request.request_id)
    )]
    pub async fn release_reservation(
        &self,
        room_id: RoomId,
        request: ReleaseReservationRequest,
    ) -> Result<ReleaseOutcome> {
        let outcome = self.store.release(request.booking_id).await?;

        match &outcome {
            ReleaseOutcome::NotFound => {
                tracing::warn!("no reservation found for booking");
            }
            ReleaseOutcome::AlreadyReleased(reservation) => {
                tracing::info!(reservation_id = %reservation.id, "reservation already released");
            }
            ReleaseOutcome::Released(reservation) => {
                metrics::counter!("reservation_released").increment(1);
                if reservation.room_id != room_id {
                    tracing::warn!(
                        reserved_room = %reservation.room_id,
                        "release addressed to a different room than the reservation"
                    );
                }
                tracing::info!(reservation_id = %reservation.id, "reservation released");
            }
        }

        Ok(outcome)
    }

    /// Registers a new room.
    #[tracing::instrument(skip(self))]
    pub async fn register_room(&self, room: NewRoom) -> Result<Room> {
        let room = self.store.insert_room(room).await?;
        tracing::info!(room_id = %room.id, hotel_id = %room.hotel_id, "room registered");
        Ok(room)
    }

    pub async fn get_room(&self, room_id: RoomId) -> Result<Room> {
        self.store
            .get_room(room_id)
            .await?
            .ok_or(HotelError::RoomNotFound(room_id))
    }

    /// Takes a room in or out of service.
    #[tracing::instrument(skip(self))]
    pub async fn set_room_operational(&self, room_id: RoomId, available: bool) -> Result<Room> {
        self.store.set_room_available(room_id, available).await
    }
}
