//! Booking orchestrator: drives the booking saga.

use std::time::Instant;

use chrono::{NaiveDate, Utc};
use common::{
    BookingId, ConfirmAvailabilityRequest, DateRange, ReleaseReservationRequest, RequestId,
    ResourceGroupId, RoomId,
};

use crate::booking::{Booking, NewBooking};
use crate::client::HotelClient;
use crate::error::{BookingError, Result};
use crate::saga::{ConfirmOutcome, SagaFailure};
use crate::status::BookingStatus;
use crate::store::BookingStore;

/// Command to book a room.
///
/// `request_id` is the idempotency key of the whole attempt. It is chosen
/// once, at the client boundary, and reused by every retry of the same
/// logical request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateBooking {
    pub request_id: RequestId,
    pub room_id: Option<RoomId>,
    pub hotel_id: Option<ResourceGroupId>,
    pub auto_select: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl CreateBooking {
    /// Books a specific room.
    pub fn for_room(room_id: RoomId, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            room_id: Some(room_id),
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Self::default()
        }
    }

    /// Books the least-booked free room of a hotel.
    pub fn auto_select(
        hotel_id: ResourceGroupId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            hotel_id: Some(hotel_id),
            auto_select: true,
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Self::default()
        }
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }
}

fn utc_today() -> NaiveDate {
    Utc::now().date_naive()
}

/// What a resolved booking means to the caller: a saga cancellation
/// repeats its error, anything else is returned as stored.
fn recorded_outcome(booking: Booking) -> Result<Booking> {
    match (booking.status, booking.failure_reason.as_deref()) {
        (BookingStatus::Cancelled, Some(reason)) => Err(SagaFailure::from_reason(reason).into()),
        _ => Ok(booking),
    }
}

/// Owns bookings and runs the booking saga against the hotel service.
///
/// The saga persists the booking PENDING, asks the hotel to confirm, and
/// resolves the booking to CONFIRMED or CANCELLED before returning. When
/// the confirm call fails without a usable answer, a release is sent as
/// compensation; its failure is logged and never changes the outcome.
pub struct BookingOrchestrator<S, H>
where
    S: BookingStore,
    H: HotelClient,
{
    store: S,
    hotel: H,
    today: fn() -> NaiveDate,
}

impl<S, H> BookingOrchestrator<S, H>
where
    S: BookingStore,
    H: HotelClient,
{
    pub fn new(store: S, hotel: H) -> Self {
        Self {
            store,
            hotel,
            today: utc_today,
        }
    }

    /// Replaces the source of "today" used to reject stays in the past.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn hotel(&self) -> &H {
        &self.hotel
    }

    /// Creates a booking and runs the saga to a terminal state.
    ///
    /// A request ID seen before is answered from the recorded booking: a
    /// confirmed booking is returned as is, a saga-cancelled one yields the
    /// same error again, and a PENDING one left by a crash is resumed.
    #[tracing::instrument(skip(self, cmd), fields(request_id = %cmd.request_id))]
    pub async fn create_booking(&self, cmd: CreateBooking, requester: &str) -> Result<Booking> {
        metrics::counter!("booking_saga_total").increment(1);
        let started = Instant::now();

        if let Some(existing) = self.store.find_by_request_id(cmd.request_id).await? {
            return self.replay(existing, requester).await;
        }

        let dates = self.validate(&cmd)?;
        let room_id = self.resolve_room(&cmd, &dates).await?;

        let inserted = self
            .store
            .insert(NewBooking {
                username: requester.to_string(),
                room_id,
                dates,
                request_id: cmd.request_id,
            })
            .await;
        let booking = match inserted {
            Ok(booking) => booking,
            Err(BookingError::DuplicateRequest(request_id)) => {
                // Lost a race with a concurrent delivery of the same key.
                let existing = self
                    .store
                    .find_by_request_id(request_id)
                    .await?
                    .ok_or_else(|| {
                        BookingError::CorruptRecord(format!(
                            "request {request_id} is taken but has no booking"
                        ))
                    })?;
                return self.replay(existing, requester).await;
            }
            Err(e) => return Err(e),
        };
        tracing::info!(
            booking_id = %booking.id,
            %room_id,
            %dates,
            nights = dates.nights(),
            "booking pending"
        );

        let result = self.run_saga(booking).await;
        metrics::histogram!("booking_saga_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        result
    }

    /// Cancels a booking on behalf of its owner and releases the room.
    ///
    /// The release is best effort: once ownership and state checks pass
    /// the cancellation always succeeds. A saga resolving the booking while
    /// the cancel is written makes the cancel start over from the stored
    /// state.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking(&self, id: BookingId, requester: &str) -> Result<Booking> {
        let mut booking = self.get_booking(id, requester).await?;
        loop {
            let expected = booking.status;
            booking.cancel(None)?;
            match self.store.update(&booking, expected).await {
                Ok(()) => break,
                Err(BookingError::StatusChanged { .. }) => {
                    tracing::info!(booking_id = %id, "booking changed during cancel, reloading");
                    booking = self.get_booking(id, requester).await?;
                }
                Err(e) => return Err(e),
            }
        }

        metrics::counter!("booking_cancelled_by_user").increment(1);
        tracing::info!(booking_id = %booking.id, "booking cancelled by user");

        self.compensate(&booking).await;
        Ok(booking)
    }

    /// Loads a booking owned by `requester`.
    pub async fn get_booking(&self, id: BookingId, requester: &str) -> Result<Booking> {
        let booking = self
            .store
            .get(id)
            .await?
            .ok_or(BookingError::BookingNotFound(id))?;

        if !booking.is_owned_by(requester) {
            tracing::warn!(booking_id = %id, requester, "access denied to booking");
            return Err(BookingError::AccessDenied(id));
        }
        Ok(booking)
    }

    /// Bookings of `requester`, newest first.
    pub async fn list_for_user(&self, requester: &str) -> Result<Vec<Booking>> {
        self.store.list_for_user(requester).await
    }

    fn validate(&self, cmd: &CreateBooking) -> Result<DateRange> {
        let (Some(start_date), Some(end_date)) = (cmd.start_date, cmd.end_date) else {
            return Err(BookingError::InvalidRequest(
                "Start date and end date are required".to_string(),
            ));
        };
        if start_date < (self.today)() {
            return Err(BookingError::InvalidRequest(
                "Start date cannot be in the past".to_string(),
            ));
        }
        DateRange::new(start_date, end_date).map_err(|_| {
            BookingError::InvalidRequest("End date must be after start date".to_string())
        })
    }

    async fn resolve_room(&self, cmd: &CreateBooking, dates: &DateRange) -> Result<RoomId> {
        if !cmd.auto_select {
            return cmd.room_id.ok_or_else(|| {
                BookingError::InvalidRequest(
                    "Room ID is required when autoSelect is false".to_string(),
                )
            });
        }

        let hotel_id = cmd.hotel_id.ok_or_else(|| {
            BookingError::InvalidRequest("Hotel ID is required for auto-select".to_string())
        })?;

        let rooms = self
            .hotel
            .recommend_rooms(hotel_id, dates.start_date(), dates.end_date())
            .await
            .map_err(|e| {
                tracing::warn!(%hotel_id, error = %e, "room recommendation failed");
                BookingError::from(SagaFailure::from(e))
            })?;

        let room = rooms.first().ok_or(BookingError::NoRoomAvailable)?;
        tracing::info!(
            %hotel_id,
            room_id = %room.id,
            candidates = rooms.len(),
            "room auto-selected"
        );
        Ok(room.id)
    }

    async fn replay(&self, existing: Booking, requester: &str) -> Result<Booking> {
        if !existing.is_owned_by(requester) {
            tracing::warn!(
                booking_id = %existing.id,
                requester,
                "request ID replayed by another user"
            );
            return Err(BookingError::AccessDenied(existing.id));
        }

        metrics::counter!("booking_saga_replayed").increment(1);
        tracing::info!(
            booking_id = %existing.id,
            status = %existing.status,
            "duplicate request, replaying recorded outcome"
        );

        if existing.status == BookingStatus::Pending {
            tracing::warn!(booking_id = %existing.id, "resuming pending booking");
            return self.run_saga(existing).await;
        }
        recorded_outcome(existing)
    }

    /// Runs the confirm step and resolves the booking.
    #[tracing::instrument(
        skip(self, booking),
        fields(booking_id = %booking.id, room_id = %booking.room_id)
    )]
    async fn run_saga(&self, mut booking: Booking) -> Result<Booking> {
        let request = ConfirmAvailabilityRequest {
            request_id: booking.request_id,
            booking_id: booking.id,
            start_date: booking.dates.start_date(),
            end_date: booking.dates.end_date(),
        };

        tracing::info!(step = "confirm", "saga step started");
        let result = self
            .hotel
            .confirm_availability(booking.room_id, request)
            .await;

        let outcome = ConfirmOutcome::from_result(result);
        let compensate = outcome.needs_compensation();
        let failure = match outcome {
            ConfirmOutcome::Reserved(reservation_id) => {
                booking.confirm()?;
                return match self.store.update(&booking, BookingStatus::Pending).await {
                    Ok(()) => {
                        metrics::counter!("booking_saga_confirmed").increment(1);
                        tracing::info!(?reservation_id, "booking confirmed");
                        Ok(booking)
                    }
                    Err(BookingError::StatusChanged { .. }) => {
                        self.settle_superseded(&booking).await
                    }
                    Err(e) => Err(e),
                };
            }
            ConfirmOutcome::Refused(message) => {
                tracing::info!(%message, "hotel refused the room");
                SagaFailure::RoomUnavailable
            }
            ConfirmOutcome::Failed(cause) => {
                tracing::warn!(error = %cause, "confirm failed, compensating");
                SagaFailure::from(cause)
            }
        };

        booking.cancel(Some(failure.reason().to_string()))?;
        match self.store.update(&booking, BookingStatus::Pending).await {
            Ok(()) => {
                metrics::counter!("booking_saga_cancelled").increment(1);
                tracing::warn!(reason = failure.reason(), "booking cancelled");
                if compensate {
                    self.compensate(&booking).await;
                }
                Err(failure.into())
            }
            Err(BookingError::StatusChanged { .. }) => self.settle_superseded(&booking).await,
            Err(e) => {
                tracing::error!(error = %e, "failed to persist cancelled booking");
                if compensate {
                    self.compensate(&booking).await;
                }
                Err(e)
            }
        }
    }

    /// Resolves a saga whose final write lost to another writer.
    ///
    /// The stored booking wins. If it ended CANCELLED the hotel may still
    /// hold a reservation made by this run, so a release is sent; a
    /// CONFIRMED booking is left alone because its reservation is the one
    /// this run would otherwise release.
    async fn settle_superseded(&self, booking: &Booking) -> Result<Booking> {
        let stored = self
            .store
            .get(booking.id)
            .await?
            .ok_or(BookingError::BookingNotFound(booking.id))?;

        metrics::counter!("booking_saga_superseded").increment(1);
        tracing::warn!(
            booking_id = %stored.id,
            status = %stored.status,
            "booking resolved elsewhere while the saga ran"
        );

        if stored.status == BookingStatus::Cancelled {
            self.compensate(&stored).await;
        }
        recorded_outcome(stored)
    }

    /// Best-effort release of whatever the hotel holds for the booking.
    async fn compensate(&self, booking: &Booking) {
        tracing::info!(step = "release", booking_id = %booking.id, "compensation started");
        let request = ReleaseReservationRequest {
            request_id: booking.request_id,
            booking_id: booking.id,
        };

        match self
            .hotel
            .release_reservation(booking.room_id, request)
            .await
        {
            Ok(()) => tracing::info!(booking_id = %booking.id, "release completed"),
            Err(e) => {
                metrics::counter!("booking_compensation_failed").increment(1);
                tracing::error!(
                    booking_id = %booking.id,
                    room_id = %booking.room_id,
                    error = %e,
                    "release failed, reservation left for reconciliation"
                );
            }
        }
    }
}
