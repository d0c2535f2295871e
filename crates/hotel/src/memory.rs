use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::{BookingId, DateRange, RequestId, ReservationId, ResourceGroupId, RoomId};
use tokio::sync::{Mutex, RwLock};

use crate::{
    HotelError, Result,
    decision::{ConfirmPlan, ReleasePlan, plan_confirm, plan_release, rank_rooms},
    reservation::{ReservationRequest, ReservationStatus, RoomReservation},
    room::{NewRoom, Room},
    store::{ConfirmOutcome, HotelStore, ReleaseOutcome},
};

#[derive(Debug, Default)]
struct HotelState {
    rooms: BTreeMap<RoomId, Room>,
    reservations: Vec<RoomReservation>,
    next_room_id: i64,
    next_reservation_id: i64,
}

impl HotelState {
    fn by_request_id(&self, request_id: RequestId) -> Option<&RoomReservation> {
        self.reservations
            .iter()
            .find(|r| r.request_id == request_id)
    }

    fn latest_for_booking(&mut self, booking_id: BookingId) -> Option<&mut RoomReservation> {
        self.reservations
            .iter_mut()
            .rev()
            .find(|r| r.booking_id == booking_id)
    }

    /// Inserts a reservation, enforcing request ID uniqueness.
    ///
    /// On a key collision the row already holding the key is returned as
    /// the error, mirroring a unique-constraint violation.
    fn insert_reservation(
        &mut self,
        room_id: RoomId,
        request: ReservationRequest,
        status: ReservationStatus,
    ) -> std::result::Result<RoomReservation, RoomReservation> {
        if let Some(existing) = self.by_request_id(request.request_id) {
            return Err(existing.clone());
        }

        self.next_reservation_id += 1;
        let now = Utc::now();
        let reservation = RoomReservation {
            id: ReservationId::new(self.next_reservation_id),
            room_id,
            booking_id: request.booking_id,
            request_id: request.request_id,
            dates: request.dates,
            status,
            created_at: now,
            updated_at: now,
        };
        self.reservations.push(reservation.clone());
        Ok(reservation)
    }
}

/// In-memory hotel store.
///
/// Confirms on the same room are serialized by a per-room mutex held across
/// the overlap check and the write, so concurrent attempts for overlapping
/// dates cannot both succeed.
#[derive(Clone, Default)]
pub struct InMemoryHotelStore {
    state: Arc<RwLock<HotelState>>,
    room_locks: Arc<Mutex<HashMap<RoomId, Arc<Mutex<()>>>>>,
}

impl InMemoryHotelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of reservation rows, tombstones included.
    pub async fn reservation_count(&self) -> usize {
        self.state.read().await.reservations.len()
    }

    async fn room_lock(&self, room_id: RoomId) -> Arc<Mutex<()>> {
        let mut locks = self.room_locks.lock().await;
        locks.entry(room_id).or_default().clone()
    }
}

#[async_trait]
impl HotelStore for InMemoryHotelStore {
    async fn insert_room(&self, room: NewRoom) -> Result<Room> {
        let mut state = self.state.write().await;

        if state
            .rooms
            .values()
            .any(|r| r.hotel_id == room.hotel_id && r.number == room.number)
        {
            return Err(HotelError::DuplicateRoomNumber {
                hotel_id: room.hotel_id,
                number: room.number,
            });
        }

        state.next_room_id += 1;
        let created = Room {
            id: RoomId::new(state.next_room_id),
            hotel_id: room.hotel_id,
            number: room.number,
            available: room.available,
            times_booked: room.times_booked,
            created_at: Utc::now(),
        };
        state.rooms.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_room(&self, room_id: RoomId) -> Result<Option<Room>> {
        Ok(self.state.read().await.rooms.get(&room_id).cloned())
    }

    async fn set_room_available(&self, room_id: RoomId, available: bool) -> Result<Room> {
        let mut state = self.state.write().await;
        let room = state
            .rooms
            .get_mut(&room_id)
            .ok_or(HotelError::RoomNotFound(room_id))?;
        room.available = available;
        Ok(room.clone())
    }

    async fn find_by_request_id(&self, request_id: RequestId) -> Result<Option<RoomReservation>> {
        Ok(self.state.read().await.by_request_id(request_id).cloned())
    }

    async fn find_by_booking_id(&self, booking_id: BookingId) -> Result<Option<RoomReservation>> {
        let state = self.state.read().await;
        Ok(state
            .reservations
            .iter()
            .rev()
            .find(|r| r.booking_id == booking_id)
            .cloned())
    }

    async fn reservations_for_room(&self, room_id: RoomId) -> Result<Vec<RoomReservation>> {
        let state = self.state.read().await;
        Ok(state
            .reservations
            .iter()
            .filter(|r| r.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn confirm(
        &self,
        room_id: RoomId,
        request: ReservationRequest,
    ) -> Result<ConfirmOutcome> {
        let room_lock = self.room_lock(room_id).await;
        let _held = room_lock.lock().await;

        let plan = {
            let state = self.state.read().await;
            plan_confirm(
                state.by_request_id(request.request_id).cloned(),
                room_id,
                state.rooms.get(&room_id),
                state.reservations.iter(),
                &request.dates,
            )?
        };

        let mut state = self.state.write().await;
        match plan {
            ConfirmPlan::Replay(existing) => Ok(ConfirmOutcome::Replayed(existing)),
            ConfirmPlan::Tombstone => {
                match state.insert_reservation(room_id, request, ReservationStatus::Released) {
                    Ok(tombstone) => Ok(ConfirmOutcome::Rejected(tombstone)),
                    Err(existing) => Ok(ConfirmOutcome::Replayed(existing)),
                }
            }
            ConfirmPlan::Confirm => {
                let reservation =
                    match state.insert_reservation(room_id, request, ReservationStatus::Confirmed) {
                        Ok(reservation) => reservation,
                        Err(existing) => return Ok(ConfirmOutcome::Replayed(existing)),
                    };
                let room = state
                    .rooms
                    .get_mut(&room_id)
                    .ok_or(HotelError::RoomNotFound(room_id))?;
                room.times_booked += 1;
                Ok(ConfirmOutcome::Confirmed {
                    reservation,
                    room: room.clone(),
                })
            }
        }
    }

    async fn release(&self, booking_id: BookingId) -> Result<ReleaseOutcome> {
        let mut state = self.state.write().await;
        let Some(reservation) = state.latest_for_booking(booking_id) else {
            return Ok(ReleaseOutcome::NotFound);
        };

        match plan_release(Some(&*reservation)) {
            ReleasePlan::NotFound => Ok(ReleaseOutcome::NotFound),
            ReleasePlan::AlreadyReleased => {
                Ok(ReleaseOutcome::AlreadyReleased(reservation.clone()))
            }
            ReleasePlan::Release => {
                reservation.status = ReservationStatus::Released;
                reservation.updated_at = Utc::now();
                Ok(ReleaseOutcome::Released(reservation.clone()))
            }
        }
    }

    async fn free_rooms(
        &self,
        hotel_id: Option<ResourceGroupId>,
        dates: DateRange,
    ) -> Result<Vec<Room>> {
        let state = self.state.read().await;
        let mut rooms: Vec<Room> = state
            .rooms
            .values()
            .filter(|room| room.available)
            .filter(|room| hotel_id.is_none_or(|id| room.hotel_id == id))
            .filter(|room| {
                !state
                    .reservations
                    .iter()
                    .any(|r| r.room_id == room.id && r.blocks(&dates))
            })
            .cloned()
            .collect();
        rank_rooms(&mut rooms);
        Ok(rooms)
    }
}
