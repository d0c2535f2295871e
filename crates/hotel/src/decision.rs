//! Pure decision logic shared by every store.
//!
//! Stores gather the inputs inside their transaction boundary, ask these
//! functions what to do, and apply the answer before releasing the room
//! lock. Both backends therefore follow exactly the same protocol.

use common::{DateRange, RoomId};

use crate::error::{HotelError, Result};
use crate::reservation::RoomReservation;
use crate::room::Room;

/// What a confirm attempt must do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmPlan {
    /// The request ID was seen before; answer from the recorded row.
    Replay(RoomReservation),
    /// The room is taken for these dates; record a RELEASED tombstone.
    Tombstone,
    /// Record a CONFIRMED reservation and bump the room's counter.
    Confirm,
}

/// What a release request must do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePlan {
    /// Nothing was ever reserved for this booking.
    NotFound,
    /// The reservation is already RELEASED.
    AlreadyReleased,
    /// Move the reservation to RELEASED.
    Release,
}

/// Decides the outcome of a confirm attempt on `room_id`.
///
/// `existing` is the row recorded under the attempt's request ID, if any.
/// `reservations` may contain any reservations; only active ones on the
/// same room overlapping `dates` count against the attempt.
pub fn plan_confirm<'a>(
    existing: Option<RoomReservation>,
    room_id: RoomId,
    room: Option<&Room>,
    reservations: impl IntoIterator<Item = &'a RoomReservation>,
    dates: &DateRange,
) -> Result<ConfirmPlan> {
    if let Some(existing) = existing {
        return Ok(ConfirmPlan::Replay(existing));
    }

    let room = room.ok_or(HotelError::RoomNotFound(room_id))?;
    if !room.available {
        return Err(HotelError::RoomNotOperational(room_id));
    }

    if reservations
        .into_iter()
        .any(|r| r.room_id == room_id && r.blocks(dates))
    {
        return Ok(ConfirmPlan::Tombstone);
    }

    Ok(ConfirmPlan::Confirm)
}

/// Decides the outcome of a release request.
pub fn plan_release(existing: Option<&RoomReservation>) -> ReleasePlan {
    match existing {
        None => ReleasePlan::NotFound,
        Some(r) if !r.status.can_release() => ReleasePlan::AlreadyReleased,
        Some(_) => ReleasePlan::Release,
    }
}

/// Orders rooms least-booked first, breaking ties by ascending id.
pub fn rank_rooms(rooms: &mut [Room]) {
    rooms.sort_by_key(|room| (room.times_booked, room.id));
}
