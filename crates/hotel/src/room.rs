//! Rooms.

use chrono::{DateTime, Utc};
use common::{ResourceGroupId, RoomId, RoomView};
use serde::{Deserialize, Serialize};

/// A bookable unit.
///
/// `available` is the operational flag (out-of-service rooms are never
/// bookable); date availability is derived from reservations.
/// `times_booked` counts successful confirmations and is only a ranking
/// heuristic, never a capacity limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub hotel_id: ResourceGroupId,
    pub number: String,
    pub available: bool,
    pub times_booked: i64,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn to_view(&self) -> RoomView {
        RoomView {
            id: self.id,
            hotel_id: self.hotel_id,
            number: self.number.clone(),
            available: self.available,
            times_booked: self.times_booked,
        }
    }
}

/// A room to be registered with a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub hotel_id: ResourceGroupId,
    pub number: String,
    pub available: bool,
    pub times_booked: i64,
}

impl NewRoom {
    /// An in-service room that has never been booked.
    pub fn new(hotel_id: ResourceGroupId, number: impl Into<String>) -> Self {
        Self {
            hotel_id,
            number: number.into(),
            available: true,
            times_booked: 0,
        }
    }

    /// Marks the room as out of service.
    pub fn out_of_service(mut self) -> Self {
        self.available = false;
        self
    }

    /// Seeds the historical booking counter.
    pub fn with_times_booked(mut self, times_booked: i64) -> Self {
        self.times_booked = times_booked;
        self
    }
}
