//! Hotel side of the booking saga.
//!
//! This crate owns rooms and room reservations and provides:
//! - [`ReservationManager`]: the idempotent confirm/release protocol that
//!   guarantees a room is never double-booked for overlapping dates
//! - [`AvailabilityAdvisor`]: read-only ranking of free rooms used for
//!   auto-selection
//! - [`HotelStore`]: persistence with in-memory and PostgreSQL backends
//!
//! Every confirm attempt is keyed by its request ID. Refused attempts are
//! recorded as RELEASED tombstones so a retried call gets the same answer.

pub mod advisor;
pub mod decision;
pub mod error;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod reservation;
pub mod room;
pub mod store;

pub use advisor::AvailabilityAdvisor;
pub use decision::{ConfirmPlan, ReleasePlan, plan_confirm, plan_release, rank_rooms};
pub use error::{HotelError, Result};
pub use manager::ReservationManager;
pub use memory::InMemoryHotelStore;
pub use postgres::PostgresHotelStore;
pub use reservation::{ReservationRequest, ReservationStatus, RoomReservation};
pub use room::{NewRoom, Room};
pub use store::{ConfirmOutcome, HotelStore, ReleaseOutcome};
