//! Shared types for the booking saga.
//!
//! Both services depend on this crate for identifiers, the inclusive
//! [`DateRange`] used by the overlap query, and the request/response types
//! exchanged over the confirm/release/recommend protocol.

pub mod dates;
pub mod ids;
pub mod wire;

pub use dates::{DateRange, DateRangeError};
pub use ids::{BookingId, RequestId, ReservationId, ResourceGroupId, RoomId};
pub use wire::{
    ConfirmAvailabilityRequest, ConfirmAvailabilityResponse, RecommendQuery,
    ReleaseReservationRequest, RoomView,
};
