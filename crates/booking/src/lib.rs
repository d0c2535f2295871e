//! Booking side of the booking saga.
//!
//! This crate owns the booking of record and provides:
//! - [`BookingOrchestrator`]: creates a PENDING booking, asks the hotel to
//!   confirm, and resolves the booking to CONFIRMED or CANCELLED, releasing
//!   the room as compensation when the confirm outcome is unknown
//! - [`BookingStore`]: persistence with in-memory and PostgreSQL backends
//! - [`client`]: the [`HotelClient`] capability set with live HTTP,
//!   in-process, fail-safe and circuit-breaking implementations

pub mod booking;
pub mod client;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod postgres;
pub mod saga;
pub mod status;
pub mod store;

pub use booking::{Booking, NewBooking};
pub use client::{
    CircuitBreakerConfig, CircuitBreakerHotelClient, FallbackHotelClient, HotelClient,
    HotelClientError, HttpClientConfig, HttpHotelClient, InProcessHotelClient,
};
pub use error::{BookingError, Result};
pub use memory::InMemoryBookingStore;
pub use orchestrator::{BookingOrchestrator, CreateBooking};
pub use postgres::PostgresBookingStore;
pub use saga::{ConfirmOutcome, SagaFailure};
pub use status::BookingStatus;
pub use store::BookingStore;
