//! HTTP handlers of both services.

pub mod bookings;
pub mod health;
pub mod metrics;
pub mod rooms;
