//! Prometheus metrics endpoint and recorder setup.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Installs the global Prometheus recorder and describes the saga metrics.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe();
    Ok(handle)
}

/// Registers help text for every metric either service emits.
pub fn describe() {
    metrics::describe_counter!("booking_saga_total", "Booking requests received");
    metrics::describe_counter!(
        "booking_saga_replayed",
        "Booking requests answered from a recorded outcome"
    );
    metrics::describe_counter!("booking_saga_confirmed", "Bookings confirmed by the hotel");
    metrics::describe_counter!("booking_saga_cancelled", "Bookings cancelled by the saga");
    metrics::describe_counter!("booking_cancelled_by_user", "Bookings cancelled by their owner");
    metrics::describe_counter!(
        "booking_saga_superseded",
        "Saga writes that lost to a concurrent change of the booking"
    );
    metrics::describe_counter!(
        "booking_compensation_failed",
        "Release calls that failed and need reconciliation"
    );
    metrics::describe_histogram!(
        "booking_saga_duration_seconds",
        metrics::Unit::Seconds,
        "Time to resolve a new booking"
    );
    metrics::describe_counter!("hotel_client_retries", "Hotel calls retried without a response");
    metrics::describe_counter!("hotel_circuit_opened", "Times the hotel circuit opened");
    metrics::describe_counter!("reservation_confirm_total", "Confirm calls received");
    metrics::describe_counter!("reservation_replayed", "Confirm calls answered from the ledger");
    metrics::describe_counter!("reservation_confirmed", "Reservations created");
    metrics::describe_counter!("reservation_tombstoned", "Confirm calls refused and recorded");
    metrics::describe_counter!("reservation_released", "Reservations released");
}

/// GET /metrics: Prometheus text exposition.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        handle.render(),
    )
}
