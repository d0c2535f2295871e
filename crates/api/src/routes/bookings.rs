//! Booking service endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use booking::{Booking, BookingOrchestrator, BookingStore, CreateBooking, HotelClient};
use chrono::NaiveDate;
use common::{BookingId, RequestId, ResourceGroupId, RoomId};
use serde::Deserialize;

use crate::error::ApiError;

/// Identity of the caller, set by the identity provider in front of us.
pub const USER_HEADER: &str = "x-user";
/// Optional caller-chosen key for safe retries of `POST /api/booking`.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

pub type BookingState<S, H> = Arc<BookingOrchestrator<S, H>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub room_id: Option<RoomId>,
    pub hotel_id: Option<ResourceGroupId>,
    #[serde(default)]
    pub auto_select: bool,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// POST /api/booking: runs the saga and answers with the resolved booking.
#[tracing::instrument(skip(state, headers, req))]
pub async fn create<S: BookingStore + 'static, H: HotelClient + 'static>(
    State(state): State<BookingState<S, H>>,
    headers: HeaderMap,
    Json(req): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let requester = requester(&headers)?;
    let request_id = idempotency_key(&headers)?.unwrap_or_default();

    let cmd = CreateBooking {
        request_id,
        room_id: req.room_id,
        hotel_id: req.hotel_id,
        auto_select: req.auto_select,
        start_date: req.start_date,
        end_date: req.end_date,
    };
    let booking = state.create_booking(cmd, requester).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /api/bookings
#[tracing::instrument(skip(state, headers))]
pub async fn list<S: BookingStore + 'static, H: HotelClient + 'static>(
    State(state): State<BookingState<S, H>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let requester = requester(&headers)?;
    Ok(Json(state.list_for_user(requester).await?))
}

/// GET /api/booking/{id}
#[tracing::instrument(skip(state, headers))]
pub async fn get<S: BookingStore + 'static, H: HotelClient + 'static>(
    State(state): State<BookingState<S, H>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, ApiError> {
    let requester = requester(&headers)?;
    let booking = state.get_booking(BookingId::new(id), requester).await?;
    Ok(Json(booking))
}

/// DELETE /api/booking/{id}
#[tracing::instrument(skip(state, headers))]
pub async fn cancel<S: BookingStore + 'static, H: HotelClient + 'static>(
    State(state): State<BookingState<S, H>>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let requester = requester(&headers)?;
    state.cancel_booking(BookingId::new(id), requester).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn requester(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
}

fn idempotency_key(headers: &HeaderMap) -> Result<Option<RequestId>, ApiError> {
    let Some(value) = headers.get(IDEMPOTENCY_KEY_HEADER) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|key| key.trim().parse().ok())
        .map(Some)
        .ok_or_else(|| ApiError::BadRequest("Idempotency-Key must be a UUID".to_string()))
}
