//! Hotel service endpoints: confirm/release protocol and room queries.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::NaiveDate;
use common::{
    ConfirmAvailabilityRequest, ConfirmAvailabilityResponse, RecommendQuery,
    ReleaseReservationRequest, ResourceGroupId, RoomId, RoomView,
};
use hotel::{AvailabilityAdvisor, HotelStore, NewRoom, ReservationManager};
use serde::Deserialize;

use crate::error::ApiError;

/// Shared state of the hotel service.
pub struct HotelState<S: HotelStore> {
    pub manager: ReservationManager<S>,
    pub advisor: AvailabilityAdvisor<S>,
}

impl<S: HotelStore + Clone> HotelState<S> {
    pub fn new(store: S) -> Self {
        Self {
            manager: ReservationManager::new(store.clone()),
            advisor: AvailabilityAdvisor::new(store),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRoomRequest {
    pub hotel_id: ResourceGroupId,
    pub number: String,
    #[serde(default)]
    pub out_of_service: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatesQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// POST /api/rooms/{id}/confirm-availability
#[tracing::instrument(skip(state, req), fields(booking_id = %req.booking_id))]
pub async fn confirm<S: HotelStore + 'static>(
    State(state): State<Arc<HotelState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<ConfirmAvailabilityRequest>,
) -> Result<Json<ConfirmAvailabilityResponse>, ApiError> {
    let response = state
        .manager
        .confirm_availability(RoomId::new(id), req)
        .await?;
    Ok(Json(response))
}

/// POST /api/rooms/{id}/release: always 204 once the store answered.
#[tracing::instrument(skip(state, req), fields(booking_id = %req.booking_id))]
pub async fn release<S: HotelStore + 'static>(
    State(state): State<Arc<HotelState<S>>>,
    Path(id): Path<i64>,
    Json(req): Json<ReleaseReservationRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .manager
        .release_reservation(RoomId::new(id), req)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/rooms/recommend?hotelId=&startDate=&endDate=
#[tracing::instrument(skip(state))]
pub async fn recommend<S: HotelStore + 'static>(
    State(state): State<Arc<HotelState<S>>>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Vec<RoomView>>, ApiError> {
    let rooms = state
        .advisor
        .recommend_rooms(query.hotel_id, query.start_date, query.end_date)
        .await?;
    Ok(Json(rooms))
}

/// GET /api/rooms?startDate=&endDate=
#[tracing::instrument(skip(state))]
pub async fn available<S: HotelStore + 'static>(
    State(state): State<Arc<HotelState<S>>>,
    Query(query): Query<DatesQuery>,
) -> Result<Json<Vec<RoomView>>, ApiError> {
    let rooms = state
        .advisor
        .available_rooms(query.start_date, query.end_date)
        .await?;
    Ok(Json(rooms))
}

/// POST /api/rooms
#[tracing::instrument(skip(state, req), fields(hotel_id = %req.hotel_id, number = %req.number))]
pub async fn register<S: HotelStore + 'static>(
    State(state): State<Arc<HotelState<S>>>,
    Json(req): Json<RegisterRoomRequest>,
) -> Result<(StatusCode, Json<RoomView>), ApiError> {
    if req.number.trim().is_empty() {
        return Err(ApiError::BadRequest("Room number is required".to_string()));
    }

    let mut room = NewRoom::new(req.hotel_id, req.number.trim());
    if req.out_of_service {
        room = room.out_of_service();
    }
    let room = state.manager.register_room(room).await?;
    Ok((StatusCode::CREATED, Json(room.to_view())))
}

/// GET /api/rooms/{id}
pub async fn get<S: HotelStore + 'static>(
    State(state): State<Arc<HotelState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<RoomView>, ApiError> {
    let room = state.manager.get_room(RoomId::new(id)).await?;
    Ok(Json(room.to_view()))
}
