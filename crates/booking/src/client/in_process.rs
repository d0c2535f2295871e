use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{
    ConfirmAvailabilityRequest, ConfirmAvailabilityResponse, ReleaseReservationRequest,
    ResourceGroupId, RoomId, RoomView,
};
use hotel::{AvailabilityAdvisor, HotelError, HotelStore, ReservationManager};

use super::{
    COMMUNICATION_ERROR_MESSAGE, HotelClient, HotelClientError, ROOM_ALREADY_BOOKED_MESSAGE,
    ROOM_NOT_FOUND_MESSAGE,
};

#[derive(Debug, Default)]
struct Injection {
    fail_on_confirm: bool,
    lose_confirm_response: bool,
    fail_on_release: bool,
    releases: Vec<ReleaseReservationRequest>,
}

/// Calls the hotel's reservation manager and advisor directly.
///
/// Used when both halves run in one process and in tests. Transport
/// failures can be injected: a confirm that fails before reaching the
/// hotel, a confirm whose response is lost after the hotel applied it, and
/// a failing release. Every release call is recorded.
#[derive(Clone)]
pub struct InProcessHotelClient<S: HotelStore> {
    manager: Arc<ReservationManager<S>>,
    advisor: Arc<AvailabilityAdvisor<S>>,
    injection: Arc<Mutex<Injection>>,
}

impl<S: HotelStore + Clone> InProcessHotelClient<S> {
    pub fn new(store: S) -> Self {
        Self {
            manager: Arc::new(ReservationManager::new(store.clone())),
            advisor: Arc::new(AvailabilityAdvisor::new(store)),
            injection: Arc::new(Mutex::new(Injection::default())),
        }
    }
}

impl<S: HotelStore> InProcessHotelClient<S> {
    pub fn manager(&self) -> &ReservationManager<S> {
        &self.manager
    }

    /// Makes confirm calls fail without reaching the hotel.
    pub fn set_fail_on_confirm(&self, fail: bool) {
        self.injection().fail_on_confirm = fail;
    }

    /// Makes confirm calls reach the hotel and then fail, as if the
    /// response was lost on the way back.
    pub fn set_lose_confirm_response(&self, lose: bool) {
        self.injection().lose_confirm_response = lose;
    }

    /// Makes release calls fail without reaching the hotel.
    pub fn set_fail_on_release(&self, fail: bool) {
        self.injection().fail_on_release = fail;
    }

    /// Every release call made through this client, failed ones included.
    pub fn release_calls(&self) -> Vec<ReleaseReservationRequest> {
        self.injection().releases.clone()
    }

    fn injection(&self) -> MutexGuard<'_, Injection> {
        self.injection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Maps a hotel error the way the hotel's HTTP surface would report it.
fn client_error(err: HotelError) -> HotelClientError {
    match err {
        HotelError::RoomNotFound(_) => HotelClientError::from_status(404),
        HotelError::RoomNotOperational(_) => {
            HotelClientError::Rejected(ROOM_ALREADY_BOOKED_MESSAGE.to_string())
        }
        HotelError::InvalidDateRange(_) | HotelError::DuplicateRoomNumber { .. } => {
            HotelClientError::Rejected(COMMUNICATION_ERROR_MESSAGE.to_string())
        }
        other => HotelClientError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl<S: HotelStore> HotelClient for InProcessHotelClient<S> {
    async fn confirm_availability(
        &self,
        room_id: RoomId,
        request: ConfirmAvailabilityRequest,
    ) -> Result<ConfirmAvailabilityResponse, HotelClientError> {
        let (fail, lose) = {
            let injection = self.injection();
            (injection.fail_on_confirm, injection.lose_confirm_response)
        };
        if fail {
            return Err(HotelClientError::Unavailable(
                "injected confirm failure".to_string(),
            ));
        }

        let response = self
            .manager
            .confirm_availability(room_id, request)
            .await
            .map_err(client_error)?;

        if lose {
            return Err(HotelClientError::Unavailable(
                "injected lost confirm response".to_string(),
            ));
        }
        Ok(response)
    }

    async fn release_reservation(
        &self,
        room_id: RoomId,
        request: ReleaseReservationRequest,
    ) -> Result<(), HotelClientError> {
        let fail = {
            let mut injection = self.injection();
            injection.releases.push(request.clone());
            injection.fail_on_release
        };
        if fail {
            return Err(HotelClientError::Unavailable(
                "injected release failure".to_string(),
            ));
        }

        self.manager
            .release_reservation(room_id, request)
            .await
            .map_err(client_error)?;
        Ok(())
    }

    async fn recommend_rooms(
        &self,
        hotel_id: ResourceGroupId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RoomView>, HotelClientError> {
        self.advisor
            .recommend_rooms(hotel_id, start_date, end_date)
            .await
            .map_err(client_error)
    }
}
