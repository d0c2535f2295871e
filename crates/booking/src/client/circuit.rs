use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{
    ConfirmAvailabilityRequest, ConfirmAvailabilityResponse, ReleaseReservationRequest,
    ResourceGroupId, RoomId, RoomView,
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{FallbackHotelClient, HotelClient, HotelClientError};

/// Settings for [`CircuitBreakerHotelClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive transport failures that open the circuit.
    pub failure_threshold: u32,
    /// How long the circuit stays open before a trial call is let through.
    pub open_for: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_for: Duration::from_millis(30_000),
        }
    }
}

#[derive(Debug, Default)]
struct CircuitState {
    consecutive_failures: u32,
    open_until: Option<Instant>,
    /// When the half-open trial call was let through.
    trial_started: Option<Instant>,
}

/// Routes calls to a live client, or to [`FallbackHotelClient`] while the
/// hotel is failing.
///
/// A transport failure of the live client is answered by the fallback for
/// that call and counted; structured rejections are passed through and
/// count as the hotel being reachable. After `failure_threshold`
/// consecutive failures the circuit opens and every call goes straight to
/// the fallback until `open_for` has elapsed. The first call after that is
/// a trial: success closes the circuit, failure opens it again. Calls
/// arriving while the trial is in flight keep getting the fallback.
pub struct CircuitBreakerHotelClient<L: HotelClient> {
    live: L,
    fallback: FallbackHotelClient,
    config: CircuitBreakerConfig,
    state: Mutex<CircuitState>,
}

impl<L: HotelClient> CircuitBreakerHotelClient<L> {
    pub fn new(live: L, config: CircuitBreakerConfig) -> Self {
        Self {
            live,
            fallback: FallbackHotelClient::new(),
            config,
            state: Mutex::new(CircuitState::default()),
        }
    }

    pub fn live(&self) -> &L {
        &self.live
    }

    /// Returns true while calls are short-circuited to the fallback.
    pub async fn is_open(&self) -> bool {
        let state = self.state.lock().await;
        state.open_until.is_some_and(|until| Instant::now() < until)
    }

    /// Decides whether a call may reach the live client.
    ///
    /// Once the open window has passed, a single caller gets the trial
    /// permit. A trial that never reported back stops blocking others
    /// after another `open_for`.
    async fn admit(&self) -> bool {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        match state.open_until {
            None => true,
            Some(until) if now < until => false,
            Some(_) => {
                let trial_running = state
                    .trial_started
                    .is_some_and(|started| now < started + self.config.open_for);
                if trial_running {
                    return false;
                }
                state.trial_started = Some(now);
                tracing::info!("hotel circuit half-open, letting a trial call through");
                true
            }
        }
    }

    async fn record<T>(&self, operation: &'static str, result: &Result<T, HotelClientError>) {
        let mut state = self.state.lock().await;
        state.trial_started = None;
        match result {
            Err(e) if e.is_transport() => {
                state.consecutive_failures += 1;
                let trial_failed = state.open_until.is_some();
                if trial_failed || state.consecutive_failures >= self.config.failure_threshold {
                    state.open_until = Some(Instant::now() + self.config.open_for);
                    metrics::counter!("hotel_circuit_opened").increment(1);
                    tracing::error!(
                        operation,
                        failures = state.consecutive_failures,
                        open_ms = self.config.open_for.as_millis() as u64,
                        "hotel circuit opened"
                    );
                }
            }
            _ => {
                if state.open_until.take().is_some() {
                    tracing::info!(operation, "hotel circuit closed");
                }
                state.consecutive_failures = 0;
            }
        }
    }
}

#[async_trait]
impl<L: HotelClient> HotelClient for CircuitBreakerHotelClient<L> {
    async fn confirm_availability(
        &self,
        room_id: RoomId,
        request: ConfirmAvailabilityRequest,
    ) -> Result<ConfirmAvailabilityResponse, HotelClientError> {
        if !self.admit().await {
            return self.fallback.confirm_availability(room_id, request).await;
        }
        let result = self
            .live
            .confirm_availability(room_id, request.clone())
            .await;
        self.record("confirm", &result).await;
        match result {
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "confirm failed, answering from fallback");
                self.fallback.confirm_availability(room_id, request).await
            }
            other => other,
        }
    }

    async fn release_reservation(
        &self,
        room_id: RoomId,
        request: ReleaseReservationRequest,
    ) -> Result<(), HotelClientError> {
        if !self.admit().await {
            return self.fallback.release_reservation(room_id, request).await;
        }
        let result = self
            .live
            .release_reservation(room_id, request.clone())
            .await;
        self.record("release", &result).await;
        match result {
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "release failed, answering from fallback");
                self.fallback.release_reservation(room_id, request).await
            }
            other => other,
        }
    }

    async fn recommend_rooms(
        &self,
        hotel_id: ResourceGroupId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RoomView>, HotelClientError> {
        if !self.admit().await {
            return self
                .fallback
                .recommend_rooms(hotel_id, start_date, end_date)
                .await;
        }
        let result = self
            .live
            .recommend_rooms(hotel_id, start_date, end_date)
            .await;
        self.record("recommend", &result).await;
        match result {
            Err(e) if e.is_transport() => {
                tracing::warn!(error = %e, "recommend failed, answering from fallback");
                self.fallback
                    .recommend_rooms(hotel_id, start_date, end_date)
                    .await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use common::{BookingId, RequestId};

    use super::*;
    use crate::client::{FALLBACK_UNAVAILABLE_MESSAGE, ROOM_NOT_FOUND_MESSAGE};

    /// Live client double whose answers are switched by the test.
    #[derive(Clone, Default)]
    struct FlakyClient {
        failing: Arc<AtomicBool>,
        rejecting: Arc<AtomicBool>,
        slow: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    impl FlakyClient {
        async fn answer(&self) -> Result<(), HotelClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.slow.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                Err(HotelClientError::Unavailable("connection refused".to_string()))
            } else if self.rejecting.load(Ordering::SeqCst) {
                Err(HotelClientError::Rejected(ROOM_NOT_FOUND_MESSAGE.to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl HotelClient for FlakyClient {
        async fn confirm_availability(
            &self,
            _room_id: RoomId,
            _request: ConfirmAvailabilityRequest,
        ) -> Result<ConfirmAvailabilityResponse, HotelClientError> {
            self.answer().await?;
            Ok(ConfirmAvailabilityResponse::available(
                "Room reserved successfully",
                common::ReservationId::new(1),
            ))
        }

        async fn release_reservation(
            &self,
            _room_id: RoomId,
            _request: ReleaseReservationRequest,
        ) -> Result<(), HotelClientError> {
            self.answer().await
        }

        async fn recommend_rooms(
            &self,
            _hotel_id: ResourceGroupId,
            _start_date: NaiveDate,
            _end_date: NaiveDate,
        ) -> Result<Vec<RoomView>, HotelClientError> {
            self.answer().await?;
            Ok(Vec::new())
        }
    }

    fn confirm_request() -> ConfirmAvailabilityRequest {
        ConfirmAvailabilityRequest {
            request_id: RequestId::new(),
            booking_id: BookingId::new(1),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
        }
    }

    fn breaker(live: FlakyClient) -> CircuitBreakerHotelClient<FlakyClient> {
        CircuitBreakerHotelClient::new(
            live,
            CircuitBreakerConfig {
                failure_threshold: 2,
                open_for: Duration::from_secs(60),
            },
        )
    }

    #[tokio::test]
    async fn test_transport_failure_answers_from_fallback() {
        let live = FlakyClient::default();
        live.failing.store(true, Ordering::SeqCst);
        let client = breaker(live);

        let response = client
            .confirm_availability(RoomId::new(1), confirm_request())
            .await
            .unwrap();
        assert!(!response.available);
        assert_eq!(response.message, FALLBACK_UNAVAILABLE_MESSAGE);
        assert!(!client.is_open().await);
    }

    #[tokio::test]
    async fn test_opens_after_threshold_and_skips_live() {
        let live = FlakyClient::default();
        live.failing.store(true, Ordering::SeqCst);
        let client = breaker(live.clone());

        for _ in 0..2 {
            client
                .confirm_availability(RoomId::new(1), confirm_request())
                .await
                .unwrap();
        }
        assert!(client.is_open().await);

        live.failing.store(false, Ordering::SeqCst);
        let response = client
            .confirm_availability(RoomId::new(1), confirm_request())
            .await
            .unwrap();
        assert_eq!(response.message, FALLBACK_UNAVAILABLE_MESSAGE);
        assert_eq!(live.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_trial_call_after_window_closes_circuit() {
        let live = FlakyClient::default();
        live.failing.store(true, Ordering::SeqCst);
        let client = CircuitBreakerHotelClient::new(
            live.clone(),
            CircuitBreakerConfig {
                failure_threshold: 2,
                open_for: Duration::from_millis(20),
            },
        );
        for _ in 0..2 {
            let _ = client
                .recommend_rooms(
                    ResourceGroupId::new(1),
                    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
                    NaiveDate::from_ymd_opt(2025, 3, 12).unwrap(),
                )
                .await;
        }
        assert!(client.is_open().await);

        tokio::time::sleep(Duration::from_millis(40)).await;
        live.failing.store(false, Ordering::SeqCst);

        let response = client
            .confirm_availability(RoomId::new(1), confirm_request())
            .await
            .unwrap();
        assert!(response.available);
        assert!(!client.is_open().await);
    }

    #[tokio::test]
    async fn test_half_open_lets_one_trial_through() {
        let live = FlakyClient::default();
        live.failing.store(true, Ordering::SeqCst);
        let client = CircuitBreakerHotelClient::new(
            live.clone(),
            CircuitBreakerConfig {
                failure_threshold: 2,
                open_for: Duration::from_millis(20),
            },
        );
        for _ in 0..2 {
            client
                .confirm_availability(RoomId::new(1), confirm_request())
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(40)).await;
        live.failing.store(false, Ordering::SeqCst);
        live.slow.store(true, Ordering::SeqCst);

        let (a, b, c) = tokio::join!(
            client.confirm_availability(RoomId::new(1), confirm_request()),
            client.confirm_availability(RoomId::new(1), confirm_request()),
            client.confirm_availability(RoomId::new(1), confirm_request()),
        );
        let responses = [a.unwrap(), b.unwrap(), c.unwrap()];

        assert_eq!(live.calls.load(Ordering::SeqCst), 3);
        assert_eq!(responses.iter().filter(|r| r.available).count(), 1);
        assert_eq!(
            responses
                .iter()
                .filter(|r| r.message == FALLBACK_UNAVAILABLE_MESSAGE)
                .count(),
            2
        );
        assert!(!client.is_open().await);
    }

    #[tokio::test]
    async fn test_rejections_pass_through_and_keep_circuit_closed() {
        let live = FlakyClient::default();
        live.rejecting.store(true, Ordering::SeqCst);
        let client = breaker(live);

        for _ in 0..3 {
            let err = client
                .confirm_availability(RoomId::new(1), confirm_request())
                .await
                .unwrap_err();
            assert_eq!(
                err,
                HotelClientError::Rejected(ROOM_NOT_FOUND_MESSAGE.to_string())
            );
        }
        assert!(!client.is_open().await);
    }
}
