use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{
    ConfirmAvailabilityRequest, ConfirmAvailabilityResponse, RecommendQuery,
    ReleaseReservationRequest, ResourceGroupId, RoomId, RoomView,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{HotelClient, HotelClientError};

/// Settings for [`HttpHotelClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    pub base_url: String,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3001".to_string(),
            timeout: Duration::from_millis(5000),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(3000),
        }
    }
}

/// Live client for the hotel service's HTTP API.
///
/// A call is retried with exponential backoff only while no response has
/// been received (connect failure or timeout). Once the hotel answers,
/// whatever it said is final: a confirm is never re-sent after a response,
/// and retries before one rely on the request ID for replay safety.
#[derive(Debug, Clone)]
pub struct HttpHotelClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpHotelClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send(
        &self,
        operation: &'static str,
        build: impl Fn() -> RequestBuilder,
    ) -> Result<Response, HotelClientError> {
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 1;

        loop {
            match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    tracing::warn!(operation, status, "hotel service rejected call");
                    return Err(HotelClientError::from_status(status));
                }
                Err(e)
                    if attempt < self.config.max_attempts && (e.is_connect() || e.is_timeout()) =>
                {
                    metrics::counter!("hotel_client_retries", "operation" => operation)
                        .increment(1);
                    tracing::warn!(
                        operation,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "no response from hotel service, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.config.max_backoff);
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(operation, attempt, error = %e, "hotel service call failed");
                    return Err(HotelClientError::Unavailable(e.to_string()));
                }
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, HotelClientError> {
        response.json::<T>().await.map_err(|e| {
            tracing::warn!(error = %e, "undecodable response from hotel service");
            HotelClientError::Unavailable(format!("Invalid response from hotel service: {e}"))
        })
    }
}

#[async_trait]
impl HotelClient for HttpHotelClient {
    #[tracing::instrument(skip(self, request), fields(booking_id = %request.booking_id))]
    async fn confirm_availability(
        &self,
        room_id: RoomId,
        request: ConfirmAvailabilityRequest,
    ) -> Result<ConfirmAvailabilityResponse, HotelClientError> {
        let url = self.url(&format!("/api/rooms/{room_id}/confirm-availability"));
        let response = self
            .send("confirm", || self.client.post(&url).json(&request))
            .await?;
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self, request), fields(booking_id = %request.booking_id))]
    async fn release_reservation(
        &self,
        room_id: RoomId,
        request: ReleaseReservationRequest,
    ) -> Result<(), HotelClientError> {
        let url = self.url(&format!("/api/rooms/{room_id}/release"));
        self.send("release", || self.client.post(&url).json(&request))
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn recommend_rooms(
        &self,
        hotel_id: ResourceGroupId,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<RoomView>, HotelClientError> {
        let url = self.url("/api/rooms/recommend");
        let query = RecommendQuery {
            hotel_id,
            start_date,
            end_date,
        };
        let response = self
            .send("recommend", || self.client.get(&url).query(&query))
            .await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpClientConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.initial_backoff, Duration::from_millis(1000));
        assert_eq!(config.max_backoff, Duration::from_millis(3000));
    }

    #[test]
    fn test_url_joins_base_without_double_slash() {
        let client = HttpHotelClient::new(HttpClientConfig {
            base_url: "http://hotel:3001/".to_string(),
            ..HttpClientConfig::default()
        })
        .unwrap();
        assert_eq!(
            client.url("/api/rooms/recommend"),
            "http://hotel:3001/api/rooms/recommend"
        );
    }
}
