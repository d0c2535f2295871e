//! Booking service entry point.

use std::sync::Arc;

use api::config::{BOOKING_SERVICE_PORT, Config};
use api::routes::metrics;
use booking::{
    BookingOrchestrator, CircuitBreakerHotelClient, HttpHotelClient, InMemoryBookingStore,
    PostgresBookingStore,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env(BOOKING_SERVICE_PORT);
    api::init_tracing(&config);
    let metrics_handle = metrics::install_recorder()?;

    let live = HttpHotelClient::new(config.http_client())?;
    let hotel = CircuitBreakerHotelClient::new(live, config.circuit_breaker());
    tracing::info!(
        hotel_service = %config.hotel_service_url,
        max_attempts = config.hotel_client_max_retries,
        "hotel client configured"
    );

    let app = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new().max_connections(10).connect(url).await?;
            let store = PostgresBookingStore::new(pool);
            store.run_migrations().await?;
            tracing::info!("using PostgreSQL booking store");
            api::create_booking_app(
                Arc::new(BookingOrchestrator::new(store, hotel)),
                metrics_handle,
            )
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory booking store");
            api::create_booking_app(
                Arc::new(BookingOrchestrator::new(InMemoryBookingStore::new(), hotel)),
                metrics_handle,
            )
        }
    };

    tracing::info!(addr = %config.addr(), "starting booking service");
    api::serve(app, &config).await?;
    Ok(())
}
